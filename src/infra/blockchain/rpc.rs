//! Ethereum JSON-RPC transport shared by the registry, receipt and wallet clients.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{instrument, warn};

use crate::domain::BlockchainError;

/// EIP-1193 code for a request the user declined in their wallet.
const USER_REJECTED_CODE: i64 = 4001;
/// Geth-style code for `execution reverted`.
const EXECUTION_REVERTED_CODE: i64 = 3;

/// Configuration for the RPC client
#[derive(Debug, Clone)]
pub struct RpcClientConfig {
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for RpcClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_delay: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a, T: Serialize> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: T,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

impl JsonRpcError {
    fn into_blockchain_error(self, method: &str) -> BlockchainError {
        let lower = self.message.to_lowercase();
        if self.code == USER_REJECTED_CODE || lower.contains("user rejected") {
            return BlockchainError::Rejected {
                short_message: "User rejected the request.".to_string(),
                details: format!("{method}: {} (code {})", self.message, self.code),
            };
        }
        if self.code == EXECUTION_REVERTED_CODE || lower.contains("execution reverted") {
            let reason = match self.data {
                Some(data) => format!("{} ({data})", self.message),
                None => self.message,
            };
            return BlockchainError::Reverted(reason);
        }
        BlockchainError::RpcError(format!("{}: {}", self.code, self.message))
    }
}

/// One JSON-RPC endpoint.
pub struct JsonRpcTransport {
    http_client: Client,
    url: String,
    config: RpcClientConfig,
    next_id: AtomicU64,
}

impl JsonRpcTransport {
    pub fn new(url: &str, config: RpcClientConfig) -> Result<Self, BlockchainError> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BlockchainError::Connection(e.to_string()))?;
        Ok(Self {
            http_client,
            url: url.to_string(),
            config,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Make an RPC call with retries. Only transport failures are retried;
    /// an error answered by the node is returned as is.
    #[instrument(skip(self, params), fields(url = %self.url))]
    pub async fn call<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<R, BlockchainError> {
        self.call_optional(method, params)
            .await?
            .ok_or_else(|| BlockchainError::InvalidResponse(format!("{method}: empty result")))
    }

    /// Like [`call`](Self::call) but a `null` result is returned as `None`.
    pub async fn call_optional<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<Option<R>, BlockchainError> {
        let mut last_error = None;
        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tokio::time::sleep(self.config.retry_delay).await;
            }
            match self.do_rpc_call(method, &params).await {
                Ok(result) => return Ok(result),
                Err(e @ (BlockchainError::Connection(_) | BlockchainError::Timeout(_))) => {
                    warn!(attempt = attempt, error = ?e, method = %method, "RPC call failed");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_error
            .unwrap_or_else(|| BlockchainError::RpcError("Unknown error".to_string())))
    }

    /// Single call with no retries, for requests that must not be repeated.
    pub async fn call_once<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<Option<R>, BlockchainError> {
        self.do_rpc_call(method, &params).await
    }

    async fn do_rpc_call<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: &P,
    ) -> Result<Option<R>, BlockchainError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response = self
            .http_client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BlockchainError::Timeout(e.to_string())
                } else {
                    BlockchainError::Connection(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(BlockchainError::RpcError(format!(
                "{method}: HTTP {status}"
            )));
        }

        let rpc_response: JsonRpcResponse<R> = response
            .json()
            .await
            .map_err(|e| BlockchainError::InvalidResponse(e.to_string()))?;

        if let Some(error) = rpc_response.error {
            return Err(error.into_blockchain_error(method));
        }
        Ok(rpc_response.result)
    }
}

/// Parse a `0x`-prefixed hex quantity.
pub fn parse_quantity(value: &str) -> Result<u64, BlockchainError> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    u64::from_str_radix(digits, 16)
        .map_err(|e| BlockchainError::InvalidResponse(format!("bad quantity {value:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rpc_error(code: i64, message: &str) -> JsonRpcError {
        JsonRpcError {
            code,
            message: message.to_string(),
            data: None,
        }
    }

    #[test]
    fn test_user_rejection_maps_to_rejected() {
        let err = rpc_error(4001, "User denied transaction signature").into_blockchain_error("eth_sendTransaction");
        match err {
            BlockchainError::Rejected {
                short_message,
                details,
            } => {
                assert_eq!(short_message, "User rejected the request.");
                assert!(details.contains("User denied"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_revert_maps_to_reverted() {
        let err = rpc_error(3, "execution reverted: name taken").into_blockchain_error("eth_call");
        assert!(matches!(err, BlockchainError::Reverted(msg) if msg.contains("name taken")));
    }

    #[test]
    fn test_other_errors_keep_code() {
        let err = rpc_error(-32601, "method not found").into_blockchain_error("foo");
        assert_eq!(
            err,
            BlockchainError::RpcError("-32601: method not found".to_string())
        );
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("0x14a34").unwrap(), 84532);
        assert_eq!(parse_quantity("0x2105").unwrap(), 8453);
        assert!(parse_quantity("0xzz").is_err());
    }

    #[test]
    fn test_rpc_client_config_default() {
        let config = RpcClientConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_transport_creation() {
        let transport = JsonRpcTransport::new("https://sepolia.base.org", RpcClientConfig::default());
        assert_eq!(transport.unwrap().url(), "https://sepolia.base.org");
    }
}
