//! Name registry client over Ethereum JSON-RPC.
//!
//! Reads go to the public RPC; `register` is sent through the wallet endpoint,
//! which owns the account, signing and any paymaster sponsorship.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{SolCall, sol};
use async_trait::async_trait;
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::domain::{AppError, BlockchainError, ConfigError, RegistryClient, TxHash, Wei};

use super::rpc::{JsonRpcTransport, parse_quantity};

sol! {
    function isAvailable(string name) external view returns (bool);
    function mintFee() external view returns (uint256);
    function register(string name) external payable;
}

pub struct RpcRegistryClient {
    reads: Arc<JsonRpcTransport>,
    wallet: Arc<JsonRpcTransport>,
    registry: Address,
}

impl RpcRegistryClient {
    pub fn new(
        reads: Arc<JsonRpcTransport>,
        wallet: Arc<JsonRpcTransport>,
        registry_address: &str,
    ) -> Result<Self, AppError> {
        let registry = Address::from_str(registry_address).map_err(|e| ConfigError::InvalidValue {
            key: "REGISTRY_ADDRESS".to_string(),
            message: e.to_string(),
        })?;
        info!(registry = %registry, rpc_url = %reads.url(), "Created registry client");
        Ok(Self {
            reads,
            wallet,
            registry,
        })
    }

    pub fn address(&self) -> Address {
        self.registry
    }

    async fn eth_call(&self, data: Vec<u8>) -> Result<Bytes, BlockchainError> {
        let params = json!([
            { "to": self.registry, "data": Bytes::from(data) },
            "latest"
        ]);
        self.reads.call("eth_call", params).await
    }

    async fn sender(&self) -> Result<String, BlockchainError> {
        let accounts: Vec<String> = self.wallet.call("eth_accounts", json!([])).await?;
        accounts
            .into_iter()
            .next()
            .ok_or_else(|| BlockchainError::Connection("wallet has no connected account".to_string()))
    }
}

fn decode_error(call: &str, e: alloy_sol_types::Error) -> BlockchainError {
    BlockchainError::InvalidResponse(format!("{call}: {e}"))
}

#[async_trait]
impl RegistryClient for RpcRegistryClient {
    /// Confirms the read RPC answers and that the registry address holds code.
    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), BlockchainError> {
        let chain_id: String = self.reads.call("eth_chainId", json!([])).await?;
        let chain_id = parse_quantity(&chain_id)?;
        let code: Bytes = self
            .reads
            .call("eth_getCode", json!([self.registry, "latest"]))
            .await?;
        if code.is_empty() {
            return Err(BlockchainError::InvalidResponse(format!(
                "no contract bytecode at {} on chain {chain_id}",
                self.registry
            )));
        }
        debug!(chain_id, code_len = code.len(), "Registry reachable");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn is_available(&self, name: &str) -> Result<bool, BlockchainError> {
        let call = isAvailableCall {
            name: name.to_string(),
        };
        let output = self.eth_call(call.abi_encode()).await?;
        isAvailableCall::abi_decode_returns(&output).map_err(|e| decode_error("isAvailable", e))
    }

    #[instrument(skip(self))]
    async fn mint_fee(&self) -> Result<Wei, BlockchainError> {
        let output = self.eth_call(mintFeeCall {}.abi_encode()).await?;
        let fee: U256 =
            mintFeeCall::abi_decode_returns(&output).map_err(|e| decode_error("mintFee", e))?;
        Wei::try_from(fee)
            .map_err(|_| BlockchainError::InvalidResponse(format!("mintFee out of range: {fee}")))
    }

    /// Sent once; a rejected or failed send is never retried here.
    #[instrument(skip(self))]
    async fn register(&self, name: &str, value: Wei) -> Result<TxHash, BlockchainError> {
        let from = self.sender().await?;
        let call = registerCall {
            name: name.to_string(),
        };
        let tx = json!({
            "from": from,
            "to": self.registry,
            "data": Bytes::from(call.abi_encode()),
            "value": format!("{value:#x}"),
        });
        let hash: Option<TxHash> = self.wallet.call_once("eth_sendTransaction", json!([tx])).await?;
        hash.ok_or_else(|| {
            BlockchainError::InvalidResponse("eth_sendTransaction returned no hash".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::config::DEFAULT_REGISTRY_ADDRESS;
    use crate::infra::blockchain::rpc::RpcClientConfig;

    fn transport() -> Arc<JsonRpcTransport> {
        Arc::new(JsonRpcTransport::new("http://127.0.0.1:1", RpcClientConfig::default()).unwrap())
    }

    #[test]
    fn test_client_creation() {
        let client = RpcRegistryClient::new(transport(), transport(), DEFAULT_REGISTRY_ADDRESS);
        assert_eq!(
            client.unwrap().address(),
            Address::from_str(DEFAULT_REGISTRY_ADDRESS).unwrap()
        );
    }

    #[test]
    fn test_invalid_address_is_config_error() {
        let result = RpcRegistryClient::new(transport(), transport(), "0x1234");
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_register_calldata_selector() {
        let data = registerCall {
            name: "alice".to_string(),
        }
        .abi_encode();
        assert_eq!(&data[..4], &registerCall::SELECTOR);
        // selector + offset + length + one padded word
        assert_eq!(data.len(), 4 + 32 * 3);
    }

    #[test]
    fn test_decode_is_available() {
        let mut word = [0u8; 32];
        word[31] = 1;
        assert!(isAvailableCall::abi_decode_returns(&word).unwrap());
        assert!(!isAvailableCall::abi_decode_returns(&[0u8; 32]).unwrap());
    }

    #[test]
    fn test_decode_mint_fee() {
        let fee = U256::from(500_000_000_000_000u128);
        let encoded = fee.to_be_bytes::<32>();
        assert_eq!(mintFeeCall::abi_decode_returns(&encoded).unwrap(), fee);
    }
}
