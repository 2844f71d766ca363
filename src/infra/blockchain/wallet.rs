//! Wallet session backed by a wallet-exposed JSON-RPC endpoint.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::domain::{BlockchainError, WalletSession, WalletStatus};

use super::rpc::{JsonRpcTransport, parse_quantity};

pub struct RpcWalletSession {
    transport: Arc<JsonRpcTransport>,
}

impl RpcWalletSession {
    pub fn new(transport: Arc<JsonRpcTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl WalletSession for RpcWalletSession {
    #[instrument(skip(self))]
    async fn status(&self) -> Result<WalletStatus, BlockchainError> {
        let accounts: Vec<String> = self.transport.call("eth_accounts", json!([])).await?;
        let Some(address) = accounts.into_iter().next() else {
            return Ok(WalletStatus::default());
        };
        let chain_id: String = self.transport.call("eth_chainId", json!([])).await?;
        Ok(WalletStatus {
            connected: true,
            address: Some(address),
            chain_id: Some(parse_quantity(&chain_id)?),
        })
    }

    #[instrument(skip(self))]
    async fn request_chain_switch(&self, chain_id: u64) -> Result<(), BlockchainError> {
        let params = json!([{ "chainId": format!("{chain_id:#x}") }]);
        self.transport
            .call_once::<_, serde_json::Value>("wallet_switchEthereumChain", params)
            .await?;
        info!(chain_id, "Chain switch accepted");
        Ok(())
    }
}
