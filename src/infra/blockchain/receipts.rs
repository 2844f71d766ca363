//! Receipt polling via `eth_getTransactionReceipt`.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::domain::{BlockchainError, ReceiptOutcome, ReceiptWatcher};

use super::rpc::JsonRpcTransport;

#[derive(Debug, Deserialize)]
struct TransactionReceipt {
    status: Option<String>,
    #[serde(rename = "blockNumber")]
    block_number: Option<String>,
}

impl TransactionReceipt {
    fn outcome(&self) -> ReceiptOutcome {
        match self.status.as_deref() {
            Some("0x1") => ReceiptOutcome::Confirmed,
            status => ReceiptOutcome::Reverted(format!(
                "transaction reverted (status {})",
                status.unwrap_or("missing")
            )),
        }
    }
}

/// Polls until a receipt appears. `timeout` of `None` waits indefinitely.
pub struct PollingReceiptWatcher {
    transport: Arc<JsonRpcTransport>,
    poll_interval: Duration,
    timeout: Option<Duration>,
}

impl PollingReceiptWatcher {
    pub fn new(
        transport: Arc<JsonRpcTransport>,
        poll_interval: Duration,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            transport,
            poll_interval,
            timeout,
        }
    }

    async fn poll(&self, tx_hash: &str) -> ReceiptOutcome {
        loop {
            match self
                .transport
                .call_optional::<_, TransactionReceipt>("eth_getTransactionReceipt", json!([tx_hash]))
                .await
            {
                Ok(Some(receipt)) => {
                    info!(
                        tx_hash = %tx_hash,
                        block = receipt.block_number.as_deref().unwrap_or("pending"),
                        "Receipt found"
                    );
                    return receipt.outcome();
                }
                Ok(None) => debug!(tx_hash = %tx_hash, "Transaction not yet mined"),
                Err(e) => warn!(tx_hash = %tx_hash, error = ?e, "Error fetching receipt"),
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl ReceiptWatcher for PollingReceiptWatcher {
    #[instrument(skip(self))]
    async fn wait_for_receipt(&self, tx_hash: &str) -> Result<ReceiptOutcome, BlockchainError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.poll(tx_hash))
                .await
                .map_err(|_| {
                    BlockchainError::Timeout(format!(
                        "Transaction {tx_hash} not mined within {}s",
                        limit.as_secs()
                    ))
                }),
            None => Ok(self.poll(tx_hash).await),
        }
    }
}
