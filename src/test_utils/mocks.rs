//! Mock implementations for testing.
//!
//! These mocks provide in-memory implementations of the collaborator traits
//! that can be configured to simulate success, failure, and slow paths.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

use crate::domain::{
    BlockchainError, DEFAULT_NATIVE_FEE_WEI, PaymentError, PaymentProcessor, PaymentReceipt,
    ReceiptOutcome, ReceiptWatcher, RegistryClient, TxHash, WalletSession, WalletStatus, Wei,
};

/// Configuration for mock behavior.
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// If true, operations will fail.
    pub should_fail: bool,
    /// Custom error message for failures.
    pub error_message: Option<String>,
    /// Simulated latency in milliseconds.
    pub latency_ms: Option<u64>,
}

impl MockConfig {
    /// Creates a config that always succeeds.
    #[must_use]
    pub fn success() -> Self {
        Self::default()
    }

    /// Creates a config that always fails.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            should_fail: true,
            error_message: Some(message.into()),
            latency_ms: None,
        }
    }

    /// Adds simulated latency.
    #[must_use]
    pub fn with_latency(mut self, ms: u64) -> Self {
        self.latency_ms = Some(ms);
        self
    }

    async fn simulate_latency(&self) {
        if let Some(ms) = self.latency_ms {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    fn failure_message(&self, default: &str) -> Option<String> {
        self.should_fail.then(|| {
            self.error_message
                .clone()
                .unwrap_or_else(|| default.to_string())
        })
    }
}

/// Mock registry: every name is available unless marked taken.
///
/// # Example
///
/// ```
/// use basename_mint::test_utils::MockRegistryClient;
///
/// let registry = MockRegistryClient::new();
/// registry.set_taken("alice");
/// registry.reject_next_register("User rejected the request.");
/// ```
pub struct MockRegistryClient {
    config: MockConfig,
    taken: Mutex<HashSet<String>>,
    read_failure: Mutex<Option<String>>,
    mint_fee: Mutex<Option<Wei>>,
    reject_next: Mutex<Option<String>>,
    register_calls: Mutex<Vec<(String, Wei)>>,
    is_healthy: AtomicBool,
    tx_counter: AtomicU64,
}

impl MockRegistryClient {
    /// Creates a new mock with default (success) configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MockConfig::success())
    }

    /// Creates a new mock with the given configuration.
    #[must_use]
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            config,
            taken: Mutex::new(HashSet::new()),
            read_failure: Mutex::new(None),
            mint_fee: Mutex::new(Some(DEFAULT_NATIVE_FEE_WEI)),
            reject_next: Mutex::new(None),
            register_calls: Mutex::new(Vec::new()),
            is_healthy: AtomicBool::new(true),
            tx_counter: AtomicU64::new(0),
        }
    }

    /// Creates a mock where every call fails.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_config(MockConfig::failure(message))
    }

    pub fn set_taken(&self, name: &str) {
        self.taken.lock().unwrap().insert(name.to_string());
    }

    /// Make `isAvailable` reads fail with the given message.
    pub fn fail_reads(&self, message: &str) {
        *self.read_failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn set_mint_fee(&self, fee: Wei) {
        *self.mint_fee.lock().unwrap() = Some(fee);
    }

    /// Make `mintFee` reads fail.
    pub fn fail_mint_fee(&self) {
        *self.mint_fee.lock().unwrap() = None;
    }

    /// Reject the next `register` call as a wallet would.
    pub fn reject_next_register(&self, short_message: &str) {
        *self.reject_next.lock().unwrap() = Some(short_message.to_string());
    }

    /// Every `register(name, value)` the mock has seen, in order.
    pub fn register_calls(&self) -> Vec<(String, Wei)> {
        self.register_calls.lock().unwrap().clone()
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.is_healthy.store(healthy, Ordering::Relaxed);
    }

    fn check_should_fail(&self) -> Result<(), BlockchainError> {
        match self.config.failure_message("Mock registry error") {
            Some(msg) => Err(BlockchainError::RpcError(msg)),
            None => Ok(()),
        }
    }
}

impl Default for MockRegistryClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RegistryClient for MockRegistryClient {
    async fn health_check(&self) -> Result<(), BlockchainError> {
        if !self.is_healthy.load(Ordering::Relaxed) {
            return Err(BlockchainError::Connection(
                "Mock registry unhealthy".to_string(),
            ));
        }
        self.check_should_fail()
    }

    async fn is_available(&self, name: &str) -> Result<bool, BlockchainError> {
        self.config.simulate_latency().await;
        self.check_should_fail()?;
        if let Some(msg) = self.read_failure.lock().unwrap().clone() {
            return Err(BlockchainError::RpcError(msg));
        }
        Ok(!self.taken.lock().unwrap().contains(name))
    }

    async fn mint_fee(&self) -> Result<Wei, BlockchainError> {
        self.check_should_fail()?;
        (*self.mint_fee.lock().unwrap())
            .ok_or_else(|| BlockchainError::RpcError("mintFee unavailable".to_string()))
    }

    async fn register(&self, name: &str, value: Wei) -> Result<TxHash, BlockchainError> {
        self.config.simulate_latency().await;
        self.check_should_fail()?;
        if let Some(short_message) = self.reject_next.lock().unwrap().take() {
            return Err(BlockchainError::Rejected {
                details: format!("{short_message}\n\nContract Call: register(\"{name}\")"),
                short_message,
            });
        }
        self.register_calls
            .lock()
            .unwrap()
            .push((name.to_string(), value));
        let n = self.tx_counter.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(format!("0x{n:064x}"))
    }
}

/// Lets a test observe and control when a watched receipt settles.
#[derive(Default)]
pub struct ReceiptGate {
    watching: Notify,
    released: Notify,
}

impl ReceiptGate {
    /// Resolves once the watcher has started waiting on a receipt.
    pub async fn wait_until_watching(&self) {
        self.watching.notified().await;
    }

    /// Let the held receipt settle.
    pub fn release(&self) {
        self.released.notify_one();
    }
}

/// Mock receipt watcher: confirms immediately unless told otherwise.
pub struct MockReceiptWatcher {
    config: MockConfig,
    revert_reason: Mutex<Option<String>>,
    gate: Mutex<Option<Arc<ReceiptGate>>>,
    watched: Mutex<Vec<String>>,
}

impl MockReceiptWatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MockConfig::success())
    }

    #[must_use]
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            config,
            revert_reason: Mutex::new(None),
            gate: Mutex::new(None),
            watched: Mutex::new(Vec::new()),
        }
    }

    /// Report every receipt as reverted with `reason`.
    pub fn revert_with(&self, reason: &str) {
        *self.revert_reason.lock().unwrap() = Some(reason.to_string());
    }

    /// Hold the next receipts until the returned gate is released.
    pub fn hold(&self) -> Arc<ReceiptGate> {
        let gate = Arc::new(ReceiptGate::default());
        *self.gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn watched(&self) -> Vec<String> {
        self.watched.lock().unwrap().clone()
    }
}

impl Default for MockReceiptWatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReceiptWatcher for MockReceiptWatcher {
    async fn wait_for_receipt(&self, tx_hash: &str) -> Result<ReceiptOutcome, BlockchainError> {
        self.watched.lock().unwrap().push(tx_hash.to_string());
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.watching.notify_one();
            gate.released.notified().await;
        }
        self.config.simulate_latency().await;

        if let Some(msg) = self.config.failure_message("Mock receipt error") {
            return Err(BlockchainError::Timeout(msg));
        }
        Ok(match self.revert_reason.lock().unwrap().clone() {
            Some(reason) => ReceiptOutcome::Reverted(reason),
            None => ReceiptOutcome::Confirmed,
        })
    }
}

/// Mock wallet: connected on a configurable chain; switching succeeds instantly.
pub struct MockWalletSession {
    status: Mutex<WalletStatus>,
    switch_requests: Mutex<Vec<u64>>,
    fail_switch: AtomicBool,
}

impl MockWalletSession {
    #[must_use]
    pub fn on_chain(chain_id: u64) -> Self {
        Self {
            status: Mutex::new(WalletStatus {
                connected: true,
                address: Some("0x00000000000000000000000000000000000000a1".to_string()),
                chain_id: Some(chain_id),
            }),
            switch_requests: Mutex::new(Vec::new()),
            fail_switch: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn disconnected() -> Self {
        let wallet = Self::on_chain(0);
        *wallet.status.lock().unwrap() = WalletStatus::default();
        wallet
    }

    pub fn set_chain_id(&self, chain_id: Option<u64>) {
        self.status.lock().unwrap().chain_id = chain_id;
    }

    pub fn set_connected(&self, connected: bool) {
        self.status.lock().unwrap().connected = connected;
    }

    /// Make switch requests fail without changing chain.
    pub fn fail_switches(&self) {
        self.fail_switch.store(true, Ordering::Relaxed);
    }

    pub fn switch_requests(&self) -> Vec<u64> {
        self.switch_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl WalletSession for MockWalletSession {
    async fn status(&self) -> Result<WalletStatus, BlockchainError> {
        Ok(self.status.lock().unwrap().clone())
    }

    async fn request_chain_switch(&self, chain_id: u64) -> Result<(), BlockchainError> {
        self.switch_requests.lock().unwrap().push(chain_id);
        if self.fail_switch.load(Ordering::Relaxed) {
            return Err(BlockchainError::Rejected {
                short_message: "User rejected the request.".to_string(),
                details: "wallet_switchEthereumChain rejected".to_string(),
            });
        }
        self.status.lock().unwrap().chain_id = Some(chain_id);
        Ok(())
    }
}

/// Mock payment processor recording every payment it takes.
pub struct MockPaymentProcessor {
    failure: Mutex<Option<String>>,
    payments: Mutex<Vec<(String, u64)>>,
}

impl MockPaymentProcessor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            failure: Mutex::new(None),
            payments: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn payments(&self) -> Vec<(String, u64)> {
        self.payments.lock().unwrap().clone()
    }
}

impl Default for MockPaymentProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentProcessor for MockPaymentProcessor {
    async fn pay(&self, name: &str, amount: u64) -> Result<PaymentReceipt, PaymentError> {
        if let Some(msg) = self.failure.lock().unwrap().clone() {
            return Err(PaymentError::Declined(msg));
        }
        let mut payments = self.payments.lock().unwrap();
        payments.push((name.to_string(), amount));
        Ok(PaymentReceipt {
            reference: format!("mock-payment-{}", payments.len()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_registry_reject_is_one_shot() {
        let registry = MockRegistryClient::new();
        registry.reject_next_register("nope");
        assert!(matches!(
            registry.register("bob", 1).await,
            Err(BlockchainError::Rejected { .. })
        ));
        assert!(registry.register("bob", 1).await.is_ok());
        assert_eq!(registry.register_calls(), vec![("bob".to_string(), 1)]);
    }

    #[tokio::test]
    async fn test_failing_registry() {
        let registry = MockRegistryClient::failing("down");
        assert!(matches!(
            registry.is_available("bob").await,
            Err(BlockchainError::RpcError(msg)) if msg == "down"
        ));
    }

    #[tokio::test]
    async fn test_wallet_switch_changes_chain() {
        let wallet = MockWalletSession::on_chain(1);
        wallet.request_chain_switch(84532).await.unwrap();
        assert_eq!(wallet.status().await.unwrap().chain_id, Some(84532));
    }

    #[tokio::test]
    async fn test_disconnected_wallet() {
        let wallet = MockWalletSession::disconnected();
        let status = wallet.status().await.unwrap();
        assert!(!status.connected);
        assert!(status.chain_id.is_none());
    }
}
