//! Domain traits defining contracts for external systems.

use async_trait::async_trait;

use super::error::{BlockchainError, PaymentError};
use super::types::{PaymentReceipt, ReceiptOutcome, TxHash, WalletStatus, Wei};

/// Name registry contract: two reads and the payable `register` write.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Check RPC connectivity and that the registry contract is deployed.
    async fn health_check(&self) -> Result<(), BlockchainError>;

    /// `isAvailable(name)` on the expected chain.
    async fn is_available(&self, name: &str) -> Result<bool, BlockchainError>;

    /// `mintFee()` in wei.
    async fn mint_fee(&self) -> Result<Wei, BlockchainError>;

    /// Ask the wallet to send `register(name)` carrying `value` wei.
    ///
    /// Fails synchronously with [`BlockchainError::Rejected`] when the wallet
    /// declines or simulation fails.
    async fn register(&self, name: &str, value: Wei) -> Result<TxHash, BlockchainError>;
}

/// Watches a submitted transaction until it settles.
#[async_trait]
pub trait ReceiptWatcher: Send + Sync {
    /// Suspend until the transaction is mined or the watcher gives up.
    async fn wait_for_receipt(&self, tx_hash: &str) -> Result<ReceiptOutcome, BlockchainError>;
}

/// The connected wallet as seen by the workflow.
#[async_trait]
pub trait WalletSession: Send + Sync {
    async fn status(&self) -> Result<WalletStatus, BlockchainError>;

    /// Request that the wallet move to `chain_id`. Resolves once the wallet answers.
    async fn request_chain_switch(&self, chain_id: u64) -> Result<(), BlockchainError>;
}

/// Off-chain stablecoin settlement for the stable rail.
///
/// The shipped implementation is a stand-in without settlement guarantees.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Collect `amount` whole stablecoin units for `name`.
    async fn pay(&self, name: &str, amount: u64) -> Result<PaymentReceipt, PaymentError>;
}
