//! Test utilities and mock implementations.
//!
//! This module provides reusable mock implementations of the collaborator
//! traits for use in unit and integration tests.

pub mod mocks;

use std::sync::Arc;
use std::time::Duration;

use crate::app::{AppConfig, AppState, ChainEnv, MintService};

pub use mocks::{
    MockConfig, MockPaymentProcessor, MockReceiptWatcher, MockRegistryClient, MockWalletSession,
    ReceiptGate,
};

/// Testnet config with instant payments.
pub fn test_config() -> Arc<AppConfig> {
    let mut config = AppConfig::for_env(ChainEnv::Testnet);
    config.payment_delay = Duration::ZERO;
    config.receipt_poll_interval = Duration::from_millis(1);
    Arc::new(config)
}

/// Service wired to default mocks with the wallet on the expected chain.
pub fn test_service() -> Arc<MintService> {
    let config = test_config();
    let wallet = MockWalletSession::on_chain(config.expected_chain_id);
    Arc::new(MintService::new(
        config,
        Arc::new(MockRegistryClient::new()),
        Arc::new(MockReceiptWatcher::new()),
        Arc::new(wallet),
        Arc::new(MockPaymentProcessor::new()),
    ))
}

pub fn test_state() -> Arc<AppState> {
    Arc::new(AppState::new(test_service()))
}
