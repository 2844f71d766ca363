//! Network guard: compares the wallet's chain with the chain the registry lives on.

use crate::domain::NetworkStatus;

pub const BASE_MAINNET_CHAIN_ID: u64 = 8453;
pub const BASE_SEPOLIA_CHAIN_ID: u64 = 84532;

/// Human-readable network name for banners.
pub fn chain_name(chain_id: u64) -> &'static str {
    match chain_id {
        BASE_SEPOLIA_CHAIN_ID => "Base Sepolia",
        BASE_MAINNET_CHAIN_ID => "Base Mainnet",
        _ => "Unknown network",
    }
}

#[derive(Debug, Clone)]
pub struct NetworkGuard {
    expected_chain_id: u64,
    switching: bool,
}

impl NetworkGuard {
    #[must_use]
    pub fn new(expected_chain_id: u64) -> Self {
        Self {
            expected_chain_id,
            switching: false,
        }
    }

    pub fn expected_chain_id(&self) -> u64 {
        self.expected_chain_id
    }

    pub fn is_switching(&self) -> bool {
        self.switching
    }

    /// An unknown wallet chain never matches.
    pub fn evaluate(&self, connected_chain_id: Option<u64>) -> NetworkStatus {
        NetworkStatus {
            connected_chain_id,
            expected_chain_id: self.expected_chain_id,
            matches: connected_chain_id == Some(self.expected_chain_id),
            switching: self.switching,
        }
    }

    /// Mark a switch request as pending. Returns `false` if one already is.
    pub fn begin_switch(&mut self) -> bool {
        if self.switching {
            return false;
        }
        self.switching = true;
        true
    }

    pub fn finish_switch(&mut self) {
        self.switching = false;
    }
}
