//! One UI session: the availability and mint workflows plus the network guard.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    CandidateName, MintBlockReason, MintGate, SessionSnapshot, WalletStatus, Wei, quote,
};

use super::availability::AvailabilityWorkflow;
use super::mint::MintWorkflow;
use super::network::NetworkGuard;

#[derive(Debug, Clone)]
pub struct MintSession {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub availability: AvailabilityWorkflow,
    pub mint: MintWorkflow,
    pub network: NetworkGuard,
}

impl MintSession {
    #[must_use]
    pub fn new(expected_chain_id: u64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            last_seen: now,
            availability: AvailabilityWorkflow::new(),
            mint: MintWorkflow::new(),
            network: NetworkGuard::new(expected_chain_id),
        }
    }

    pub fn touch(&mut self) {
        self.last_seen = Utc::now();
    }

    /// Edit the candidate name. Availability resets and any attempt is detached.
    pub fn set_name(&mut self, input: &str) -> &CandidateName {
        self.mint.on_name_changed();
        self.availability.set_name(input)
    }

    /// Derive the mint trigger state from the current name and wallet, never
    /// from what an earlier attempt captured.
    pub fn gate(&self, wallet: &WalletStatus) -> MintGate {
        if !wallet.connected {
            return MintGate::blocked(MintBlockReason::WalletNotConnected);
        }
        if !self.network.evaluate(wallet.chain_id).matches {
            return MintGate::blocked(MintBlockReason::WrongNetwork);
        }
        if self.availability.name().is_empty() {
            return MintGate::blocked(MintBlockReason::EmptyName);
        }
        if !self.availability.is_available() {
            return MintGate::blocked(MintBlockReason::NameNotAvailable);
        }
        if self.mint.is_in_flight() {
            return MintGate::blocked(MintBlockReason::AttemptInFlight);
        }
        MintGate::open()
    }

    pub fn snapshot(&self, wallet: WalletStatus, registry_fee: Option<Wei>) -> SessionSnapshot {
        let name = self.availability.name().clone();
        SessionSnapshot {
            session_id: self.id,
            quote: quote(&name, registry_fee),
            availability: self.availability.record(),
            rail: self.mint.rail(),
            fallback_active: self.mint.fallback_active(),
            attempt: self.mint.current_attempt().cloned(),
            superseded_attempt: self.mint.superseded_attempt().cloned(),
            network: self.network.evaluate(wallet.chain_id),
            gate: self.gate(&wallet),
            wallet,
            name,
            updated_at: Utc::now(),
        }
    }
}
