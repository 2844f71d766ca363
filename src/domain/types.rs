use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Hex-encoded transaction hash as returned by the wallet.
pub type TxHash = String;

/// Amount in the native currency's smallest unit (wei).
pub type Wei = u128;

/// Upper bound on a candidate label accepted from clients.
pub const MAX_NAME_LEN: usize = 64;

/// A user-supplied label, lower-cased on input. The empty string means "no candidate".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct CandidateName(String);

impl CandidateName {
    pub fn from_input(input: &str) -> Self {
        Self(input.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Length in characters, which is what the price tiers are keyed on.
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }
}

impl fmt::Display for CandidateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where the availability query for the current name stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityStatus {
    /// No candidate name.
    Idle,
    Unchecked,
    Checking,
    Available,
    Taken,
    /// The read failed; the name is neither known free nor known taken.
    Error,
}

impl AvailabilityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AvailabilityStatus::Idle => "idle",
            AvailabilityStatus::Unchecked => "unchecked",
            AvailabilityStatus::Checking => "checking",
            AvailabilityStatus::Available => "available",
            AvailabilityStatus::Taken => "taken",
            AvailabilityStatus::Error => "error",
        }
    }
}

/// Derived view of the availability workflow for one name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AvailabilityRecord {
    pub queried_name: CandidateName,
    pub status: AvailabilityStatus,
    pub error: Option<String>,
}

/// Payment path for a mint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentRail {
    /// Native currency paid on-chain with the register call.
    #[default]
    Native,
    /// Stablecoin settled off-chain, then a zero-value register call.
    Stable,
}

impl PaymentRail {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentRail::Native => "native",
            PaymentRail::Stable => "stable",
        }
    }
}

/// Displayed prices for a candidate name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PriceQuote {
    /// Registry mint fee, or the fallback default when the read has not resolved.
    pub native_fee: Wei,
    /// False when `native_fee` is the fallback default.
    pub native_fee_resolved: bool,
    /// Whole stablecoin units.
    pub stable_price: u64,
}

/// Lifecycle of a single mint attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MintLifecycle {
    Idle,
    PayingOffchain,
    Paid,
    Submitting,
    Confirming,
    Succeeded,
    Failed,
}

impl MintLifecycle {
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            MintLifecycle::PayingOffchain
                | MintLifecycle::Paid
                | MintLifecycle::Submitting
                | MintLifecycle::Confirming
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, MintLifecycle::Succeeded | MintLifecycle::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MintLifecycle::Idle => "idle",
            MintLifecycle::PayingOffchain => "paying_offchain",
            MintLifecycle::Paid => "paid",
            MintLifecycle::Submitting => "submitting",
            MintLifecycle::Confirming => "confirming",
            MintLifecycle::Succeeded => "succeeded",
            MintLifecycle::Failed => "failed",
        }
    }
}

/// Structured fault from a wallet write or receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SubmissionFault {
    pub short_message: String,
    pub details: String,
}

impl SubmissionFault {
    pub fn new(short_message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            short_message: short_message.into(),
            details: details.into(),
        }
    }
}

/// One user-initiated try to register a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MintAttempt {
    pub id: u64,
    pub name: CandidateName,
    pub payment_rail: PaymentRail,
    pub lifecycle: MintLifecycle,
    pub fallback_active: bool,
    pub stable_payment_confirmed: bool,
    /// On-chain value the register call carries once submitted.
    pub value: Option<Wei>,
    pub transaction_hash: Option<TxHash>,
    pub error: Option<SubmissionFault>,
    /// Generic notice for failures that never reached the chain.
    pub notice: Option<String>,
    /// Set once the candidate name changed while this attempt was in flight.
    pub superseded: bool,
    pub started_at: DateTime<Utc>,
}

impl MintAttempt {
    pub fn new(id: u64, name: CandidateName, payment_rail: PaymentRail, fallback_active: bool) -> Self {
        Self {
            id,
            name,
            payment_rail,
            lifecycle: MintLifecycle::Idle,
            fallback_active,
            stable_payment_confirmed: false,
            value: None,
            transaction_hash: None,
            error: None,
            notice: None,
            superseded: false,
            started_at: Utc::now(),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.lifecycle.is_in_flight()
    }
}

/// What the wallet currently reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WalletStatus {
    pub connected: bool,
    pub address: Option<String>,
    pub chain_id: Option<u64>,
}

/// Result of comparing the wallet chain against the expected chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NetworkStatus {
    pub connected_chain_id: Option<u64>,
    pub expected_chain_id: u64,
    pub matches: bool,
    pub switching: bool,
}

/// Outcome reported by the receipt watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiptOutcome {
    Confirmed,
    Reverted(String),
}

/// Confirmation returned by the payment processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub reference: String,
}

/// Why the mint trigger is disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MintBlockReason {
    WrongNetwork,
    EmptyName,
    WalletNotConnected,
    NameNotAvailable,
    AttemptInFlight,
}

impl fmt::Display for MintBlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            MintBlockReason::WrongNetwork => "wrong network",
            MintBlockReason::EmptyName => "no name entered",
            MintBlockReason::WalletNotConnected => "wallet not connected",
            MintBlockReason::NameNotAvailable => "name not confirmed available",
            MintBlockReason::AttemptInFlight => "a mint attempt is in flight",
        };
        f.write_str(text)
    }
}

/// Whether the mint trigger is enabled, and if not, why.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MintGate {
    pub can_mint: bool,
    pub blocked_by: Option<MintBlockReason>,
}

impl MintGate {
    pub fn open() -> Self {
        Self {
            can_mint: true,
            blocked_by: None,
        }
    }

    pub fn blocked(reason: MintBlockReason) -> Self {
        Self {
            can_mint: false,
            blocked_by: Some(reason),
        }
    }
}

/// Presentation-agnostic state of one UI session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub name: CandidateName,
    pub availability: AvailabilityRecord,
    pub quote: PriceQuote,
    pub rail: PaymentRail,
    pub fallback_active: bool,
    /// The attempt for the current name, if any.
    pub attempt: Option<MintAttempt>,
    /// An attempt started for an earlier name that has not been cleared yet.
    pub superseded_attempt: Option<MintAttempt>,
    pub wallet: WalletStatus,
    pub network: NetworkStatus,
    pub gate: MintGate,
    pub updated_at: DateTime<Utc>,
}

/// Request payload for editing the candidate name.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SetNameRequest {
    #[validate(length(max = 64, message = "Name must be at most 64 characters"))]
    pub name: String,
}

impl SetNameRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Request payload for toggling the payment rail.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SelectRailRequest {
    pub rail: PaymentRail,
}

/// Query parameters for a standalone price quote.
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct QuoteParams {
    #[serde(default)]
    pub name: String,
}

/// Output format for the rendered view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ViewFormat {
    #[default]
    Text,
    Markdown,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct ViewParams {
    #[serde(default)]
    pub format: ViewFormat,
}

/// Error response body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    pub r#type: String,
    pub message: String,
}

/// Rate limit response body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RateLimitResponse {
    pub error: ErrorDetail,
    pub retry_after: u64,
}

/// Health check status for services.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Health check response for the application.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub registry: HealthStatus,
    pub wallet: HealthStatus,
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    pub fn new(registry: HealthStatus, wallet: HealthStatus) -> Self {
        let status = match (&registry, &wallet) {
            (HealthStatus::Healthy, HealthStatus::Healthy) => HealthStatus::Healthy,
            (HealthStatus::Unhealthy, _) => HealthStatus::Unhealthy,
            _ => HealthStatus::Degraded,
        };

        Self {
            status,
            registry,
            wallet,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_name_lowercases_input() {
        let name = CandidateName::from_input("Alice");
        assert_eq!(name.as_str(), "alice");
        assert!(!name.is_empty());
        assert!(CandidateName::from_input("").is_empty());
    }

    #[test]
    fn test_candidate_name_counts_chars_not_bytes() {
        let name = CandidateName::from_input("é");
        assert_eq!(name.char_len(), 1);
    }

    #[test]
    fn test_in_flight_lifecycles() {
        assert!(MintLifecycle::PayingOffchain.is_in_flight());
        assert!(MintLifecycle::Paid.is_in_flight());
        assert!(MintLifecycle::Submitting.is_in_flight());
        assert!(MintLifecycle::Confirming.is_in_flight());
        assert!(!MintLifecycle::Idle.is_in_flight());
        assert!(!MintLifecycle::Succeeded.is_in_flight());
        assert!(!MintLifecycle::Failed.is_in_flight());
    }

    #[test]
    fn test_payment_rail_serde() {
        let json = serde_json::to_string(&PaymentRail::Stable).unwrap();
        assert_eq!(json, "\"stable\"");
        let rail: PaymentRail = serde_json::from_str("\"native\"").unwrap();
        assert_eq!(rail, PaymentRail::Native);
    }

    #[test]
    fn test_set_name_request_rejects_long_names() {
        let request = SetNameRequest::new("a".repeat(MAX_NAME_LEN + 1));
        assert!(request.validate().is_err());
        assert!(SetNameRequest::new("").validate().is_ok());
    }

    #[test]
    fn test_health_response_degraded_when_wallet_down() {
        let response = HealthResponse::new(HealthStatus::Healthy, HealthStatus::Unhealthy);
        assert_eq!(response.status, HealthStatus::Degraded);
    }

    #[test]
    fn test_health_response_unhealthy_when_registry_down() {
        let response = HealthResponse::new(HealthStatus::Unhealthy, HealthStatus::Healthy);
        assert_eq!(response.status, HealthStatus::Unhealthy);
    }
}
