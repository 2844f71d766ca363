//! View model derived from a session snapshot.
//!
//! Every visual variant reads the same `ViewModel`; nothing here talks to the
//! workflows or the chain.

use serde::Serialize;
use utoipa::ToSchema;

use crate::app::chain_name;
use crate::domain::{
    AvailabilityStatus, MintAttempt, MintBlockReason, MintLifecycle, PaymentRail,
    SessionSnapshot, format_native, format_stable,
};

pub const PAYMENT_RECEIVED_NOTICE: &str = "Payment received. Finalizing on-chain mint…";
pub const NATIVE_TICKER: &str = "ETH";
pub const STABLE_TICKER: &str = "USDC";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BadgeTone {
    Neutral,
    Pending,
    Positive,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Badge {
    pub tone: BadgeTone,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PrimaryAction {
    pub label: String,
    pub enabled: bool,
}

/// Persistent warning shown while the wallet is on another chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct NetworkBanner {
    pub message: String,
    pub action_label: String,
    pub action_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ViewModel {
    pub name: String,
    pub badge: Badge,
    pub rail: PaymentRail,
    pub rail_toggle_enabled: bool,
    pub native_price: String,
    pub stable_price: String,
    pub primary: PrimaryAction,
    pub notice: Option<String>,
    pub network_banner: Option<NetworkBanner>,
    pub error_line: Option<String>,
    pub error_details: Option<String>,
    pub transaction_hash: Option<String>,
    /// Status of an attempt still settling for a previous name.
    pub earlier_attempt: Option<String>,
}

impl ViewModel {
    pub fn from_snapshot(snapshot: &SessionSnapshot) -> Self {
        let attempt = snapshot.attempt.as_ref();
        let native_price = format_native(snapshot.quote.native_fee);
        let stable_price = format_stable(snapshot.quote.stable_price);

        Self {
            name: snapshot.name.to_string(),
            badge: badge(snapshot.availability.status),
            rail: snapshot.rail,
            rail_toggle_enabled: !attempt
                .into_iter()
                .chain(snapshot.superseded_attempt.as_ref())
                .any(MintAttempt::is_in_flight),
            primary: primary_action(snapshot, &native_price, &stable_price),
            native_price: format!("{native_price} {NATIVE_TICKER}"),
            stable_price: format!("{stable_price} {STABLE_TICKER}"),
            notice: attempt.and_then(notice),
            network_banner: network_banner(snapshot),
            error_line: attempt
                .and_then(|a| a.error.as_ref())
                .map(|e| format!("Error: {}", e.short_message)),
            error_details: attempt
                .and_then(|a| a.error.as_ref())
                .map(|e| e.details.clone()),
            transaction_hash: attempt.and_then(|a| a.transaction_hash.clone()),
            earlier_attempt: snapshot.superseded_attempt.as_ref().map(|a| {
                format!("Earlier mint for “{}”: {}", a.name, a.lifecycle.as_str())
            }),
        }
    }
}

fn badge(status: AvailabilityStatus) -> Badge {
    let (tone, text) = match status {
        AvailabilityStatus::Idle => (BadgeTone::Neutral, "Type a name to start"),
        AvailabilityStatus::Unchecked => (BadgeTone::Neutral, "Tap “Check” to continue"),
        AvailabilityStatus::Checking => (BadgeTone::Pending, "Checking…"),
        AvailabilityStatus::Available => (BadgeTone::Positive, "Available"),
        AvailabilityStatus::Taken => (BadgeTone::Negative, "Taken"),
        AvailabilityStatus::Error => (
            BadgeTone::Negative,
            "Error checking name — check RPC/API key.",
        ),
    };
    Badge {
        tone,
        text: text.to_string(),
    }
}

fn primary_action(snapshot: &SessionSnapshot, native: &str, stable: &str) -> PrimaryAction {
    let disabled = |label: &str| PrimaryAction {
        label: label.to_string(),
        enabled: false,
    };

    if let Some(label) = snapshot.attempt.as_ref().and_then(progress_label) {
        return disabled(label);
    }
    match snapshot.gate.blocked_by {
        Some(MintBlockReason::WalletNotConnected) => disabled("Connect Wallet"),
        Some(_) => disabled("Mint button will appear when ready"),
        None => PrimaryAction {
            label: match snapshot.rail {
                PaymentRail::Native if snapshot.fallback_active => {
                    format!("Mint now ({native} {NATIVE_TICKER} + gas)")
                }
                PaymentRail::Native => format!("Mint now ({native} {NATIVE_TICKER}, gasless)"),
                PaymentRail::Stable => format!("Mint now ({stable} {STABLE_TICKER})"),
            },
            enabled: true,
        },
    }
}

fn progress_label(attempt: &MintAttempt) -> Option<&'static str> {
    match (attempt.payment_rail, attempt.lifecycle) {
        (PaymentRail::Native, MintLifecycle::Submitting | MintLifecycle::Confirming) => {
            Some("Minting with ETH…")
        }
        (PaymentRail::Native, MintLifecycle::Succeeded) => Some("Minted with ETH!"),
        (PaymentRail::Stable, MintLifecycle::PayingOffchain) => Some("Processing USDC payment…"),
        (
            PaymentRail::Stable,
            MintLifecycle::Paid | MintLifecycle::Submitting | MintLifecycle::Confirming,
        ) => Some("Minting on-chain…"),
        (PaymentRail::Stable, MintLifecycle::Succeeded) => Some("Minted with USDC!"),
        _ => None,
    }
}

fn notice(attempt: &MintAttempt) -> Option<String> {
    if let Some(notice) = &attempt.notice {
        return Some(notice.clone());
    }
    (attempt.payment_rail == PaymentRail::Stable
        && attempt.stable_payment_confirmed
        && attempt.lifecycle.is_in_flight())
        .then(|| PAYMENT_RECEIVED_NOTICE.to_string())
}

fn network_banner(snapshot: &SessionSnapshot) -> Option<NetworkBanner> {
    let network = &snapshot.network;
    if !snapshot.wallet.connected || network.matches {
        return None;
    }
    let detected = network
        .connected_chain_id
        .map_or_else(|| "unknown".to_string(), |id| id.to_string());
    Some(NetworkBanner {
        message: format!(
            "Wrong network. Please switch to {}. (Detected: {detected})",
            chain_name(network.expected_chain_id)
        ),
        action_label: if network.switching {
            "Switching..."
        } else {
            "Switch"
        }
        .to_string(),
        action_enabled: !network.switching,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{BASE_SEPOLIA_CHAIN_ID, MintSession};
    use crate::domain::{SubmissionFault, WalletStatus};

    fn wallet(chain_id: u64) -> WalletStatus {
        WalletStatus {
            connected: true,
            address: Some("0xabc".to_string()),
            chain_id: Some(chain_id),
        }
    }

    fn available_session(name: &str) -> MintSession {
        let mut session = MintSession::new(BASE_SEPOLIA_CHAIN_ID);
        session.set_name(name);
        let ticket = session.availability.begin_check().unwrap();
        session.availability.resolve(&ticket, Ok(true));
        session
    }

    fn view(session: &MintSession, wallet: WalletStatus) -> ViewModel {
        ViewModel::from_snapshot(&session.snapshot(wallet, None))
    }

    #[test]
    fn test_idle_session() {
        let session = MintSession::new(BASE_SEPOLIA_CHAIN_ID);
        let view = view(&session, wallet(BASE_SEPOLIA_CHAIN_ID));
        assert_eq!(view.badge.text, "Type a name to start");
        assert_eq!(view.primary.label, "Mint button will appear when ready");
        assert!(!view.primary.enabled);
        assert!(view.network_banner.is_none());
    }

    #[test]
    fn test_ready_native_label() {
        let session = available_session("bob");
        let view = view(&session, wallet(BASE_SEPOLIA_CHAIN_ID));
        assert_eq!(view.badge.text, "Available");
        assert_eq!(view.primary.label, "Mint now (0.0005 ETH, gasless)");
        assert!(view.primary.enabled);
        assert_eq!(view.stable_price, "20.00 USDC");
    }

    #[test]
    fn test_fallback_label_after_rejection() {
        let mut session = available_session("bob");
        let name = session.availability.name().clone();
        let ticket = session
            .mint
            .begin(&name, &crate::domain::quote(&name, None))
            .unwrap();
        session.mint.start_submission(ticket.attempt_id);
        session
            .mint
            .submission_failed(ticket.attempt_id, SubmissionFault::new("User rejected the request.", "full"));

        let view = view(&session, wallet(BASE_SEPOLIA_CHAIN_ID));
        assert_eq!(view.primary.label, "Mint now (0.0005 ETH + gas)");
        assert_eq!(view.error_line.as_deref(), Some("Error: User rejected the request."));
        assert_eq!(view.error_details.as_deref(), Some("full"));
    }

    #[test]
    fn test_stable_paid_notice() {
        let mut session = available_session("ab");
        session.mint.select_rail(PaymentRail::Stable).unwrap();
        let name = session.availability.name().clone();
        let ticket = session
            .mint
            .begin(&name, &crate::domain::quote(&name, None))
            .unwrap();

        let paying = view(&session, wallet(BASE_SEPOLIA_CHAIN_ID));
        assert_eq!(paying.primary.label, "Processing USDC payment…");
        assert!(!paying.rail_toggle_enabled);
        assert!(paying.notice.is_none());

        session.mint.payment_succeeded(ticket.attempt_id);
        let paid = view(&session, wallet(BASE_SEPOLIA_CHAIN_ID));
        assert_eq!(paid.primary.label, "Minting on-chain…");
        assert_eq!(paid.notice.as_deref(), Some(PAYMENT_RECEIVED_NOTICE));
    }

    #[test]
    fn test_paid_but_unfinished_notice() {
        let mut session = available_session("ab");
        session.mint.select_rail(PaymentRail::Stable).unwrap();
        let name = session.availability.name().clone();
        let ticket = session
            .mint
            .begin(&name, &crate::domain::quote(&name, None))
            .unwrap();
        session.mint.payment_succeeded(ticket.attempt_id);
        session
            .mint
            .abort(ticket.attempt_id, SubmissionFault::new("Wrong network", "chain 1"));

        let view = view(&session, wallet(BASE_SEPOLIA_CHAIN_ID));
        assert_eq!(
            view.notice.as_deref(),
            Some(crate::app::PAID_NOT_FINALIZED_NOTICE)
        );
        assert_eq!(view.error_line.as_deref(), Some("Error: Wrong network"));
    }

    #[test]
    fn test_wrong_network_banner() {
        let session = available_session("bob");
        let view = view(&session, wallet(1));
        let banner = view.network_banner.unwrap();
        assert_eq!(
            banner.message,
            "Wrong network. Please switch to Base Sepolia. (Detected: 1)"
        );
        assert_eq!(banner.action_label, "Switch");
        assert!(!view.primary.enabled);
    }

    #[test]
    fn test_disconnected_wallet_label() {
        let session = available_session("bob");
        let view = view(&session, WalletStatus::default());
        assert_eq!(view.primary.label, "Connect Wallet");
        assert!(view.network_banner.is_none());
    }

    #[test]
    fn test_error_badge() {
        let mut session = MintSession::new(BASE_SEPOLIA_CHAIN_ID);
        session.set_name("carol");
        let ticket = session.availability.begin_check().unwrap();
        session.availability.resolve(
            &ticket,
            Err(crate::domain::BlockchainError::RpcError("401".to_string())),
        );
        let view = view(&session, wallet(BASE_SEPOLIA_CHAIN_ID));
        assert_eq!(view.badge.tone, BadgeTone::Negative);
        assert!(view.badge.text.starts_with("Error checking name"));
    }
}
