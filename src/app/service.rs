//! Application service layer.
//!
//! Orchestrates the per-session workflows against the registry, wallet,
//! receipt watcher and payment processor through their trait abstractions.
//! Session state lives behind a mutex that is never held across an await;
//! each async step locks, transitions, unlocks, and only then suspends.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::domain::{
    AppError, BlockchainError, HealthResponse, HealthStatus, PaymentProcessor, PaymentRail,
    PriceQuote, ReceiptOutcome, ReceiptWatcher, RegistryClient, SessionSnapshot, SetNameRequest,
    SubmissionFault, WalletSession, WalletStatus, Wei, WorkflowError, quote,
};

use super::availability::CheckTicket;
use super::config::AppConfig;
use super::mint::MintTicket;
use super::network::chain_name;
use super::session::MintSession;

/// Application service containing the mint workflows.
///
/// # Example
///
/// ```ignore
/// let service = Arc::new(MintService::new(config, registry, receipts, wallet, payments));
/// let session = service.create_session().await;
/// service.set_name(session.session_id, &SetNameRequest::new("alice")).await?;
/// service.check_availability(session.session_id).await?;
/// service.start_mint(session.session_id).await?;
/// ```
pub struct MintService {
    config: Arc<AppConfig>,
    registry: Arc<dyn RegistryClient>,
    receipts: Arc<dyn ReceiptWatcher>,
    wallet: Arc<dyn WalletSession>,
    payments: Arc<dyn PaymentProcessor>,
    sessions: Mutex<HashMap<Uuid, MintSession>>,
    mint_fee: RwLock<Option<FeeReading>>,
}

/// Last successful `mintFee` read.
#[derive(Debug, Clone, Copy)]
struct FeeReading {
    fee: Wei,
    read_at: Instant,
}

impl MintService {
    #[must_use]
    pub fn new(
        config: Arc<AppConfig>,
        registry: Arc<dyn RegistryClient>,
        receipts: Arc<dyn ReceiptWatcher>,
        wallet: Arc<dyn WalletSession>,
        payments: Arc<dyn PaymentProcessor>,
    ) -> Self {
        Self {
            config,
            registry,
            receipts,
            wallet,
            payments,
            sessions: Mutex::new(HashMap::new()),
            mint_fee: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn session_count(&self) -> usize {
        self.sessions().len()
    }

    /// Open a new UI session.
    #[instrument(skip(self))]
    pub async fn create_session(&self) -> SessionSnapshot {
        let fee = self.current_fee().await;
        let wallet = self.wallet_status().await;
        let session = MintSession::new(self.config.expected_chain_id);
        let snapshot = session.snapshot(wallet, fee);
        info!(session_id = %session.id, "Session created");
        self.sessions().insert(session.id, session);
        snapshot
    }

    /// Current state of a session as seen by any rendering adapter.
    #[instrument(skip(self))]
    pub async fn snapshot(&self, id: Uuid) -> Result<SessionSnapshot, AppError> {
        let wallet = self.wallet_status().await;
        let fee = self.current_fee().await;
        self.with_session(id, |session| Ok(session.snapshot(wallet, fee)))
    }

    /// Edit the candidate name.
    #[instrument(skip(self, request), fields(name_len = request.name.len()))]
    pub async fn set_name(
        &self,
        id: Uuid,
        request: &SetNameRequest,
    ) -> Result<SessionSnapshot, AppError> {
        request.validate()?;
        self.with_session(id, |session| {
            let name = session.set_name(&request.name);
            debug!(name = %name, "Candidate name changed");
            Ok(())
        })?;
        self.snapshot(id).await
    }

    /// Toggle the payment rail. Not offered while an attempt is in flight.
    #[instrument(skip(self))]
    pub async fn select_rail(
        &self,
        id: Uuid,
        rail: PaymentRail,
    ) -> Result<SessionSnapshot, AppError> {
        self.with_session(id, |session| Ok(session.mint.select_rail(rail)?))?;
        self.snapshot(id).await
    }

    /// Query the registry for the current name. No automatic retries.
    ///
    /// The query runs on its own task, so the ticket is resolved even when the
    /// caller stops waiting (client disconnect, request timeout).
    #[instrument(skip(self))]
    pub async fn check_availability(
        self: &Arc<Self>,
        id: Uuid,
    ) -> Result<SessionSnapshot, AppError> {
        let ticket = self.with_session(id, |session| Ok(session.availability.begin_check()?))?;

        let service = Arc::clone(self);
        let query = tokio::spawn({
            let ticket = ticket.clone();
            async move { service.run_check(id, ticket).await }
        });
        if let Err(e) = query.await {
            warn!(error = %e, "Availability task ended before resolving");
            let fault = BlockchainError::RpcError(format!("availability query aborted: {e}"));
            self.resolve_check(id, &ticket, Err(fault));
        }

        self.snapshot(id).await
    }

    /// Validate the gate and create a mint attempt for the current name.
    #[instrument(skip(self))]
    pub async fn begin_mint(&self, id: Uuid) -> Result<MintTicket, AppError> {
        let wallet = self.wallet_status().await;
        let fee = self.refresh_fee().await;

        let ticket = self.with_session(id, |session| {
            let gate = session.gate(&wallet);
            if let Some(reason) = gate.blocked_by {
                return Err(WorkflowError::MintBlocked(reason).into());
            }
            let name = session.availability.name().clone();
            let price = quote(&name, fee);
            Ok(session.mint.begin(&name, &price)?)
        })?;

        metrics::counter!("basename_mint_attempts_total", "rail" => ticket.rail.as_str())
            .increment(1);
        Ok(ticket)
    }

    /// Carry an attempt through payment, submission and confirmation.
    ///
    /// Steps run strictly in order. A name edit in the middle does not stop the
    /// attempt; its result stays attached to the attempt, not the new name.
    #[instrument(skip(self, ticket), fields(attempt_id = ticket.attempt_id, rail = ticket.rail.as_str()))]
    pub async fn drive_mint(&self, id: Uuid, ticket: MintTicket) {
        let attempt_id = ticket.attempt_id;

        if ticket.rail == PaymentRail::Stable {
            // Nothing is charged unless the wallet can take the on-chain step.
            let wallet = self.wallet_status().await;
            if let Some(fault) = self.chain_fault(&wallet) {
                self.abort_attempt(id, &ticket, fault);
                return;
            }

            let payment = self
                .payments
                .pay(ticket.name.as_str(), ticket.stable_amount)
                .await;
            let applied = self.with_session(id, |session| {
                Ok(match &payment {
                    Ok(_) => session.mint.payment_succeeded(attempt_id),
                    Err(_) => session.mint.payment_failed(attempt_id),
                })
            });
            match (payment, applied) {
                (Ok(receipt), Ok(true)) => {
                    info!(reference = %receipt.reference, "Stablecoin payment confirmed");
                }
                (Err(e), _) => {
                    warn!(error = %e, "Stablecoin payment failed, nothing submitted");
                    record_outcome(ticket.rail, "payment_failed");
                    return;
                }
                (Ok(receipt), Err(e)) => {
                    warn!(reference = %receipt.reference, error = %e, "Session gone after payment");
                    return;
                }
                (Ok(_), Ok(false)) => return,
            }
        }

        let wallet = self.wallet_status().await;
        if let Some(fault) = self.chain_fault(&wallet) {
            self.abort_attempt(id, &ticket, fault);
            return;
        }
        let value = match self.with_session(id, |session| Ok(session.mint.start_submission(attempt_id))) {
            Ok(Some(value)) => value,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "Session gone before submission");
                return;
            }
        };

        let tx_hash = match self.registry.register(ticket.name.as_str(), value).await {
            Ok(hash) => {
                info!(tx_hash = %hash, value = %value, "Register transaction submitted");
                self.update_attempt(id, |s| s.mint.submitted(attempt_id, hash.clone()));
                hash
            }
            Err(e) => {
                warn!(error = %e, "Register submission rejected");
                self.update_attempt(id, |s| s.mint.submission_failed(attempt_id, e.fault()));
                record_outcome(ticket.rail, "rejected");
                return;
            }
        };

        let outcome = self.receipts.wait_for_receipt(&tx_hash).await;
        self.update_attempt(id, |session| match &outcome {
            Ok(ReceiptOutcome::Confirmed) => session.mint.confirmed(attempt_id),
            Ok(ReceiptOutcome::Reverted(reason)) => session
                .mint
                .confirmation_failed(attempt_id, BlockchainError::Reverted(reason.clone()).fault()),
            Err(e) => session.mint.confirmation_failed(attempt_id, e.fault()),
        });

        match outcome {
            Ok(ReceiptOutcome::Confirmed) => {
                info!(tx_hash = %tx_hash, name = %ticket.name, "Mint confirmed");
                record_outcome(ticket.rail, "succeeded");
            }
            Ok(ReceiptOutcome::Reverted(reason)) => {
                warn!(tx_hash = %tx_hash, reason = %reason, "Mint reverted");
                record_outcome(ticket.rail, "reverted");
            }
            Err(e) => {
                warn!(tx_hash = %tx_hash, error = %e, "Receipt watch failed");
                record_outcome(ticket.rail, "receipt_error");
            }
        }
    }

    /// Run a whole mint attempt and return the settled snapshot.
    pub async fn mint(&self, id: Uuid) -> Result<SessionSnapshot, AppError> {
        let ticket = self.begin_mint(id).await?;
        self.drive_mint(id, ticket).await;
        self.snapshot(id).await
    }

    /// Start a mint attempt and let it settle in the background.
    pub async fn start_mint(self: &Arc<Self>, id: Uuid) -> Result<SessionSnapshot, AppError> {
        let ticket = self.begin_mint(id).await?;
        let service = Arc::clone(self);
        tokio::spawn(async move {
            service.drive_mint(id, ticket).await;
        });
        self.snapshot(id).await
    }

    /// Ask the wallet to move to the expected chain and wait for its answer.
    #[instrument(skip(self))]
    pub async fn switch_network(&self, id: Uuid) -> Result<SessionSnapshot, AppError> {
        if self.mark_switching(id)? {
            self.finish_switch(id).await;
        }
        self.snapshot(id).await
    }

    /// Issue the switch request in the background; the snapshot reports `switching`.
    pub async fn start_network_switch(
        self: &Arc<Self>,
        id: Uuid,
    ) -> Result<SessionSnapshot, AppError> {
        if self.mark_switching(id)? {
            let service = Arc::clone(self);
            tokio::spawn(async move {
                service.finish_switch(id).await;
            });
        }
        self.snapshot(id).await
    }

    /// Price quote for an arbitrary name.
    pub async fn quote(&self, name: &str) -> PriceQuote {
        let name = crate::domain::CandidateName::from_input(name);
        quote(&name, self.current_fee().await)
    }

    /// Drop sessions idle for longer than `ttl`. Returns how many were removed.
    pub fn remove_idle_sessions(&self, ttl: Duration) -> usize {
        let Some(cutoff) = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_sub_signed(ttl))
        else {
            return 0;
        };
        let mut sessions = self.sessions();
        let before = sessions.len();
        sessions.retain(|_, session| session.last_seen >= cutoff || session.mint.is_in_flight());
        before - sessions.len()
    }

    /// Performs a health check on the registry and wallet connections.
    pub async fn health_check(&self) -> HealthResponse {
        let registry = match self.registry.health_check().await {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => {
                warn!(error = %e, "Registry health check failed");
                HealthStatus::Unhealthy
            }
        };
        let wallet = match self.wallet.status().await {
            Ok(status) if status.connected => HealthStatus::Healthy,
            Ok(_) => HealthStatus::Degraded,
            Err(e) => {
                warn!(error = %e, "Wallet health check failed");
                HealthStatus::Unhealthy
            }
        };
        HealthResponse::new(registry, wallet)
    }

    fn mark_switching(&self, id: Uuid) -> Result<bool, AppError> {
        self.with_session(id, |session| Ok(session.network.begin_switch()))
    }

    async fn finish_switch(&self, id: Uuid) {
        let target = self.config.expected_chain_id;
        match self.wallet.request_chain_switch(target).await {
            Ok(()) => info!(chain_id = target, "Wallet switched network"),
            Err(e) => warn!(chain_id = target, error = %e, "Network switch request failed"),
        }
        if let Err(e) = self.with_session(id, |session| {
            session.network.finish_switch();
            Ok(())
        }) {
            warn!(error = %e, "Session gone before network switch settled");
        }
    }

    async fn run_check(&self, id: Uuid, ticket: CheckTicket) {
        let result = self.registry.is_available(ticket.name().as_str()).await;
        match &result {
            Ok(available) => info!(name = %ticket.name(), available, "Availability resolved"),
            Err(e) => warn!(name = %ticket.name(), error = %e, "Availability check failed"),
        }
        self.resolve_check(id, &ticket, result);
    }

    fn resolve_check(&self, id: Uuid, ticket: &CheckTicket, result: Result<bool, BlockchainError>) {
        let resolved = self.with_session(id, |session| {
            let applied = session.availability.resolve(ticket, result);
            Ok(applied.then(|| session.availability.status()))
        });
        match resolved {
            Ok(Some(status)) => {
                metrics::counter!("basename_availability_checks_total", "result" => status.as_str())
                    .increment(1);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Session gone before availability resolved"),
        }
    }

    /// `Some` when the wallet is not on the expected chain.
    fn chain_fault(&self, wallet: &WalletStatus) -> Option<SubmissionFault> {
        let expected = self.config.expected_chain_id;
        (wallet.chain_id != Some(expected)).then(|| {
            SubmissionFault::new(
                "Wrong network",
                format!(
                    "Wallet is on chain {:?}, expected {expected} ({})",
                    wallet.chain_id,
                    chain_name(expected)
                ),
            )
        })
    }

    fn abort_attempt(&self, id: Uuid, ticket: &MintTicket, fault: SubmissionFault) {
        self.update_attempt(id, |session| session.mint.abort(ticket.attempt_id, fault));
        record_outcome(ticket.rail, "aborted");
    }

    /// Apply a transition to an attempt whose session may have been evicted.
    fn update_attempt(&self, id: Uuid, f: impl FnOnce(&mut MintSession) -> bool) {
        if let Err(e) = self.with_session(id, |session| Ok(f(session))) {
            warn!(error = %e, "Session gone before mint transition");
        }
    }

    async fn wallet_status(&self) -> WalletStatus {
        match self.wallet.status().await {
            Ok(status) => status,
            Err(e) => {
                warn!(error = %e, "Could not read wallet status");
                WalletStatus::default()
            }
        }
    }

    fn last_fee(&self) -> Option<FeeReading> {
        *self.mint_fee.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// `mintFee` for rendering: the last read while younger than the
    /// configured TTL, otherwise a fresh read.
    async fn current_fee(&self) -> Option<Wei> {
        match self.last_fee() {
            Some(reading) if reading.read_at.elapsed() < self.config.mint_fee_ttl => Some(reading.fee),
            _ => self.refresh_fee().await,
        }
    }

    /// Read `mintFee` from the registry. A failed read falls back to the last
    /// known fee, or leaves it unresolved so the default is used.
    async fn refresh_fee(&self) -> Option<Wei> {
        match self.registry.mint_fee().await {
            Ok(fee) => {
                let reading = FeeReading {
                    fee,
                    read_at: Instant::now(),
                };
                *self.mint_fee.write().unwrap_or_else(PoisonError::into_inner) = Some(reading);
                Some(fee)
            }
            Err(e) => {
                let last = self.last_fee().map(|reading| reading.fee);
                debug!(error = %e, last_known = ?last, "Mint fee read failed");
                last
            }
        }
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<Uuid, MintSession>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_session<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut MintSession) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut sessions = self.sessions();
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| WorkflowError::SessionNotFound(id.to_string()))?;
        session.touch();
        f(session)
    }
}

fn record_outcome(rail: PaymentRail, outcome: &'static str) {
    metrics::counter!(
        "basename_mint_outcomes_total",
        "rail" => rail.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}
