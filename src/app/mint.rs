//! Mint workflow: payment rail selection and the lifecycle of one mint attempt.
//!
//! Native rail: `Idle → Submitting → Confirming → Succeeded`, with
//! `Submitting → Failed` on rejection and `Confirming → Failed` on revert.
//!
//! Stable rail: `Idle → PayingOffchain → Paid → Submitting → Confirming → Succeeded`.
//! A failed payment drops back to `Idle` without touching the chain.
//!
//! Every transition takes the attempt id it was issued for. Transitions for an
//! attempt that has been replaced are ignored.

use tracing::{info, warn};

use crate::domain::{
    CandidateName, MintAttempt, MintLifecycle, PaymentRail, PriceQuote, SubmissionFault, Wei,
    WorkflowError,
};

/// Shown when the off-chain payment fails and nothing is sent on-chain.
pub const PAYMENT_FAILED_NOTICE: &str = "USDC payment failed. No on-chain mint was sent.";

/// Shown when a paid stable attempt fails before the mint lands on-chain.
pub const PAID_NOT_FINALIZED_NOTICE: &str =
    "USDC payment received, but the on-chain mint did not complete.";

/// Everything the driver needs to carry an attempt through its steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintTicket {
    pub attempt_id: u64,
    pub name: CandidateName,
    pub rail: PaymentRail,
    /// Native fee captured at trigger time.
    pub native_fee: Wei,
    /// Stablecoin amount captured at trigger time.
    pub stable_amount: u64,
}

#[derive(Debug, Clone, Default)]
pub struct MintWorkflow {
    rail: PaymentRail,
    fallback_active: bool,
    attempt: Option<MintAttempt>,
    next_id: u64,
}

impl MintWorkflow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rail(&self) -> PaymentRail {
        self.rail
    }

    /// Sticky for the session once a native submission has failed.
    pub fn fallback_active(&self) -> bool {
        self.fallback_active
    }

    pub fn attempt(&self) -> Option<&MintAttempt> {
        self.attempt.as_ref()
    }

    /// The attempt attributed to the current name.
    pub fn current_attempt(&self) -> Option<&MintAttempt> {
        self.attempt.as_ref().filter(|a| !a.superseded)
    }

    /// An attempt left running after the name changed under it.
    pub fn superseded_attempt(&self) -> Option<&MintAttempt> {
        self.attempt.as_ref().filter(|a| a.superseded)
    }

    pub fn is_in_flight(&self) -> bool {
        self.attempt.as_ref().is_some_and(MintAttempt::is_in_flight)
    }

    pub fn select_rail(&mut self, rail: PaymentRail) -> Result<(), WorkflowError> {
        if self.is_in_flight() {
            return Err(WorkflowError::AttemptInFlight);
        }
        self.rail = rail;
        Ok(())
    }

    /// Detach the attempt from the candidate name. A running attempt keeps
    /// going but is no longer reported as the current name's attempt.
    pub fn on_name_changed(&mut self) {
        match self.attempt.as_mut() {
            Some(attempt) if attempt.is_in_flight() => attempt.superseded = true,
            _ => self.attempt = None,
        }
    }

    /// Create a new attempt for `name` on the selected rail.
    pub fn begin(
        &mut self,
        name: &CandidateName,
        quote: &PriceQuote,
    ) -> Result<MintTicket, WorkflowError> {
        if self.is_in_flight() {
            return Err(WorkflowError::AttemptInFlight);
        }

        self.next_id += 1;
        let mut attempt = MintAttempt::new(
            self.next_id,
            name.clone(),
            self.rail,
            self.fallback_active,
        );
        attempt.lifecycle = match self.rail {
            PaymentRail::Native => {
                attempt.value = Some(quote.native_fee);
                MintLifecycle::Submitting
            }
            PaymentRail::Stable => MintLifecycle::PayingOffchain,
        };

        info!(
            attempt_id = attempt.id,
            name = %name,
            rail = self.rail.as_str(),
            "Mint attempt started"
        );

        let ticket = MintTicket {
            attempt_id: attempt.id,
            name: name.clone(),
            rail: self.rail,
            native_fee: quote.native_fee,
            stable_amount: quote.stable_price,
        };
        self.attempt = Some(attempt);
        Ok(ticket)
    }

    /// Stable rail: the off-chain payment settled.
    pub fn payment_succeeded(&mut self, attempt_id: u64) -> bool {
        let Some(attempt) = self.attempt_in(attempt_id, MintLifecycle::PayingOffchain) else {
            return false;
        };
        attempt.lifecycle = MintLifecycle::Paid;
        attempt.stable_payment_confirmed = true;
        true
    }

    /// Stable rail: the payment failed. Back to `Idle`, nothing was submitted.
    pub fn payment_failed(&mut self, attempt_id: u64) -> bool {
        let Some(attempt) = self.attempt_in(attempt_id, MintLifecycle::PayingOffchain) else {
            return false;
        };
        attempt.lifecycle = MintLifecycle::Idle;
        attempt.stable_payment_confirmed = false;
        attempt.notice = Some(PAYMENT_FAILED_NOTICE.to_string());
        true
    }

    /// Move to `Submitting` and return the on-chain value the register call must carry.
    ///
    /// Native attempts carry the fee captured at trigger time. Stable attempts
    /// carry zero and are refused unless the payment was confirmed.
    pub fn start_submission(&mut self, attempt_id: u64) -> Option<Wei> {
        let attempt = self.attempt.as_mut().filter(|a| a.id == attempt_id)?;
        match (attempt.payment_rail, attempt.lifecycle) {
            (PaymentRail::Native, MintLifecycle::Submitting) => attempt.value,
            (PaymentRail::Stable, MintLifecycle::Paid) if attempt.stable_payment_confirmed => {
                attempt.lifecycle = MintLifecycle::Submitting;
                attempt.value = Some(0);
                Some(0)
            }
            (rail, lifecycle) => {
                warn!(
                    attempt_id,
                    rail = rail.as_str(),
                    lifecycle = lifecycle.as_str(),
                    "Refusing on-chain submission from this state"
                );
                None
            }
        }
    }

    /// The wallet accepted the transaction.
    pub fn submitted(&mut self, attempt_id: u64, tx_hash: String) -> bool {
        let Some(attempt) = self.attempt_in(attempt_id, MintLifecycle::Submitting) else {
            return false;
        };
        attempt.lifecycle = MintLifecycle::Confirming;
        attempt.transaction_hash = Some(tx_hash);
        true
    }

    /// The wallet rejected the transaction or simulation failed.
    ///
    /// On the native rail this switches the session to user-paid gas framing for good.
    pub fn submission_failed(&mut self, attempt_id: u64, fault: SubmissionFault) -> bool {
        let flips_fallback = {
            let Some(attempt) = self.attempt_in(attempt_id, MintLifecycle::Submitting) else {
                return false;
            };
            mark_failed(attempt, fault);
            if attempt.payment_rail == PaymentRail::Native {
                attempt.fallback_active = true;
                true
            } else {
                false
            }
        };
        if flips_fallback && !self.fallback_active {
            info!(attempt_id, "Native submission failed, switching to user-paid gas");
            self.fallback_active = true;
        }
        true
    }

    /// The receipt confirmed the transaction.
    pub fn confirmed(&mut self, attempt_id: u64) -> bool {
        let Some(attempt) = self.attempt_in(attempt_id, MintLifecycle::Confirming) else {
            return false;
        };
        attempt.lifecycle = MintLifecycle::Succeeded;
        true
    }

    /// The receipt reverted or the watcher failed.
    pub fn confirmation_failed(&mut self, attempt_id: u64, fault: SubmissionFault) -> bool {
        let Some(attempt) = self.attempt_in(attempt_id, MintLifecycle::Confirming) else {
            return false;
        };
        mark_failed(attempt, fault);
        true
    }

    /// Fail an in-flight attempt before anything reaches the wallet.
    /// Does not touch the fallback flag.
    pub fn abort(&mut self, attempt_id: u64, fault: SubmissionFault) -> bool {
        let Some(attempt) = self
            .attempt
            .as_mut()
            .filter(|a| a.id == attempt_id && a.is_in_flight())
        else {
            return false;
        };
        warn!(attempt_id, reason = %fault.short_message, "Mint attempt aborted");
        mark_failed(attempt, fault);
        true
    }

    fn attempt_in(&mut self, attempt_id: u64, expected: MintLifecycle) -> Option<&mut MintAttempt> {
        let attempt = self.attempt.as_mut().filter(|a| a.id == attempt_id);
        match attempt {
            Some(a) if a.lifecycle == expected => Some(a),
            Some(a) => {
                warn!(
                    attempt_id,
                    expected = expected.as_str(),
                    actual = a.lifecycle.as_str(),
                    "Ignoring out-of-order mint transition"
                );
                None
            }
            None => {
                warn!(attempt_id, "Ignoring transition for a replaced mint attempt");
                None
            }
        }
    }
}

fn mark_failed(attempt: &mut MintAttempt, fault: SubmissionFault) {
    attempt.lifecycle = MintLifecycle::Failed;
    attempt.error = Some(fault);
    if attempt.stable_payment_confirmed {
        attempt.notice = Some(PAID_NOT_FINALIZED_NOTICE.to_string());
    }
}
