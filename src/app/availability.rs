//! Availability workflow: tracks one candidate name from input to a confirmed answer.

use tracing::debug;

use crate::domain::{
    AvailabilityRecord, AvailabilityStatus, BlockchainError, CandidateName, WorkflowError,
};

/// Handle for an issued availability query.
///
/// Results are applied only while the ticket still matches the workflow's
/// current generation, so an answer for an edited-away name is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckTicket {
    generation: u64,
    name: CandidateName,
}

impl CheckTicket {
    pub fn name(&self) -> &CandidateName {
        &self.name
    }
}

#[derive(Debug, Clone)]
pub struct AvailabilityWorkflow {
    name: CandidateName,
    status: AvailabilityStatus,
    error: Option<String>,
    generation: u64,
}

impl Default for AvailabilityWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

impl AvailabilityWorkflow {
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: CandidateName::default(),
            status: AvailabilityStatus::Idle,
            error: None,
            generation: 0,
        }
    }

    pub fn name(&self) -> &CandidateName {
        &self.name
    }

    pub fn status(&self) -> AvailabilityStatus {
        self.status
    }

    pub fn record(&self) -> AvailabilityRecord {
        AvailabilityRecord {
            queried_name: self.name.clone(),
            status: self.status,
            error: self.error.clone(),
        }
    }

    /// Replace the candidate name. Always discards the previous answer, even
    /// when the new input equals a name that was already checked.
    pub fn set_name(&mut self, input: &str) -> &CandidateName {
        self.name = CandidateName::from_input(input);
        self.generation += 1;
        self.error = None;
        self.status = if self.name.is_empty() {
            AvailabilityStatus::Idle
        } else {
            AvailabilityStatus::Unchecked
        };
        &self.name
    }

    pub fn can_check(&self) -> bool {
        !self.name.is_empty() && self.status != AvailabilityStatus::Checking
    }

    /// Move to `Checking` and hand out the ticket for the query about to be issued.
    pub fn begin_check(&mut self) -> Result<CheckTicket, WorkflowError> {
        if self.name.is_empty() {
            return Err(WorkflowError::CheckNotAllowed(
                "no name entered".to_string(),
            ));
        }
        if self.status == AvailabilityStatus::Checking {
            return Err(WorkflowError::CheckNotAllowed(
                "a check is already running".to_string(),
            ));
        }

        self.generation += 1;
        self.status = AvailabilityStatus::Checking;
        self.error = None;
        Ok(CheckTicket {
            generation: self.generation,
            name: self.name.clone(),
        })
    }

    /// Apply a query result. Returns `false` when the ticket is stale.
    pub fn resolve(
        &mut self,
        ticket: &CheckTicket,
        result: Result<bool, BlockchainError>,
    ) -> bool {
        if ticket.generation != self.generation || self.status != AvailabilityStatus::Checking {
            debug!(name = %ticket.name, "Dropping availability result for superseded name");
            return false;
        }

        match result {
            Ok(true) => self.status = AvailabilityStatus::Available,
            Ok(false) => self.status = AvailabilityStatus::Taken,
            Err(e) => {
                self.status = AvailabilityStatus::Error;
                self.error = Some(e.to_string());
            }
        }
        true
    }

    /// True only when the current name is confirmed available.
    pub fn is_available(&self) -> bool {
        !self.name.is_empty() && self.status == AvailabilityStatus::Available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checked(name: &str, available: bool) -> AvailabilityWorkflow {
        let mut wf = AvailabilityWorkflow::new();
        wf.set_name(name);
        let ticket = wf.begin_check().unwrap();
        assert!(wf.resolve(&ticket, Ok(available)));
        wf
    }

    #[test]
    fn test_starts_idle() {
        let wf = AvailabilityWorkflow::new();
        assert_eq!(wf.status(), AvailabilityStatus::Idle);
        assert!(!wf.can_check());
    }

    #[test]
    fn test_set_name_lowercases_and_resets() {
        let mut wf = AvailabilityWorkflow::new();
        assert_eq!(wf.set_name("BoB").as_str(), "bob");
        assert_eq!(wf.status(), AvailabilityStatus::Unchecked);

        wf.set_name("");
        assert_eq!(wf.status(), AvailabilityStatus::Idle);
    }

    #[test]
    fn test_resolve_true_false_and_error() {
        assert_eq!(checked("ab", true).status(), AvailabilityStatus::Available);
        assert_eq!(checked("alice", false).status(), AvailabilityStatus::Taken);

        let mut wf = AvailabilityWorkflow::new();
        wf.set_name("carol");
        let ticket = wf.begin_check().unwrap();
        wf.resolve(&ticket, Err(BlockchainError::RpcError("401".to_string())));
        assert_eq!(wf.status(), AvailabilityStatus::Error);
        assert!(wf.record().error.unwrap().contains("401"));
        assert!(!wf.is_available());
    }

    #[test]
    fn test_retyping_same_name_requires_recheck() {
        let mut wf = checked("ab", true);
        wf.set_name("ab");
        assert_eq!(wf.status(), AvailabilityStatus::Unchecked);
        assert!(!wf.is_available());

        let mut wf = checked("taken", false);
        wf.set_name("taken");
        assert_eq!(wf.status(), AvailabilityStatus::Unchecked);
    }

    #[test]
    fn test_begin_check_guards() {
        let mut wf = AvailabilityWorkflow::new();
        assert!(matches!(
            wf.begin_check(),
            Err(WorkflowError::CheckNotAllowed(_))
        ));

        wf.set_name("bob");
        let _ticket = wf.begin_check().unwrap();
        assert!(!wf.can_check());
        assert!(matches!(
            wf.begin_check(),
            Err(WorkflowError::CheckNotAllowed(_))
        ));
    }

    #[test]
    fn test_stale_result_is_dropped_after_edit() {
        let mut wf = AvailabilityWorkflow::new();
        wf.set_name("bob");
        let ticket = wf.begin_check().unwrap();

        wf.set_name("bobby");
        assert!(!wf.resolve(&ticket, Ok(true)));
        assert_eq!(wf.status(), AvailabilityStatus::Unchecked);
        assert_eq!(wf.name().as_str(), "bobby");
    }

    #[test]
    fn test_terminal_states_can_be_rechecked() {
        let mut wf = checked("bob", false);
        assert!(wf.can_check());
        let ticket = wf.begin_check().unwrap();
        wf.resolve(&ticket, Ok(true));
        assert!(wf.is_available());
    }

    #[test]
    fn test_ticket_resolves_once() {
        let mut wf = AvailabilityWorkflow::new();
        wf.set_name("bob");
        let ticket = wf.begin_check().unwrap();
        assert!(wf.resolve(&ticket, Ok(true)));
        assert!(!wf.resolve(&ticket, Err(BlockchainError::Timeout("late".to_string()))));
        assert_eq!(wf.status(), AvailabilityStatus::Available);
    }
}
