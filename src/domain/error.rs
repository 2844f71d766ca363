//! Application error types with proper error chaining.

use thiserror::Error;

use super::types::{MintBlockReason, SubmissionFault};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlockchainError {
    #[error("Connection failed: {0}")]
    Connection(String),
    #[error("RPC call failed: {0}")]
    RpcError(String),
    #[error("Transaction rejected: {short_message}")]
    Rejected {
        short_message: String,
        details: String,
    },
    #[error("Transaction reverted: {0}")]
    Reverted(String),
    #[error("Timeout waiting for confirmation: {0}")]
    Timeout(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl BlockchainError {
    /// Split the error into the short line shown inline and the full text shown on demand.
    #[must_use]
    pub fn fault(&self) -> SubmissionFault {
        match self {
            BlockchainError::Rejected {
                short_message,
                details,
            } => SubmissionFault::new(short_message.clone(), details.clone()),
            other => {
                let details = other.to_string();
                let short = details.lines().next().unwrap_or_default().to_string();
                SubmissionFault::new(short, details)
            }
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    #[error("Payment declined: {0}")]
    Declined(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("Availability check not allowed: {0}")]
    CheckNotAllowed(String),
    #[error("Mint not allowed: {0}")]
    MintBlocked(MintBlockReason),
    #[error("A mint attempt is already in flight")]
    AttemptInFlight,
    #[error("Session not found: {0}")]
    SessionNotFound(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Validation failed: {0}")]
    Multiple(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Blockchain(#[from] BlockchainError),
    #[error(transparent)]
    Payment(#[from] PaymentError),
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(ValidationError::Multiple(err.to_string()))
    }
}
