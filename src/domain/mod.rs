//! Domain layer containing core business types, traits, and error definitions.

pub mod error;
pub mod price;
pub mod traits;
pub mod types;

pub use error::{
    AppError, BlockchainError, ConfigError, PaymentError, ValidationError, WorkflowError,
};
pub use price::{DEFAULT_NATIVE_FEE_WEI, format_native, format_stable, quote, stable_price};
pub use traits::{PaymentProcessor, ReceiptWatcher, RegistryClient, WalletSession};
pub use types::{
    AvailabilityRecord, AvailabilityStatus, CandidateName, ErrorDetail, ErrorResponse,
    HealthResponse, HealthStatus, MAX_NAME_LEN, MintAttempt, MintBlockReason, MintGate,
    MintLifecycle, NetworkStatus, PaymentRail, PaymentReceipt, PriceQuote, QuoteParams,
    RateLimitResponse, ReceiptOutcome, SelectRailRequest, SessionSnapshot, SetNameRequest,
    SubmissionFault, TxHash, ViewFormat, ViewParams, WalletStatus, Wei,
};
