//! Infrastructure layer implementations.

pub mod blockchain;
pub mod observability;
pub mod payment;

pub use blockchain::{
    JsonRpcTransport, PollingReceiptWatcher, RpcClientConfig, RpcRegistryClient, RpcWalletSession,
};
pub use observability::{PrometheusHandle, init_metrics, init_metrics_handle, init_tracing};
pub use payment::PlaceholderPaymentProcessor;
