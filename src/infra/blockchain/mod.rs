//! Blockchain client implementations.

pub mod receipts;
pub mod registry;
pub mod rpc;
pub mod wallet;

pub use receipts::PollingReceiptWatcher;
pub use registry::RpcRegistryClient;
pub use rpc::{JsonRpcTransport, RpcClientConfig};
pub use wallet::RpcWalletSession;
