//! Application layer containing the workflows, session orchestration and shared state.

pub mod availability;
pub mod config;
pub mod mint;
pub mod network;
pub mod service;
pub mod session;
pub mod state;
pub mod sweeper;

pub use availability::{AvailabilityWorkflow, CheckTicket};
pub use config::{AppConfig, ChainEnv};
pub use mint::{MintTicket, MintWorkflow, PAID_NOT_FINALIZED_NOTICE, PAYMENT_FAILED_NOTICE};
pub use network::{BASE_MAINNET_CHAIN_ID, BASE_SEPOLIA_CHAIN_ID, NetworkGuard, chain_name};
pub use service::MintService;
pub use session::MintSession;
pub use state::AppState;
pub use sweeper::{SessionSweeper, SweeperConfig, spawn_sweeper};
