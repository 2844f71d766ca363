//! Basename Mint
//!
//! Checks whether a `.base` name is free in the on-chain registry and mints it,
//! paying either with native ETH or with an off-chain USDC payment.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │          API / Presentation Layers           │
//! │  HTTP handlers, routing, rendered views      │
//! ├─────────────────────────────────────────────┤
//! │               Application Layer              │
//! │  Availability / mint workflows, sessions     │
//! ├─────────────────────────────────────────────┤
//! │                 Domain Layer                 │
//! │  Types, price policy, traits, errors         │
//! ├─────────────────────────────────────────────┤
//! │             Infrastructure Layer             │
//! │  JSON-RPC registry, wallet, receipts         │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! The workflows only see the registry, wallet, receipt watcher and payment
//! processor through traits, so every rendering adapter drives the same
//! state machines and every collaborator can be mocked.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use basename_mint::api::create_router;
//! use basename_mint::app::{AppConfig, AppState, MintService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Arc::new(AppConfig::from_env()?);
//!     let service = Arc::new(MintService::new(config, registry, receipts, wallet, payments));
//!     let router = create_router(Arc::new(AppState::new(service)));
//!     axum::serve(listener, router).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod app;
pub mod domain;
pub mod infra;
pub mod presentation;

// Test utilities are available in tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
