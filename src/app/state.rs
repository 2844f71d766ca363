//! Application state management.
//!
//! This module provides the shared application state that is
//! accessible to all request handlers via Axum's State extractor.

use std::sync::Arc;

use crate::infra::PrometheusHandle;

use super::service::MintService;

/// Shared application state for the Axum web server.
///
/// All contained types are wrapped in `Arc` and implement `Send + Sync`,
/// making `AppState` safe to share across async tasks.
#[derive(Clone)]
pub struct AppState {
    /// The service owning every UI session and its workflows.
    pub service: Arc<MintService>,

    /// Prometheus scrape handle, when a recorder was installed.
    pub metrics: Option<Arc<PrometheusHandle>>,
}

impl AppState {
    #[must_use]
    pub fn new(service: Arc<MintService>) -> Self {
        Self {
            service,
            metrics: None,
        }
    }

    #[must_use]
    pub fn with_metrics(mut self, handle: Option<Arc<PrometheusHandle>>) -> Self {
        self.metrics = handle;
        self
    }
}
