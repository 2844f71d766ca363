//! Background sweeper that evicts idle UI sessions.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

use super::service::MintService;

/// Configuration for the session sweeper
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// Interval between sweeps
    pub sweep_interval: Duration,
    /// Sessions untouched for longer than this are dropped
    pub session_ttl: Duration,
    /// Whether the sweeper is enabled
    pub enabled: bool,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(60),
            session_ttl: Duration::from_secs(3600),
            enabled: true,
        }
    }
}

/// Periodically drops sessions that no client has touched within the TTL.
/// Sessions with an attempt still in flight are kept until it settles.
pub struct SessionSweeper {
    service: Arc<MintService>,
    config: SweeperConfig,
    shutdown_rx: watch::Receiver<bool>,
}

impl SessionSweeper {
    pub fn new(
        service: Arc<MintService>,
        config: SweeperConfig,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            service,
            config,
            shutdown_rx,
        }
    }

    /// Run the sweep loop until shutdown is signalled
    pub async fn run(mut self) {
        if !self.config.enabled {
            info!("Session sweeper is disabled");
            return;
        }

        info!(
            sweep_interval = ?self.config.sweep_interval,
            session_ttl = ?self.config.session_ttl,
            "Starting session sweeper"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.config.sweep_interval) => {
                    self.sweep();
                }
                result = self.shutdown_rx.changed() => {
                    if result.is_err() || *self.shutdown_rx.borrow() {
                        info!("Session sweeper shutting down");
                        break;
                    }
                }
            }
        }
    }

    fn sweep(&self) {
        let removed = self.service.remove_idle_sessions(self.config.session_ttl);
        if removed > 0 {
            info!(removed, remaining = self.service.session_count(), "Evicted idle sessions");
        } else {
            debug!("No idle sessions to evict");
        }
    }
}

/// Spawn the sweeper as a tokio task
pub fn spawn_sweeper(
    service: Arc<MintService>,
    config: SweeperConfig,
) -> (tokio::task::JoinHandle<()>, watch::Sender<bool>) {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = SessionSweeper::new(service, config, shutdown_rx);
    let handle = tokio::spawn(sweeper.run());
    (handle, shutdown_tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_service;

    #[test]
    fn test_sweeper_config_default() {
        let config = SweeperConfig::default();
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
        assert_eq!(config.session_ttl, Duration::from_secs(3600));
        assert!(config.enabled);
    }

    #[tokio::test]
    async fn test_sweeper_disabled_returns_immediately() {
        let config = SweeperConfig {
            enabled: false,
            ..SweeperConfig::default()
        };
        let (_, shutdown_rx) = watch::channel(false);
        let sweeper = SessionSweeper::new(test_service(), config, shutdown_rx);

        let start = std::time::Instant::now();
        sweeper.run().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_sweeper_evicts_idle_sessions() {
        let service = test_service();
        service.create_session().await;
        let config = SweeperConfig {
            sweep_interval: Duration::from_millis(10),
            session_ttl: Duration::from_millis(1),
            enabled: true,
        };

        let (handle, shutdown_tx) = spawn_sweeper(Arc::clone(&service), config);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(service.session_count(), 0);

        shutdown_tx.send(true).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(2), handle).await;
        assert!(result.is_ok(), "Sweeper should shut down within 2 seconds");
    }

    #[tokio::test]
    async fn test_sweeper_keeps_fresh_sessions() {
        let service = test_service();
        service.create_session().await;
        let config = SweeperConfig {
            sweep_interval: Duration::from_millis(10),
            session_ttl: Duration::from_secs(3600),
            enabled: true,
        };

        let (handle, shutdown_tx) = spawn_sweeper(Arc::clone(&service), config);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(service.session_count(), 1);

        shutdown_tx.send(true).unwrap();
        let _ = tokio::time::timeout(Duration::from_secs(2), handle).await;
    }
}
