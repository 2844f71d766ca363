use std::sync::Arc;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use tracing::{info, warn};

use basename_mint::api::{RateLimitConfig, create_router_with_rate_limit};
use basename_mint::app::{AppConfig, AppState, MintService, SweeperConfig, chain_name, spawn_sweeper};
use basename_mint::app::config::short_secret;
use basename_mint::domain::HealthStatus;
use basename_mint::infra::{
    JsonRpcTransport, PlaceholderPaymentProcessor, PollingReceiptWatcher, RpcClientConfig,
    RpcRegistryClient, RpcWalletSession, init_metrics_handle, init_tracing,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing();

    let config = Arc::new(AppConfig::from_env().context("invalid configuration")?);
    info!(
        chain_id = config.expected_chain_id,
        network = chain_name(config.expected_chain_id),
        registry = %config.registry_address,
        rpc_url = %config.rpc_url,
        "Configuration loaded"
    );
    info!(
        paymaster_url = %short_secret(config.paymaster_url.as_ref()),
        onchainkit_api_key = %short_secret(config.onchainkit_api_key.as_ref()),
        "Secrets"
    );

    let reads = Arc::new(JsonRpcTransport::new(&config.rpc_url, RpcClientConfig::default())?);
    let wallet_rpc = Arc::new(JsonRpcTransport::new(
        &config.wallet_rpc_url,
        RpcClientConfig::default(),
    )?);

    let registry = Arc::new(RpcRegistryClient::new(
        Arc::clone(&reads),
        Arc::clone(&wallet_rpc),
        &config.registry_address,
    )?);
    let receipts = Arc::new(PollingReceiptWatcher::new(
        Arc::clone(&reads),
        config.receipt_poll_interval,
        config.receipt_timeout,
    ));
    let wallet = Arc::new(RpcWalletSession::new(wallet_rpc));
    let payments = Arc::new(PlaceholderPaymentProcessor::new(config.payment_delay));

    let service = Arc::new(MintService::new(
        Arc::clone(&config),
        registry,
        receipts,
        wallet,
        payments,
    ));

    let health = service.health_check().await;
    if health.registry != HealthStatus::Healthy {
        warn!(status = ?health.status, "Registry not reachable at startup");
    }

    let metrics = init_metrics_handle();
    if metrics.is_none() {
        warn!("Metrics recorder could not be installed; /metrics disabled");
    }
    let state = Arc::new(AppState::new(Arc::clone(&service)).with_metrics(metrics));

    let (sweeper, shutdown_tx) = spawn_sweeper(
        Arc::clone(&service),
        SweeperConfig {
            session_ttl: config.session_ttl,
            ..SweeperConfig::default()
        },
    );

    let router = create_router_with_rate_limit(state, RateLimitConfig::from_env());
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "Server starting");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    let _ = shutdown_tx.send(true);
    if let Err(e) = sweeper.await {
        warn!(error = %e, "Session sweeper did not stop cleanly");
    }
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
