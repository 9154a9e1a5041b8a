//! Broker HTTP server: bind, serve, shut down on signal.

use anyhow::{Context, Result};
use brokerconf::BrokerConfig;
use tracing::info;

use crate::api;
use crate::state::BrokerState;

/// Run the broker until SIGINT/SIGTERM.
pub async fn run(config: BrokerConfig) -> Result<()> {
    let addr = config.infra.bind.addr();
    let state = BrokerState::new(config.broker.clone(), config.infra.bind.public_url.clone());

    info!("Dream broker starting");
    info!(
        "   Broker API: {}.{}",
        config.broker.api_major, config.broker.api_minor
    );
    info!("   Service id: {}", state.catalog.service().id);
    for plan in &state.catalog.service().plans {
        info!("   Plan {}: {}", plan.name, plan.id);
    }

    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("port={}", config.infra.bind.http_port);
    info!("   Catalog: GET http://{}/v2/catalog", addr);
    info!("   Console: GET http://{}/console", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received SIGINT, shutting down...");
        }
        _ = terminate() => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            tracing::warn!("Failed to install SIGTERM handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
