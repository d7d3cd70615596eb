//! Wires the gateway to its backend and serves it.

use std::sync::Arc;

use tfsgate_client::MemoryConnector;
use tfsgate_gateway::{AppState, LevelSetter, build_router};
use tokio::net::TcpListener;

use crate::config::Config;

/// Serves the gateway until Ctrl-C.
pub async fn run(config: Config, log_level: LevelSetter) -> anyhow::Result<()> {
    config.gateway.validate()?;

    let connector = MemoryConnector::new().with_max_io(config.memory.max_io);
    let state = AppState::new(config.gateway, connector).with_log_level(log_level);
    let router = build_router(Arc::new(state));

    let listener = TcpListener::bind(config.listen.as_str()).await?;
    tracing::info!(addr = %listener.local_addr()?, "HTTP listener started");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
