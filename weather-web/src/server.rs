use std::net::SocketAddr;

use anyhow::Context;
use city_weather_core::Config;
use tracing::info;

use crate::{router::create_router, state::AppState};

/// Bind and serve until Ctrl-C.
pub async fn serve(config: &Config, bind: Option<&str>) -> anyhow::Result<()> {
    let bind_addr = bind.unwrap_or(&config.server.bind);
    let addr: SocketAddr = bind_addr
        .parse()
        .with_context(|| format!("Invalid bind address '{bind_addr}'"))?;

    let state = AppState::from_config(config)?;
    let app = create_router().with_state(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!(
        resolver = %config.default_resolver_kind()?,
        "city-weather listening on http://{}",
        listener.local_addr()?
    );
    info!("  GET|POST /");
    info!("  GET|POST /{{city}}[?country=CC]");
    info!("  GET      /error");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("city-weather stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
    }
}
