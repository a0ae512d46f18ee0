//! varal-server - HTTP boundary for the varal clothesline backend.
//!
//! Wires one MQTT session to a small HTTP API: `GET /heartbeat` returns
//! the latest device status, `POST /cmd` forwards an operator command.

mod http;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;
use varal_session::{Session, SessionConfig, VaralService};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let http_addr =
        std::env::var("VARAL_HTTP_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());

    let config = SessionConfig::from_env()?;
    let session = Arc::new(Session::new(config)?);
    session.start().await?;

    let service = VaralService::new(session.clone());
    let app = http::router(service);

    let listener = tokio::net::TcpListener::bind(&http_addr).await?;
    info!(addr = %http_addr, "http server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    session.stop().await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
