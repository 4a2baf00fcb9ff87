//! Concierge HTTP 前端
//!
//! 启动: cargo run --bin concierge-http --features http

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use concierge::config::load_config;
use concierge::core::ShutdownManager;
use concierge::gateway::BotAdapter;
use concierge::integrations::http::{create_router, HttpState};
use concierge::{observability, ConciergeBot};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = load_config(config_path).context("Failed to load config")?;
    let bot = ConciergeBot::from_config(&config).context("Failed to create bot")?;

    let shutdown = Arc::new(ShutdownManager::new());
    shutdown.install_signal_handlers();

    let state = Arc::new(HttpState::new(BotAdapter::new(Arc::new(bot))));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.http.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.http.bind))?;
    tracing::info!(bind = %config.http.bind, "http channel listening");

    let signal = Arc::clone(&shutdown);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { signal.wait_for_shutdown().await })
        .await
        .context("HTTP server failed")?;

    tracing::info!("http channel stopped");
    Ok(())
}
