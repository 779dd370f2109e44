use std::sync::Arc;

use authadmin::client::MemoryRouteStore;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so SERVER_PORT, APP_ENV, etc. are picked up
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = authadmin::config::config();
    tracing::info!("Starting route API in {:?} mode", config.environment);

    let store = Arc::new(MemoryRouteStore::new());
    let app = authadmin::server::app(store);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;

    tracing::info!("Route API listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
