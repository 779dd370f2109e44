#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;

use authadmin::client::{HttpRouteStore, MemoryRouteStore};
use authadmin::routes::Route;

/// Reference route API served in-process on a free port
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub store: Arc<MemoryRouteStore>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub async fn spawn(routes: Vec<Route>) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let store = Arc::new(MemoryRouteStore::with_routes(routes));
        let app = authadmin::server::app(store.clone());
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test listener")?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("test server stopped: {}", e);
            }
        });

        let server = Self { port, base_url, store, handle };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    /// HTTP route store pointed at this server
    pub fn http_store(&self) -> Result<HttpRouteStore> {
        Ok(HttpRouteStore::new(&self.base_url, Duration::from_secs(5))?)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn route(id: &str, name: &str, protected: bool) -> Route {
    Route::new(id, name, "2025-01-01T00:00:00Z", protected)
}

/// route-1 .. route-n, ids "1" .. "n", none protected
pub fn numbered_routes(count: usize) -> Vec<Route> {
    (1..=count)
        .map(|i| route(&i.to_string(), &format!("route-{}", i), false))
        .collect()
}
