use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, State};
use axum::routing::{delete, get};
use axum::Router;
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::client::RouteStore;
use crate::handlers;

/// Shared state of the reference route API
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RouteStore>,
}

/// Build the route API router over `store`, layered per the global config
pub fn app(store: Arc<dyn RouteStore>) -> Router {
    let config = &crate::config::config().server;

    let mut router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Route persistence
        .merge(route_routes())
        .layer(DefaultBodyLimit::max(config.max_request_size_bytes));

    if config.enable_cors {
        router = router.layer(CorsLayer::permissive());
    }
    if config.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(AppState { store })
}

fn route_routes() -> Router<AppState> {
    Router::new()
        // Collection-level bulk operations
        .route(
            "/api/routes",
            get(handlers::list)
                .post(handlers::bulk_create)
                .put(handlers::bulk_update)
                .delete(handlers::bulk_delete),
        )
        // Single route
        .route("/api/routes/:id", delete(handlers::delete_one))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "authadmin route API",
            "version": version,
            "description": "Reference persistence API for the route admin console",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "routes": "/api/routes (GET list, POST bulk create, PUT bulk update, DELETE bulk delete)",
                "route": "/api/routes/:id (DELETE)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match state.store.list_routes().await {
        Ok(routes) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "routes": routes.len()
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "route store unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "store_error": e.to_string()
                }
            })),
        ),
    }
}
