pub mod http;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::routes::model::{Route, RouteId};

pub use http::HttpRouteStore;
pub use memory::MemoryRouteStore;

/// Persistence collaborator failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Rejected by server ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Route not found: {0}")]
    NotFound(String),

    #[error("Invalid route: {0}")]
    Invalid(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Capability set the route console consumes. Atomicity of the bulk
/// operations is up to the implementation.
#[async_trait]
pub trait RouteStore: Send + Sync {
    async fn list_routes(&self) -> Result<Vec<Route>, StoreError>;

    async fn create_routes(&self, routes: &[Route]) -> Result<(), StoreError>;

    async fn update_routes(&self, routes: &[Route]) -> Result<(), StoreError>;

    async fn delete_route(&self, id: &RouteId) -> Result<(), StoreError>;

    async fn delete_routes(&self, ids: &[RouteId]) -> Result<(), StoreError>;
}
