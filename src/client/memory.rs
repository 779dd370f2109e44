use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{RouteStore, StoreError};
use crate::routes::model::{Route, RouteId};

/// In-process route store backing the reference API and tests.
///
/// Bulk updates and deletes validate every id before touching anything, so a
/// rejected batch leaves the store unchanged.
#[derive(Debug, Default)]
pub struct MemoryRouteStore {
    routes: RwLock<Vec<Route>>,
}

impl MemoryRouteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_routes(routes: Vec<Route>) -> Self {
        Self {
            routes: RwLock::new(routes),
        }
    }

    pub async fn len(&self) -> usize {
        self.routes.read().await.len()
    }

    pub async fn snapshot(&self) -> Vec<Route> {
        self.routes.read().await.clone()
    }

    fn validate_name(route: &Route) -> Result<(), StoreError> {
        if route.name.trim().is_empty() {
            return Err(StoreError::Invalid(format!("route {} has an empty name", route.id)));
        }
        Ok(())
    }
}

#[async_trait]
impl RouteStore for MemoryRouteStore {
    async fn list_routes(&self) -> Result<Vec<Route>, StoreError> {
        Ok(self.snapshot().await)
    }

    async fn create_routes(&self, routes: &[Route]) -> Result<(), StoreError> {
        for route in routes {
            Self::validate_name(route)?;
        }

        let mut stored = self.routes.write().await;
        let mut taken: HashSet<RouteId> = stored.iter().map(|r| r.id.clone()).collect();

        for route in routes {
            let mut created = route.clone();

            if created.id.as_str().is_empty() || created.id.is_placeholder() || taken.contains(&created.id) {
                created.id = RouteId::new(Uuid::new_v4().to_string());
            }
            if created.created.is_empty() {
                created.created = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
            }

            taken.insert(created.id.clone());
            stored.push(created);
        }

        tracing::debug!("Created {} routes", routes.len());
        Ok(())
    }

    async fn update_routes(&self, routes: &[Route]) -> Result<(), StoreError> {
        let mut stored = self.routes.write().await;

        let mut positions = Vec::with_capacity(routes.len());
        for route in routes {
            Self::validate_name(route)?;
            let index = stored
                .iter()
                .position(|r| r.id == route.id)
                .ok_or_else(|| StoreError::NotFound(route.id.to_string()))?;
            positions.push(index);
        }

        for (index, route) in positions.into_iter().zip(routes) {
            stored[index] = route.clone();
        }

        tracing::debug!("Updated {} routes", routes.len());
        Ok(())
    }

    async fn delete_route(&self, id: &RouteId) -> Result<(), StoreError> {
        self.delete_routes(std::slice::from_ref(id)).await
    }

    async fn delete_routes(&self, ids: &[RouteId]) -> Result<(), StoreError> {
        let mut stored = self.routes.write().await;

        if let Some(missing) = ids.iter().find(|id| !stored.iter().any(|r| &r.id == *id)) {
            return Err(StoreError::NotFound(missing.to_string()));
        }

        let doomed: HashSet<&RouteId> = ids.iter().collect();
        stored.retain(|route| !doomed.contains(&route.id));

        tracing::debug!("Deleted {} routes", ids.len());
        Ok(())
    }
}
