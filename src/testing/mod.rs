use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::client::{MemoryRouteStore, RouteStore, StoreError};
use crate::routes::model::{Route, RouteId};

/// Requests observed by a [`ScriptedStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List,
    Create(usize),
    Update(usize),
    DeleteOne,
    DeleteMany(usize),
}

/// Memory-backed route store that records every request and can be told to
/// fail or stall, for exercising commit and console workflows
#[derive(Default)]
pub struct ScriptedStore {
    inner: MemoryRouteStore,
    calls: Mutex<Vec<Call>>,
    fail_write: Mutex<Option<StoreError>>,
    fail_list: Mutex<Option<StoreError>>,
    hold: Mutex<Option<Arc<Notify>>>,
}

impl ScriptedStore {
    pub fn new(routes: Vec<Route>) -> Self {
        Self {
            inner: MemoryRouteStore::with_routes(routes),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub async fn snapshot(&self) -> Vec<Route> {
        self.inner.snapshot().await
    }

    /// Fail the next write request with `err`
    pub fn fail_next(&self, err: StoreError) {
        *self.fail_write.lock().unwrap() = Some(err);
    }

    /// Fail the next list request with `err`
    pub fn fail_list(&self, err: StoreError) {
        *self.fail_list.lock().unwrap() = Some(err);
    }

    /// Stall the next write until the returned handle is notified
    pub fn hold_writes(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.hold.lock().unwrap() = Some(notify.clone());
        notify
    }

    async fn before_write(&self, call: Call) -> Result<(), StoreError> {
        self.calls.lock().unwrap().push(call);

        let hold = self.hold.lock().unwrap().take();
        if let Some(notify) = hold {
            notify.notified().await;
        }

        match self.fail_write.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RouteStore for ScriptedStore {
    async fn list_routes(&self) -> Result<Vec<Route>, StoreError> {
        self.calls.lock().unwrap().push(Call::List);
        let failure = self.fail_list.lock().unwrap().take();
        match failure {
            Some(err) => Err(err),
            None => self.inner.list_routes().await,
        }
    }

    async fn create_routes(&self, routes: &[Route]) -> Result<(), StoreError> {
        self.before_write(Call::Create(routes.len())).await?;
        self.inner.create_routes(routes).await
    }

    async fn update_routes(&self, routes: &[Route]) -> Result<(), StoreError> {
        self.before_write(Call::Update(routes.len())).await?;
        self.inner.update_routes(routes).await
    }

    async fn delete_route(&self, id: &RouteId) -> Result<(), StoreError> {
        self.before_write(Call::DeleteOne).await?;
        self.inner.delete_route(id).await
    }

    async fn delete_routes(&self, ids: &[RouteId]) -> Result<(), StoreError> {
        self.before_write(Call::DeleteMany(ids.len())).await?;
        self.inner.delete_routes(ids).await
    }
}
