use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use super::error::CommitError;
use super::model::{dedupe_by_id, Route, RouteId};
use super::staging::StagedEdits;
use crate::client::RouteStore;
use crate::types::Operation;

/// Result of a committed write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed {
    pub count: usize,
    /// Fresh authoritative list, or `None` when the follow-up refresh failed
    pub refreshed: Option<Vec<Route>>,
}

/// Sends staged edits, imports and deletes to the persistence collaborator.
///
/// Each submit issues exactly one write request. Clones share one in-flight
/// gate, so import and edit pipelines driven from different places can never
/// interleave: a submit started while another is running fails with
/// [`CommitError::Busy`].
#[derive(Clone)]
pub struct BatchCommitter {
    store: Arc<dyn RouteStore>,
    gate: Arc<Mutex<()>>,
}

impl BatchCommitter {
    pub fn new(store: Arc<dyn RouteStore>) -> Self {
        Self {
            store,
            gate: Arc::new(Mutex::new(())),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.gate.try_lock().is_err()
    }

    fn acquire(&self) -> Result<MutexGuard<'_, ()>, CommitError> {
        self.gate.try_lock().map_err(|_| CommitError::Busy)
    }

    /// Fetch the authoritative route list
    pub async fn refresh(&self) -> Result<Vec<Route>, CommitError> {
        let routes = self
            .store
            .list_routes()
            .await
            .map_err(CommitError::remote(Operation::List))?;
        Ok(dedupe_by_id(routes))
    }

    /// Persist every staged edit as one bulk update, clearing the tracker
    /// only once the update is confirmed. Returns the number of routes sent.
    pub async fn submit_edits(&self, staged: &mut StagedEdits) -> Result<usize, CommitError> {
        let _gate = self.acquire()?;

        let edits = staged.commit();
        if edits.is_empty() {
            return Ok(0);
        }

        self.store.update_routes(&edits).await.map_err(|e| {
            tracing::warn!("Submitting {} staged edits failed: {}", edits.len(), e);
            CommitError::remote(Operation::Update)(e)
        })?;

        staged.clear();
        tracing::info!("Committed {} staged edits", edits.len());
        Ok(edits.len())
    }

    /// Create imported routes, then refresh the authoritative list
    pub async fn submit_import(&self, routes: &[Route]) -> Result<Committed, CommitError> {
        let _gate = self.acquire()?;

        self.store
            .create_routes(routes)
            .await
            .map_err(CommitError::remote(Operation::Create))?;

        tracing::info!("Imported {} routes", routes.len());
        Ok(self.committed(routes.len()).await)
    }

    /// Overwrite existing routes with replacement values, then refresh
    pub async fn submit_replacements(&self, routes: &[Route]) -> Result<Committed, CommitError> {
        let _gate = self.acquire()?;

        self.store
            .update_routes(routes)
            .await
            .map_err(CommitError::remote(Operation::Update))?;

        tracing::info!("Replaced {} routes", routes.len());
        Ok(self.committed(routes.len()).await)
    }

    /// Delete routes in one request, then refresh
    pub async fn submit_delete(&self, ids: &[RouteId]) -> Result<Committed, CommitError> {
        let _gate = self.acquire()?;

        let result = match ids {
            [id] => self.store.delete_route(id).await,
            _ => self.store.delete_routes(ids).await,
        };
        result.map_err(CommitError::remote(Operation::Delete))?;

        tracing::info!("Deleted {} routes", ids.len());
        Ok(self.committed(ids.len()).await)
    }

    async fn committed(&self, count: usize) -> Committed {
        let refreshed = match self.refresh().await {
            Ok(routes) => Some(routes),
            Err(e) => {
                tracing::warn!("Write committed but refreshing routes failed: {}", e);
                None
            }
        };
        Committed { count, refreshed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::StoreError;
    use crate::testing::{Call, ScriptedStore};

    fn route(id: &str, protected: bool) -> Route {
        Route::new(id, format!("route-{id}"), "2025-01-01", protected)
    }

    #[tokio::test]
    async fn edits_are_sent_as_one_update_and_cleared() {
        let store = Arc::new(ScriptedStore::new(vec![route("1", false), route("2", false)]));
        let committer = BatchCommitter::new(store.clone());

        let mut staged = StagedEdits::new();
        staged.stage(route("1", true));
        staged.stage(route("2", true));

        assert_eq!(committer.submit_edits(&mut staged).await.unwrap(), 2);
        assert!(staged.is_empty());
        assert_eq!(store.calls(), vec![Call::Update(2)]);
    }

    #[tokio::test]
    async fn rejected_edits_stay_staged() {
        let store = Arc::new(ScriptedStore::new(vec![route("1", false)]));
        store.fail_next(StoreError::Rejected {
            status: 500,
            message: "boom".to_string(),
        });
        let committer = BatchCommitter::new(store.clone());

        let mut staged = StagedEdits::new();
        staged.stage(route("1", true));
        let before = staged.commit();

        let err = committer.submit_edits(&mut staged).await.unwrap_err();

        assert!(matches!(err, CommitError::Remote { operation: Operation::Update, .. }));
        assert_eq!(staged.commit(), before);
    }

    #[tokio::test]
    async fn empty_staging_sends_nothing() {
        let store = Arc::new(ScriptedStore::new(vec![]));
        let committer = BatchCommitter::new(store.clone());

        assert_eq!(committer.submit_edits(&mut StagedEdits::new()).await.unwrap(), 0);
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn delete_uses_single_or_bulk_request() {
        let store = Arc::new(ScriptedStore::new(vec![route("1", false), route("2", false), route("3", false)]));
        let committer = BatchCommitter::new(store.clone());

        committer.submit_delete(&[RouteId::from("1")]).await.unwrap();
        let done = committer
            .submit_delete(&[RouteId::from("2"), RouteId::from("3")])
            .await
            .unwrap();

        assert_eq!(done.count, 2);
        assert_eq!(done.refreshed, Some(vec![]));
        assert_eq!(
            store.calls(),
            vec![Call::DeleteOne, Call::List, Call::DeleteMany(2), Call::List]
        );
    }

    #[tokio::test]
    async fn failed_refresh_does_not_fail_the_import() {
        let store = Arc::new(ScriptedStore::new(vec![]));
        let committer = BatchCommitter::new(store.clone());
        store.fail_list(StoreError::Timeout("slow".to_string()));

        let done = committer.submit_import(&[route("1", false)]).await.unwrap();

        assert_eq!(done.count, 1);
        assert_eq!(done.refreshed, None);
    }

    #[tokio::test]
    async fn concurrent_submit_is_refused() {
        let store = Arc::new(ScriptedStore::new(vec![route("1", false)]));
        let release = store.hold_writes();
        let committer = BatchCommitter::new(store.clone());

        let first = {
            let committer = committer.clone();
            tokio::spawn(async move { committer.submit_import(&[route("9", false)]).await })
        };

        while !committer.is_busy() {
            tokio::task::yield_now().await;
        }

        let mut staged = StagedEdits::new();
        staged.stage(route("1", true));
        let err = committer.submit_edits(&mut staged).await.unwrap_err();
        assert!(matches!(err, CommitError::Busy));
        assert_eq!(staged.len(), 1);

        release.notify_one();
        assert_eq!(first.await.unwrap().unwrap().count, 1);
        assert!(!committer.is_busy());
    }
}
