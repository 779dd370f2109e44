use std::sync::Arc;

use super::commit::{BatchCommitter, Committed};
use super::csv;
use super::error::StateError;
use super::model::{ImportRow, Route, RouteId};
use super::notice::Notice;
use super::reconcile::{reconcile, DuplicateSet, Reconciliation};
use super::staging::StagedEdits;
use super::view::{self, SelectAllState};
use crate::client::RouteStore;
use crate::routes::error::CommitError;

/// Route management workflow for one console session.
///
/// Owns the authoritative route list, the staged-edit overlay, any duplicate
/// rows awaiting a decision and the search/page window. Every workflow step
/// returns a [`Notice`] for the UI.
pub struct RouteConsole {
    committer: BatchCommitter,
    routes: Vec<Route>,
    staged: StagedEdits,
    pending: Option<DuplicateSet>,
    search: String,
    page: usize,
    page_size: usize,
}

impl RouteConsole {
    pub fn new(store: Arc<dyn RouteStore>, page_size: usize) -> Self {
        Self::with_committer(BatchCommitter::new(store), page_size)
    }

    pub fn with_committer(committer: BatchCommitter, page_size: usize) -> Self {
        Self {
            committer,
            routes: Vec::new(),
            staged: StagedEdits::new(),
            pending: None,
            search: String::new(),
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn committer(&self) -> &BatchCommitter {
        &self.committer
    }

    /// Reload the authoritative list. Staged edits are kept.
    pub async fn refresh(&mut self) -> Result<(), CommitError> {
        self.routes = self.committer.refresh().await?;
        self.clamp_page();
        tracing::debug!("Loaded {} routes", self.routes.len());
        Ok(())
    }

    /// Routes as last confirmed by the persistence layer
    pub fn authoritative(&self) -> &[Route] {
        &self.routes
    }

    /// Authoritative routes with staged edits applied
    pub fn routes(&self) -> Vec<Route> {
        view::merge(&self.routes, &self.staged)
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Change the search term and go back to the first page
    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into().trim().to_string();
        self.page = 1;
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_count(&self) -> usize {
        view::page_count(self.filtered_count(), self.page_size)
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page;
        self.clamp_page();
    }

    pub fn visible(&self) -> Vec<Route> {
        view::visible(&self.routes(), &self.search, self.page, self.page_size)
    }

    pub fn filtered_count(&self) -> usize {
        self.routes
            .iter()
            .filter(|route| view::matches(route, &self.search))
            .count()
    }

    pub fn select_all_state(&self) -> SelectAllState {
        view::select_all_state(&self.routes(), &self.search)
    }

    pub fn staged(&self) -> &StagedEdits {
        &self.staged
    }

    pub fn pending_duplicates(&self) -> Option<&DuplicateSet> {
        self.pending.as_ref()
    }

    /// Flip the protected flag of one route in the staging overlay
    pub fn toggle_protected(&mut self, id: &RouteId) -> Result<Route, StateError> {
        let current = self.current(id)?;
        self.set_protected(id, !current.protected)
    }

    pub fn set_protected(&mut self, id: &RouteId, protected: bool) -> Result<Route, StateError> {
        let edited = self.current(id)?.with_protected(protected);
        self.staged.stage(edited.clone());
        Ok(edited)
    }

    /// Select-all toggle over every route matching the current search.
    /// Returns the number of staged routes.
    pub fn toggle_all_filtered(&mut self) -> Result<usize, StateError> {
        let merged = self.routes();
        if view::select_all_state(&merged, &self.search).disabled {
            return Err(StateError::SelectAllDisabled);
        }

        let term = self.search.clone();
        Ok(self.staged.stage_bulk(&merged, |route| view::matches(route, &term)))
    }

    /// Commit the staged overlay as one bulk update
    pub async fn submit_changes(&mut self) -> Notice {
        if self.staged.is_empty() {
            return StateError::NothingStaged.into();
        }

        let edits = self.staged.commit();
        match self.committer.submit_edits(&mut self.staged).await {
            Ok(count) => {
                self.absorb(edits);
                Notice::CommitSucceeded { count }
            }
            Err(e) => e.into(),
        }
    }

    pub fn discard_changes(&mut self) -> Notice {
        let count = self.staged.len();
        self.staged.clear();
        Notice::Info {
            message: format!("Discarded {} staged changes", count),
        }
    }

    /// Parse, reconcile and create routes from CSV text.
    ///
    /// Rows with a new name are created at once. Rows colliding with an
    /// existing name are held until [`replace_duplicates`] or
    /// [`skip_duplicates`]; another import is refused until then.
    ///
    /// [`replace_duplicates`]: RouteConsole::replace_duplicates
    /// [`skip_duplicates`]: RouteConsole::skip_duplicates
    pub async fn import_csv(&mut self, text: &str) -> Notice {
        if self.pending.is_some() {
            return Notice::ValidationFailed {
                reason: StateError::ImportPending.to_string(),
            };
        }

        let rows = match csv::parse(text) {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!("Import rejected: {}", e);
                return e.into();
            }
        };

        let Reconciliation { unique, duplicates } = reconcile(&self.routes, rows);
        tracing::debug!("Import reconciled: {} unique, {} duplicates", unique.len(), duplicates.len());

        if !unique.is_empty() {
            let creates: Vec<Route> = unique.iter().map(ImportRow::to_route).collect();
            match self.committer.submit_import(&creates).await {
                Ok(committed) => {
                    // keep the names known so a re-import still collides
                    if committed.refreshed.is_none() {
                        self.routes.extend(creates);
                    }
                    self.apply(committed)
                }
                Err(e) => return e.into(),
            }
        }

        if duplicates.is_empty() {
            return Notice::ImportSucceeded { count: unique.len() };
        }

        let notice = Notice::ImportPartial {
            unique: unique.len(),
            duplicates: duplicates.len(),
        };
        self.pending = Some(DuplicateSet::new(duplicates));
        notice
    }

    /// Overwrite the existing routes named by the pending duplicates
    pub async fn replace_duplicates(&mut self) -> Notice {
        let Some(set) = self.pending.as_ref() else {
            return StateError::NothingPending.into();
        };

        let updates = set.replacements(&self.routes);
        if !updates.is_empty() {
            match self.committer.submit_replacements(&updates).await {
                Ok(committed) => {
                    if committed.refreshed.is_none() {
                        self.absorb(updates.clone());
                    }
                    self.apply(committed)
                }
                Err(e) => return e.into(),
            }
            // the replacement is newer than anything staged for these routes
            self.staged.forget(updates.iter().map(|route| &route.id));
        }

        if let Some(mut set) = self.pending.take() {
            if let Err(e) = set.mark_replaced() {
                return e.into();
            }
        }

        Notice::CommitSucceeded { count: updates.len() }
    }

    /// Drop the pending duplicates without touching the persistence layer
    pub fn skip_duplicates(&mut self) -> Notice {
        let Some(mut set) = self.pending.take() else {
            return StateError::NothingPending.into();
        };

        match set.discard() {
            Ok(()) => Notice::Info {
                message: format!("Skipped {} duplicate routes", set.len()),
            },
            Err(e) => e.into(),
        }
    }

    pub async fn delete(&mut self, ids: &[RouteId]) -> Notice {
        if ids.is_empty() {
            return StateError::NothingSelected.into();
        }

        match self.committer.submit_delete(ids).await {
            Ok(committed) => {
                if committed.refreshed.is_none() {
                    self.routes.retain(|route| !ids.contains(&route.id));
                }
                self.staged.forget(ids);
                let count = committed.count;
                self.apply(committed);
                Notice::CommitSucceeded { count }
            }
            Err(e) => e.into(),
        }
    }

    fn current(&self, id: &RouteId) -> Result<Route, StateError> {
        if let Some(staged) = self.staged.get(id) {
            return Ok(staged.clone());
        }
        self.routes
            .iter()
            .find(|route| &route.id == id)
            .cloned()
            .ok_or_else(|| StateError::UnknownRoute(id.clone()))
    }

    fn apply(&mut self, committed: Committed) {
        if let Some(routes) = committed.refreshed {
            self.routes = routes;
        }
        self.clamp_page();
    }

    /// Fold confirmed edits into the local authoritative copy
    fn absorb(&mut self, edits: Vec<Route>) {
        for edit in edits {
            if let Some(route) = self.routes.iter_mut().find(|route| route.id == edit.id) {
                *route = edit;
            }
        }
    }

    fn clamp_page(&mut self) {
        self.page = view::clamp_page(self.page, self.filtered_count(), self.page_size);
    }
}
