use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;

use super::error::StateError;
use super::model::{ImportRow, Route, RouteId};

/// Import rows split by name collision against the existing routes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub unique: Vec<ImportRow>,
    pub duplicates: Vec<ImportRow>,
}

/// Partition `incoming` into rows with a fresh name and rows whose name
/// (exact, case-sensitive) is already used by an existing route.
/// Both halves keep the order of `incoming`.
pub fn reconcile(existing: &[Route], incoming: Vec<ImportRow>) -> Reconciliation {
    let names: HashSet<&str> = existing.iter().map(|route| route.name.as_str()).collect();

    let (duplicates, unique): (Vec<_>, Vec<_>) = incoming
        .into_iter()
        .partition(|row| names.contains(row.name.as_str()));

    Reconciliation { unique, duplicates }
}

/// Decision state of a duplicate set. `Replaced` and `Discarded` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Pending,
    Replaced,
    Discarded,
}

/// Import rows colliding with existing routes, held until the user decides
/// to replace or skip all of them at once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateSet {
    rows: Vec<ImportRow>,
    state: Resolution,
}

impl DuplicateSet {
    pub fn new(rows: Vec<ImportRow>) -> Self {
        Self {
            rows,
            state: Resolution::Pending,
        }
    }

    pub fn rows(&self) -> &[ImportRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn state(&self) -> Resolution {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        self.state == Resolution::Pending
    }

    /// Updates that overwrite every existing route sharing a row's name.
    /// All fields come from the row except `id`, which is kept from the
    /// existing route. Several rows naming the same route collapse into one
    /// update carrying the last row's values.
    pub fn replacements(&self, existing: &[Route]) -> Vec<Route> {
        let mut updates: IndexMap<RouteId, Route> = IndexMap::new();
        for row in &self.rows {
            for route in existing.iter().filter(|route| route.name == row.name) {
                updates.insert(
                    route.id.clone(),
                    Route {
                        id: route.id.clone(),
                        ..row.to_route()
                    },
                );
            }
        }
        updates.into_values().collect()
    }

    pub fn mark_replaced(&mut self) -> Result<(), StateError> {
        self.resolve(Resolution::Replaced)
    }

    pub fn discard(&mut self) -> Result<(), StateError> {
        self.resolve(Resolution::Discarded)
    }

    fn resolve(&mut self, to: Resolution) -> Result<(), StateError> {
        if !self.is_pending() {
            return Err(StateError::AlreadyResolved(self.state));
        }
        tracing::debug!("Duplicate set of {} rows resolved as {:?}", self.rows.len(), to);
        self.state = to;
        Ok(())
    }
}
