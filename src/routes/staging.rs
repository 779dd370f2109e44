use indexmap::IndexMap;

use super::model::{Route, RouteId};

/// In-memory overlay of route edits that have not been committed yet.
///
/// Holds at most one entry per route id; the latest `stage` for an id wins
/// and keeps the position of the first staging. The overlay is only cleared
/// after the persistence layer confirms a commit, or on explicit discard.
#[derive(Debug, Clone, Default)]
pub struct StagedEdits {
    edits: IndexMap<RouteId, Route>,
}

impl StagedEdits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the staged value for `route.id`
    pub fn stage(&mut self, route: Route) {
        tracing::debug!("Staging route {} (protected={})", route.id, route.protected);
        self.edits.insert(route.id.clone(), route);
    }

    /// Toggle the protected flag of every route matching `predicate`.
    ///
    /// All matching routes get the same value: `false` when every match is
    /// already protected, `true` otherwise. Returns the number of staged
    /// routes; no matches is a no-op.
    pub fn stage_bulk<P>(&mut self, routes: &[Route], predicate: P) -> usize
    where
        P: Fn(&Route) -> bool,
    {
        let matching: Vec<&Route> = routes.iter().filter(|route| predicate(route)).collect();
        if matching.is_empty() {
            return 0;
        }

        let target = !matching.iter().all(|route| route.protected);
        for route in &matching {
            self.stage(route.with_protected(target));
        }

        matching.len()
    }

    pub fn get(&self, id: &RouteId) -> Option<&Route> {
        self.edits.get(id)
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Staged values in insertion order. Does not clear; call `clear` once
    /// the commit is confirmed.
    pub fn commit(&self) -> Vec<Route> {
        self.edits.values().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.edits.clear();
    }

    /// Drop staged entries for routes that no longer exist
    pub fn forget<'a>(&mut self, ids: impl IntoIterator<Item = &'a RouteId>) {
        for id in ids {
            self.edits.shift_remove(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn route(id: &str, protected: bool) -> Route {
        Route::new(id, format!("route-{id}"), "2025-01-01", protected)
    }

    #[test]
    fn last_stage_wins() {
        let mut staged = StagedEdits::new();
        staged.stage(route("1", false));
        staged.stage(route("1", true));

        assert_eq!(staged.commit(), vec![route("1", true)]);
    }

    #[test]
    fn staging_twice_is_idempotent() {
        let mut once = StagedEdits::new();
        once.stage(route("1", true));

        let mut twice = StagedEdits::new();
        twice.stage(route("1", true));
        twice.stage(route("1", true));

        assert_eq!(once.commit(), twice.commit());
    }

    #[test]
    fn commit_keeps_insertion_order_and_is_repeatable() {
        let mut staged = StagedEdits::new();
        staged.stage(route("3", true));
        staged.stage(route("1", true));
        staged.stage(route("2", false));
        staged.stage(route("3", false));

        let first = staged.commit();
        let ids: Vec<_> = first.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["3", "1", "2"]);
        assert_eq!(staged.commit(), first);

        staged.clear();
        assert!(staged.is_empty());
        assert!(staged.commit().is_empty());
    }

    #[test]
    fn bulk_protects_when_any_match_is_unprotected() {
        let routes = vec![route("1", true), route("2", false), route("3", false)];
        let mut staged = StagedEdits::new();

        let count = staged.stage_bulk(&routes, |r| r.id.as_str() != "3");

        assert_eq!(count, 2);
        assert_eq!(staged.commit(), vec![route("1", true), route("2", true)]);
    }

    #[test]
    fn bulk_unprotects_when_all_matches_are_protected() {
        let routes = vec![route("1", true), route("2", true)];
        let mut staged = StagedEdits::new();

        staged.stage_bulk(&routes, |_| true);

        assert_eq!(staged.commit(), vec![route("1", false), route("2", false)]);
    }

    #[test]
    fn bulk_with_no_matches_is_noop() {
        let routes = vec![route("1", false)];
        let mut staged = StagedEdits::new();

        assert_eq!(staged.stage_bulk(&routes, |_| false), 0);
        assert!(staged.is_empty());
    }

    #[test]
    fn forget_preserves_remaining_order() {
        let mut staged = StagedEdits::new();
        staged.stage(route("1", true));
        staged.stage(route("2", true));
        staged.stage(route("3", true));

        staged.forget([&RouteId::from("2")]);

        let ids: Vec<_> = staged.commit().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![RouteId::from("1"), RouteId::from("3")]);
    }

    proptest! {
        #[test]
        fn holds_last_value_per_id(ops in proptest::collection::vec((0u8..4, any::<bool>()), 1..40)) {
            let mut staged = StagedEdits::new();
            for (id, protected) in &ops {
                staged.stage(route(&id.to_string(), *protected));
            }

            let distinct: std::collections::HashSet<_> = ops.iter().map(|(id, _)| *id).collect();
            prop_assert_eq!(staged.len(), distinct.len());

            for id in distinct {
                let last = ops.iter().rev().find(|(i, _)| *i == id).map(|(_, p)| *p);
                let held = staged.get(&RouteId::from(id.to_string())).map(|r| r.protected);
                prop_assert_eq!(held, last);
            }
        }
    }
}
