use serde::Serialize;

use super::model::Route;
use super::staging::StagedEdits;

/// Authoritative routes with staged edits laid over them
pub fn merge(routes: &[Route], staged: &StagedEdits) -> Vec<Route> {
    routes
        .iter()
        .map(|route| staged.get(&route.id).unwrap_or(route).clone())
        .collect()
}

/// Case-insensitive substring match on the route name; empty term matches all
pub fn matches(route: &Route, term: &str) -> bool {
    term.is_empty() || route.name.to_lowercase().contains(&term.to_lowercase())
}

pub fn filtered(routes: &[Route], term: &str) -> Vec<Route> {
    routes.iter().filter(|route| matches(route, term)).cloned().collect()
}

/// Routes on 1-based `page` after filtering by `term`.
///
/// Pure slice of `[(page-1)*page_size, page*page_size)`; callers clamp the
/// page with [`clamp_page`] first.
pub fn visible(routes: &[Route], term: &str, page: usize, page_size: usize) -> Vec<Route> {
    let start = page.saturating_sub(1).saturating_mul(page_size);

    routes
        .iter()
        .filter(|route| matches(route, term))
        .skip(start)
        .take(page_size)
        .cloned()
        .collect()
}

pub fn page_count(filtered_count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    filtered_count.div_ceil(page_size)
}

/// Clamp `page` into `[1, page_count]`, treating an empty result as one page
pub fn clamp_page(page: usize, filtered_count: usize, page_size: usize) -> usize {
    page.clamp(1, page_count(filtered_count, page_size).max(1))
}

/// Derived state of the "select all protected" control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SelectAllState {
    /// Every filtered route is protected (false for an empty filter result)
    pub checked: bool,
    /// Some, but not all, filtered routes are protected
    pub indeterminate: bool,
    /// The filter does not narrow the list.
    /// NOTE: kept as the existing console behaves; looks inverted.
    pub disabled: bool,
}

pub fn select_all_state(routes: &[Route], term: &str) -> SelectAllState {
    let matching: Vec<&Route> = routes.iter().filter(|route| matches(route, term)).collect();
    let protected = matching.iter().filter(|route| route.protected).count();

    SelectAllState {
        checked: !matching.is_empty() && protected == matching.len(),
        indeterminate: protected > 0 && protected < matching.len(),
        disabled: matching.len() == routes.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn routes(count: usize) -> Vec<Route> {
        (1..=count)
            .map(|i| Route::new(i.to_string(), format!("route-{i}"), "2025-01-01", false))
            .collect()
    }

    #[test]
    fn first_page_of_matches() {
        let all = routes(7);
        let page = visible(&all, "rou", 1, 5);

        let names: Vec<_> = page.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["route-1", "route-2", "route-3", "route-4", "route-5"]);
    }

    #[test]
    fn last_page_is_partial() {
        let all = routes(7);
        let page = visible(&all, "", 2, 5);

        let names: Vec<_> = page.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["route-6", "route-7"]);
        assert!(visible(&all, "", 3, 5).is_empty());
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let mut all = routes(3);
        all[1].name = "Admin-Panel".to_string();

        let page = visible(&all, "PANEL", 1, 10);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id.as_str(), "2");
    }

    #[test]
    fn page_clamping() {
        assert_eq!(page_count(7, 5), 2);
        assert_eq!(page_count(0, 5), 0);
        assert_eq!(clamp_page(9, 7, 5), 2);
        assert_eq!(clamp_page(0, 7, 5), 1);
        assert_eq!(clamp_page(3, 0, 5), 1);
    }

    #[test]
    fn merge_overlays_staged_values() {
        let all = routes(3);
        let mut staged = StagedEdits::new();
        staged.stage(all[1].with_protected(true));

        let merged = merge(&all, &staged);

        assert!(!merged[0].protected);
        assert!(merged[1].protected);
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn select_all_state_is_derived() {
        let mut all = routes(4);
        all[0].protected = true;
        all[1].protected = true;

        let narrowed = select_all_state(&all, "route-1");
        assert!(narrowed.checked);
        assert!(!narrowed.indeterminate);
        assert!(!narrowed.disabled);

        let everything = select_all_state(&all, "");
        assert!(!everything.checked);
        assert!(everything.indeterminate);
        assert!(everything.disabled);

        let nothing = select_all_state(&all, "zzz");
        assert!(!nothing.checked);
        assert!(!nothing.indeterminate);
    }
}
