use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix marking ids synthesized on the client for CSV rows without an id.
/// Such ids are only unique within one import batch; the persistence layer
/// assigns the authoritative id on creation.
pub const PLACEHOLDER_PREFIX: &str = "local-";

/// Opaque route identifier, unique within a route set
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteId(String);

impl RouteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a client-side placeholder id
    pub fn placeholder() -> Self {
        Self(format!("{}{}", PLACEHOLDER_PREFIX, Uuid::new_v4().simple()))
    }

    pub fn is_placeholder(&self) -> bool {
        self.0.starts_with(PLACEHOLDER_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RouteId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RouteId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A managed path/endpoint resource with a protection flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub id: RouteId,
    pub name: String,
    /// ISO-8601 creation timestamp, kept as received
    pub created: String,
    #[serde(default)]
    pub protected: bool,
}

impl Route {
    pub fn new(id: impl Into<RouteId>, name: impl Into<String>, created: impl Into<String>, protected: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            created: created.into(),
            protected,
        }
    }

    /// Copy of this route with the protected flag set to `protected`
    pub fn with_protected(&self, protected: bool) -> Self {
        Self {
            protected,
            ..self.clone()
        }
    }
}

/// One validated data line from a CSV import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRow {
    /// 1-based line number in the source text
    pub line: usize,
    pub id: RouteId,
    /// True when `id` was synthesized because the row left it blank
    pub id_synthesized: bool,
    pub name: String,
    pub created: String,
    pub protected: bool,
}

impl ImportRow {
    pub fn to_route(&self) -> Route {
        Route {
            id: self.id.clone(),
            name: self.name.clone(),
            created: self.created.clone(),
            protected: self.protected,
        }
    }
}

/// Drop routes whose id was already seen, keeping the first occurrence
pub fn dedupe_by_id(routes: Vec<Route>) -> Vec<Route> {
    let mut seen = HashSet::with_capacity(routes.len());
    let mut unique = Vec::with_capacity(routes.len());

    for route in routes {
        if seen.insert(route.id.clone()) {
            unique.push(route);
        } else {
            tracing::warn!("Dropping route with duplicate id {} ({})", route.id, route.name);
        }
    }

    unique
}
