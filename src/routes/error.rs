use thiserror::Error;

use crate::client::StoreError;
use crate::routes::model::RouteId;
use crate::routes::reconcile::Resolution;
use crate::types::Operation;

/// CSV import failures; the whole import is aborted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Missing required column: {0}")]
    MissingRequiredColumn(String),

    #[error("File has no data rows")]
    EmptyFile,

    #[error("Malformed row at line {line}: {reason}")]
    MalformedRow { line: usize, reason: String },
}

/// Failures of a batch commit; local staged state is left untouched
#[derive(Error, Debug, Clone)]
pub enum CommitError {
    #[error("{operation} request failed: {source}")]
    Remote {
        operation: Operation,
        #[source]
        source: StoreError,
    },

    #[error("Another commit is already in flight")]
    Busy,
}

impl CommitError {
    pub fn remote(operation: Operation) -> impl FnOnce(StoreError) -> Self {
        move |source| CommitError::Remote { operation, source }
    }
}

/// Workflow steps that cannot apply to the current state. These are
/// reported as informational notices, not failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("No staged changes to submit")]
    NothingStaged,

    #[error("No duplicate routes awaiting a decision")]
    NothingPending,

    #[error("Duplicate routes were already {0:?}")]
    AlreadyResolved(Resolution),

    #[error("Duplicate routes from the previous import are still awaiting a decision")]
    ImportPending,

    #[error("Unknown route: {0}")]
    UnknownRoute(RouteId),

    #[error("No routes selected")]
    NothingSelected,

    #[error("Select-all is unavailable until a search narrows the list")]
    SelectAllDisabled,
}
