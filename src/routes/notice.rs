use std::fmt;

use serde::Serialize;

use super::error::{CommitError, ParseError, StateError};

/// Outcome of a console workflow step, rendered by the UI as a notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    ImportSucceeded { count: usize },
    ImportPartial { unique: usize, duplicates: usize },
    CommitSucceeded { count: usize },
    CommitFailed { reason: String },
    ValidationFailed { reason: String },
    Info { message: String },
}

impl Notice {
    pub fn is_failure(&self) -> bool {
        matches!(self, Notice::CommitFailed { .. } | Notice::ValidationFailed { .. })
    }
}

impl From<ParseError> for Notice {
    fn from(err: ParseError) -> Self {
        Notice::ValidationFailed { reason: err.to_string() }
    }
}

impl From<CommitError> for Notice {
    fn from(err: CommitError) -> Self {
        Notice::CommitFailed { reason: err.to_string() }
    }
}

impl From<StateError> for Notice {
    fn from(err: StateError) -> Self {
        Notice::Info { message: err.to_string() }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::ImportSucceeded { count } => write!(f, "Imported {} routes", count),
            Notice::ImportPartial { unique, duplicates } => write!(
                f,
                "Imported {} routes; {} duplicates await a replace or skip decision",
                unique, duplicates
            ),
            Notice::CommitSucceeded { count } => write!(f, "Committed {} routes", count),
            Notice::CommitFailed { reason } => write!(f, "Commit failed: {}", reason),
            Notice::ValidationFailed { reason } => write!(f, "Validation failed: {}", reason),
            Notice::Info { message } => f.write_str(message),
        }
    }
}
