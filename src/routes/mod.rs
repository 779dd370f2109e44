pub mod commit;
pub mod console;
pub mod csv;
pub mod error;
pub mod model;
pub mod notice;
pub mod reconcile;
pub mod staging;
pub mod view;

pub use commit::{BatchCommitter, Committed};
pub use console::RouteConsole;
pub use error::{CommitError, ParseError, StateError};
pub use model::{ImportRow, Route, RouteId};
pub use notice::Notice;
pub use reconcile::{reconcile, DuplicateSet, Reconciliation, Resolution};
pub use staging::StagedEdits;
pub use view::SelectAllState;
