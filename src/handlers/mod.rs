pub mod routes;

pub use routes::{bulk_create, bulk_delete, bulk_update, delete_one, list};
