//! Core data access for rowbase.
//! A generic per-table record store over one shared SQLite connection,
//! plus the `users` schema and use-cases built on it.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::row::Row;
pub use model::user::{User, UserColumn, UserId, Users};
pub use repo::record_store::{RecordStore, StoreError, StoreResult};
pub use repo::shape::{AnyShape, ColumnName, FromRow, Ident, Payload, Shape, Table};
pub use service::user_service::{
    UserDraft, UserService, UserServiceError, UserServiceResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
