//! Core record storage and list service for the to-do app.
//!
//! The presentation layer talks to [`ListService`]; everything below it is
//! reachable for tests and tooling.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::category::{Category, CategoryId};
pub use model::item::{Item, ItemId};
pub use model::validation::ValidationError;
pub use repo::record_store::{
    ItemListQuery, RecordStore, SqliteRecordStore, StoreError, StoreResult,
};
pub use service::list_service::{ListService, RelationshipDemo};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
