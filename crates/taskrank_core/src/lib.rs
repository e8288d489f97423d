//! Core task model for taskrank.
//! Persisted task records over a versioned SQLite table, plus the weighting
//! engine that orders task lists.

pub mod db;
pub mod logging;
pub mod model;
pub mod ranking;
pub mod repo;
pub mod service;

pub use db::{
    open_db, open_db_in_memory, DbConfig, DbError, DbResult, DestructiveMigrationWarning,
    OpenedDb, SchemaOutcome,
};
pub use logging::{init_logging, logging_status, LogLevel};
pub use model::field::{fields, Field, FieldMap, FieldValue, TaskField, SCHEMA_VERSION};
pub use model::importance::{Importance, TaskColorClass};
pub use model::task::{RecordError, RecordResult, RecordState, TaskId, TaskRecord};
pub use ranking::{rank_and_filter, rank_and_filter_at, weight_at};
pub use repo::task_store::{RawRow, RepoError, RepoResult, SqliteTaskStore, TaskStore};
pub use service::task_service::TaskService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
