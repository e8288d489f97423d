//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure connection pragmas required by core behavior.
//! - Bring the task table to `SCHEMA_VERSION` before returning.
//!
//! # Invariants
//! - Returned connections have the configured busy timeout.
//! - Returned connections have the task table at the current schema version.

use super::schema::ensure_schema;
use super::{DbConfig, DbResult, SchemaOutcome};
use crate::model::field::SCHEMA_VERSION;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// A ready connection together with what schema bootstrap did to it.
#[derive(Debug)]
pub struct OpenedDb {
    pub conn: Connection,
    pub schema: SchemaOutcome,
}

/// Opens a SQLite database file and ensures the task table schema.
///
/// # Side effects
/// - May drop and recreate the task table (see `db::schema`).
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>, config: &DbConfig) -> DbResult<OpenedDb> {
    open_with("file", config, || Connection::open(path))
}

/// Opens an in-memory SQLite database and creates the task table.
pub fn open_db_in_memory(config: &DbConfig) -> DbResult<OpenedDb> {
    open_with("memory", config, Connection::open_in_memory)
}

fn open_with(
    mode: &str,
    config: &DbConfig,
    connect: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<OpenedDb> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let mut conn = match connect() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match bootstrap_connection(&mut conn, config) {
        Ok(schema) => {
            info!(
                "event=db_open module=db status=ok mode={mode} table={} duration_ms={}",
                config.table,
                started_at.elapsed().as_millis()
            );
            Ok(OpenedDb { conn, schema })
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(conn: &mut Connection, config: &DbConfig) -> DbResult<SchemaOutcome> {
    conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
    ensure_schema(conn, &config.table, SCHEMA_VERSION)
}
