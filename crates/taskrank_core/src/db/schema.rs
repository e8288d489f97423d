//! Task table creation and schema upgrade policy.
//!
//! # Responsibility
//! - Create the task table from the ordered field schema.
//! - Decide how an older persisted schema version is brought forward.
//!
//! # Invariants
//! - The table always has `_id INTEGER PRIMARY KEY AUTOINCREMENT` followed by
//!   the schema columns in order.
//! - An upgrade with no registered path drops and recreates the table. This
//!   loses every stored task, so it is always logged at warn level and
//!   returned to the caller as `SchemaOutcome::Recreated`.
//! - Table creation and upgrade run inside one transaction with the
//!   `user_version` update.

use crate::db::{DbError, DbResult};
use crate::model::field::{schema_fields, SCHEMA_VERSION};
use log::{info, warn};
use rusqlite::Connection;
use serde::Serialize;

/// Table used when the host does not configure one.
pub const DEFAULT_TABLE_NAME: &str = "tasks";

/// Primary-key column synthesized in front of the schema fields.
pub const ROW_ID_COLUMN: &str = "_id";

/// Observable data-loss event from the fallback upgrade path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DestructiveMigrationWarning {
    pub table: String,
    pub old_version: u32,
    pub new_version: u32,
}

/// Result of bringing a table to the requested schema version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum SchemaOutcome {
    /// Table was created on a database with no recorded version.
    Created { version: u32 },
    /// Stored version already matched.
    UpToDate { version: u32 },
    /// Registered upgrade steps were applied; rows were kept.
    Upgraded { old_version: u32, new_version: u32 },
    /// No upgrade path existed; the table was dropped and recreated empty.
    Recreated(DestructiveMigrationWarning),
}

impl SchemaOutcome {
    pub fn destructive_warning(&self) -> Option<&DestructiveMigrationWarning> {
        match self {
            Self::Recreated(warning) => Some(warning),
            _ => None,
        }
    }
}

/// One non-destructive upgrade step between adjacent versions.
struct UpgradeStep {
    from: u32,
    to: u32,
    apply: fn(&Connection, &str) -> rusqlite::Result<()>,
}

// No step is registered for version 1; every older table takes the
// destructive fallback.
const UPGRADE_STEPS: &[UpgradeStep] = &[];

/// Creates or upgrades `table` so it matches schema `version`.
///
/// # Errors
/// - `InvalidTableName` when `table` is not a plain SQL identifier.
/// - `UnsupportedSchemaVersion` when the database is newer than `version`.
/// - `Sqlite` when DDL fails.
pub fn ensure_schema(conn: &mut Connection, table: &str, version: u32) -> DbResult<SchemaOutcome> {
    validate_table_name(table)?;
    let stored = current_user_version(conn)?;

    if stored > version {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: stored,
            latest_supported: version,
        });
    }

    if stored != 0 && stored < version {
        return upgrade_schema(conn, table, stored, version);
    }

    let tx = conn.transaction()?;
    tx.execute_batch(&create_table_sql(table))?;
    tx.execute_batch(&format!("PRAGMA user_version = {version};"))?;
    tx.commit()?;

    if stored == 0 {
        info!("event=schema_create module=db status=ok table={table} version={version}");
        Ok(SchemaOutcome::Created { version })
    } else {
        Ok(SchemaOutcome::UpToDate { version })
    }
}

/// Upgrades `table` from `old_version` to `new_version`.
///
/// Falls back to drop-and-recreate when no chain of registered steps covers
/// the range.
pub fn upgrade_schema(
    conn: &mut Connection,
    table: &str,
    old_version: u32,
    new_version: u32,
) -> DbResult<SchemaOutcome> {
    validate_table_name(table)?;
    warn!(
        "event=schema_upgrade module=db status=start table={table} old_version={old_version} new_version={new_version}"
    );

    let tx = conn.transaction()?;
    let outcome = match plan_upgrade(old_version, new_version) {
        Some(steps) => {
            for step in steps {
                (step.apply)(&tx, table)?;
            }
            SchemaOutcome::Upgraded {
                old_version,
                new_version,
            }
        }
        None => {
            tx.execute_batch(&format!("DROP TABLE IF EXISTS \"{table}\";"))?;
            tx.execute_batch(&create_table_sql(table))?;
            SchemaOutcome::Recreated(DestructiveMigrationWarning {
                table: table.to_string(),
                old_version,
                new_version,
            })
        }
    };
    tx.execute_batch(&format!("PRAGMA user_version = {new_version};"))?;
    tx.commit()?;

    if outcome.destructive_warning().is_some() {
        warn!(
            "event=schema_upgrade module=db status=destructive table={table} old_version={old_version} new_version={new_version} error_code=unsupported_migration_table_dropped"
        );
    } else {
        info!(
            "event=schema_upgrade module=db status=ok table={table} old_version={old_version} new_version={new_version}"
        );
    }

    Ok(outcome)
}

/// Returns the schema version this build creates.
pub fn latest_version() -> u32 {
    SCHEMA_VERSION
}

/// Reads the version recorded in `PRAGMA user_version`.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Builds the `CREATE TABLE IF NOT EXISTS` statement for the field schema.
pub fn create_table_sql(table: &str) -> String {
    let mut columns = vec![format!("{ROW_ID_COLUMN} INTEGER PRIMARY KEY AUTOINCREMENT")];
    columns.extend(schema_fields().into_iter().map(|spec| {
        let constraint = if spec.nullable { "" } else { " NOT NULL" };
        format!(
            "\"{}\" {}{}",
            spec.field.column(),
            spec.storage_type.sql_type(),
            constraint
        )
    }));
    format!(
        "CREATE TABLE IF NOT EXISTS \"{table}\" (\n    {}\n);",
        columns.join(",\n    ")
    )
}

/// Accepts plain identifiers only, since table names are spliced into SQL.
pub fn validate_table_name(table: &str) -> DbResult<()> {
    let mut chars = table.chars();
    let valid_head = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if valid_head && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(DbError::InvalidTableName(table.to_string()))
    }
}

fn plan_upgrade(old_version: u32, new_version: u32) -> Option<Vec<&'static UpgradeStep>> {
    let mut steps = Vec::new();
    let mut version = old_version;
    while version < new_version {
        let step = UPGRADE_STEPS.iter().find(|step| step.from == version)?;
        steps.push(step);
        version = step.to;
    }
    (version == new_version).then_some(steps)
}
