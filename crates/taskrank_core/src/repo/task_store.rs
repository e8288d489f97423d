//! Task row store contract and SQLite implementation.
//!
//! # Responsibility
//! - Read task rows into untyped field maps, by id or from a row handle.
//! - Insert or update rows from field maps and report the effective id.
//!
//! # Invariants
//! - Rows are keyed by the synthetic `_id` column.
//! - Missing rows surface as `RepoError::NotFound`, never as empty records.
//! - Inserts fill every column the caller omitted with its schema default.
//! - Reads reject values whose storage class the schema cannot hold.

use crate::db::schema::{validate_table_name, ROW_ID_COLUMN};
use crate::db::DbError;
use crate::model::field::{FieldMap, FieldValue, TaskField};
use crate::model::task::{RecordError, TaskId};
use rusqlite::types::{Value, ValueRef};
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for task persistence operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(TaskId),
    Record(RecordError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::Record(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Record(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<RecordError> for RepoError {
    fn from(value: RecordError) -> Self {
        Self::Record(value)
    }
}

/// One stored row: its id plus the raw values of the columns it carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub id: TaskId,
    pub fields: FieldMap,
}

/// Row-level persistence contract used by task records.
pub trait TaskStore {
    /// Reads one row by id.
    fn load_row(&self, id: TaskId) -> RepoResult<RawRow>;
    /// Inserts (`id == None`) or updates the given fields; returns the row id.
    fn write_row(&self, id: Option<TaskId>, fields: &FieldMap) -> RepoResult<TaskId>;
    /// Lists every row in primary-key order.
    fn list_rows(&self) -> RepoResult<Vec<RawRow>>;
    fn delete_row(&self, id: TaskId) -> RepoResult<()>;
}

/// SQLite-backed task store over a schema-ready connection.
pub struct SqliteTaskStore<'conn> {
    conn: &'conn Connection,
    table: String,
    select_sql: String,
}

impl<'conn> SqliteTaskStore<'conn> {
    /// Binds a store to `table`, which must already exist.
    pub fn try_new(conn: &'conn Connection, table: &str) -> RepoResult<Self> {
        validate_table_name(table)?;

        let exists: bool = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(RepoError::InvalidData(format!(
                "task table `{table}` does not exist; ensure the schema first"
            )));
        }

        let columns = TaskField::ALL
            .iter()
            .map(|field| format!("\"{}\"", field.column()))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(Self {
            conn,
            table: table.to_string(),
            select_sql: format!("SELECT {ROW_ID_COLUMN}, {columns} FROM \"{table}\""),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn insert_row(&self, fields: &FieldMap) -> RepoResult<TaskId> {
        let columns = TaskField::ALL
            .iter()
            .map(|field| format!("\"{}\"", field.column()))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=TaskField::ALL.len())
            .map(|index| format!("?{index}"))
            .collect::<Vec<_>>()
            .join(", ");
        let values = TaskField::ALL.iter().map(|field| {
            fields
                .get(field)
                .map_or_else(|| to_sql_value(&field.default_value()), to_sql_value)
        });

        self.conn.execute(
            &format!(
                "INSERT INTO \"{}\" ({columns}) VALUES ({placeholders});",
                self.table
            ),
            params_from_iter(values),
        )?;
        Ok(TaskId::new(self.conn.last_insert_rowid()))
    }

    fn update_row(&self, id: TaskId, fields: &FieldMap) -> RepoResult<TaskId> {
        if fields.is_empty() {
            return self.load_row(id).map(|row| row.id);
        }

        let assignments = fields
            .keys()
            .enumerate()
            .map(|(index, field)| format!("\"{}\" = ?{}", field.column(), index + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let mut values: Vec<Value> = fields.values().map(to_sql_value).collect();
        values.push(Value::Integer(id.get()));

        let changed = self.conn.execute(
            &format!(
                "UPDATE \"{}\" SET {assignments} WHERE {ROW_ID_COLUMN} = ?{};",
                self.table,
                values.len()
            ),
            params_from_iter(values),
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(id)
    }
}

impl TaskStore for SqliteTaskStore<'_> {
    fn load_row(&self, id: TaskId) -> RepoResult<RawRow> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} WHERE {ROW_ID_COLUMN} = ?1;", self.select_sql))?;
        let mut rows = stmt.query(params![id.get()])?;
        match rows.next()? {
            Some(row) => parse_task_row(row),
            None => Err(RepoError::NotFound(id)),
        }
    }

    fn write_row(&self, id: Option<TaskId>, fields: &FieldMap) -> RepoResult<TaskId> {
        match id {
            None => self.insert_row(fields),
            Some(id) => self.update_row(id, fields),
        }
    }

    fn list_rows(&self) -> RepoResult<Vec<RawRow>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} ORDER BY {ROW_ID_COLUMN} ASC;", self.select_sql))?;
        let mut rows = stmt.query([])?;
        let mut parsed = Vec::new();
        while let Some(row) = rows.next()? {
            parsed.push(parse_task_row(row)?);
        }
        Ok(parsed)
    }

    fn delete_row(&self, id: TaskId) -> RepoResult<()> {
        let changed = self.conn.execute(
            &format!("DELETE FROM \"{}\" WHERE {ROW_ID_COLUMN} = ?1;", self.table),
            params![id.get()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

/// Reads a row handle into a `RawRow`.
///
/// Only `_id` is required; schema columns missing from the projection are
/// left out of the map and read back as defaults.
pub fn parse_task_row(row: &Row<'_>) -> RepoResult<RawRow> {
    let id = TaskId::new(row.get(ROW_ID_COLUMN)?);
    let mut fields = FieldMap::new();

    for field in TaskField::ALL {
        let value = match row.get_ref(field.column()) {
            Ok(value) => value,
            Err(rusqlite::Error::InvalidColumnName(_)) => continue,
            Err(err) => return Err(err.into()),
        };
        fields.insert(field, from_sql_value(field, value)?);
    }

    Ok(RawRow { id, fields })
}

fn from_sql_value(field: TaskField, value: ValueRef<'_>) -> RepoResult<FieldValue> {
    match value {
        ValueRef::Null => Ok(FieldValue::Null),
        ValueRef::Integer(number) => Ok(FieldValue::Integer(number)),
        ValueRef::Text(bytes) => String::from_utf8(bytes.to_vec())
            .map(FieldValue::Text)
            .map_err(|_| RepoError::InvalidData(format!("non UTF-8 text in column `{field}`"))),
        ValueRef::Real(_) | ValueRef::Blob(_) => Err(RepoError::InvalidData(format!(
            "unsupported storage class in column `{field}`"
        ))),
    }
}

fn to_sql_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Integer(number) => Value::Integer(*number),
        FieldValue::Text(text) => Value::Text(text.clone()),
    }
}
