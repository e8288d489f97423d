//! Task field schema and typed field keys.
//!
//! # Responsibility
//! - Enumerate every persisted task field with its storage type, nullability
//!   and default value.
//! - Provide typed `Field<T>` keys so record access is generic instead of one
//!   getter/setter pair per column.
//!
//! # Invariants
//! - Field order is the table column order and never changes within a
//!   `SCHEMA_VERSION`.
//! - A field keeps its storage type for the lifetime of a schema version.
//! - Timestamps are Unix epoch milliseconds.

use crate::model::importance::Importance;
use crate::model::task::{RecordError, RecordResult, TaskId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;

/// Schema version of the task table produced by this build.
pub const SCHEMA_VERSION: u32 = 1;

/// Raw field-name to value mapping exchanged with storage.
pub type FieldMap = BTreeMap<TaskField, FieldValue>;

/// Every persisted task column, in table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskField {
    Name,
    Notes,
    ProgressPercentage,
    Importance,
    EstimatedSeconds,
    ElapsedSeconds,
    TimerStart,
    DefiniteDueDate,
    PreferredDueDate,
    HiddenUntil,
    BlockingOn,
    Notifications,
    CreationDate,
    CompletionDate,
}

impl TaskField {
    pub const ALL: [TaskField; 14] = [
        TaskField::Name,
        TaskField::Notes,
        TaskField::ProgressPercentage,
        TaskField::Importance,
        TaskField::EstimatedSeconds,
        TaskField::ElapsedSeconds,
        TaskField::TimerStart,
        TaskField::DefiniteDueDate,
        TaskField::PreferredDueDate,
        TaskField::HiddenUntil,
        TaskField::BlockingOn,
        TaskField::Notifications,
        TaskField::CreationDate,
        TaskField::CompletionDate,
    ];

    /// Column name used in storage.
    pub fn column(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Notes => "notes",
            Self::ProgressPercentage => "progressPercentage",
            Self::Importance => "importance",
            Self::EstimatedSeconds => "estimatedSeconds",
            Self::ElapsedSeconds => "elapsedSeconds",
            Self::TimerStart => "timerStart",
            Self::DefiniteDueDate => "definiteDueDate",
            Self::PreferredDueDate => "preferredDueDate",
            Self::HiddenUntil => "hiddenUntil",
            Self::BlockingOn => "blockingOn",
            Self::Notifications => "notifications",
            Self::CreationDate => "creationDate",
            Self::CompletionDate => "completionDate",
        }
    }

    pub fn from_column(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.column() == name)
    }

    pub fn storage_type(self) -> StorageType {
        match self {
            Self::Name | Self::Notes => StorageType::Text,
            _ => StorageType::Integer,
        }
    }

    pub fn is_nullable(self) -> bool {
        !matches!(
            self,
            Self::Name | Self::Notes | Self::ProgressPercentage | Self::Importance
        )
    }

    /// True when a stored null decodes as the default instead of `None`.
    ///
    /// Holds for fields whose typed key is not an `Option`.
    pub fn null_reads_as_default(self) -> bool {
        matches!(
            self,
            Self::Name
                | Self::Notes
                | Self::ProgressPercentage
                | Self::Importance
                | Self::ElapsedSeconds
                | Self::Notifications
        )
    }

    pub fn default_value(self) -> FieldValue {
        match self {
            Self::Name | Self::Notes => FieldValue::Text(String::new()),
            Self::ProgressPercentage
            | Self::EstimatedSeconds
            | Self::ElapsedSeconds
            | Self::Notifications => FieldValue::Integer(0),
            Self::Importance => FieldValue::Integer(Importance::DEFAULT.ordinal()),
            Self::TimerStart
            | Self::DefiniteDueDate
            | Self::PreferredDueDate
            | Self::HiddenUntil
            | Self::BlockingOn
            | Self::CreationDate
            | Self::CompletionDate => FieldValue::Null,
        }
    }

    /// Returns the schema descriptor of this field.
    pub fn spec(self) -> FieldSpec {
        FieldSpec {
            field: self,
            storage_type: self.storage_type(),
            nullable: self.is_nullable(),
            default: self.default_value(),
        }
    }
}

impl Display for TaskField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column())
    }
}

/// Storage class of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageType {
    Text,
    Integer,
}

impl StorageType {
    pub fn sql_type(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Integer => "INTEGER",
        }
    }
}

/// Untyped column value as read from or written to storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum FieldValue {
    Null,
    Integer(i64),
    Text(String),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Schema descriptor: one `(name, storage type, nullable, default)` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub field: TaskField,
    pub storage_type: StorageType,
    pub nullable: bool,
    pub default: FieldValue,
}

/// Ordered schema descriptors for `SCHEMA_VERSION`.
pub fn schema_fields() -> Vec<FieldSpec> {
    TaskField::ALL.into_iter().map(TaskField::spec).collect()
}

/// Looks up a default by column name.
pub fn default_value(name: &str) -> Option<FieldValue> {
    TaskField::from_column(name).map(TaskField::default_value)
}

/// Conversion between a Rust value type and a raw `FieldValue`.
pub trait FieldType: Sized {
    fn decode(field: TaskField, value: &FieldValue) -> RecordResult<Self>;
    fn encode(self) -> FieldValue;
}

impl FieldType for String {
    fn decode(field: TaskField, value: &FieldValue) -> RecordResult<Self> {
        match value {
            FieldValue::Text(text) => Ok(text.clone()),
            _ => Err(RecordError::TypeMismatch {
                field,
                expected: "text",
            }),
        }
    }

    fn encode(self) -> FieldValue {
        FieldValue::Text(self)
    }
}

impl FieldType for i64 {
    fn decode(field: TaskField, value: &FieldValue) -> RecordResult<Self> {
        match value {
            FieldValue::Integer(number) => Ok(*number),
            _ => Err(RecordError::TypeMismatch {
                field,
                expected: "integer",
            }),
        }
    }

    fn encode(self) -> FieldValue {
        FieldValue::Integer(self)
    }
}

impl FieldType for Option<i64> {
    fn decode(field: TaskField, value: &FieldValue) -> RecordResult<Self> {
        match value {
            FieldValue::Null => Ok(None),
            FieldValue::Integer(number) => Ok(Some(*number)),
            FieldValue::Text(_) => Err(RecordError::TypeMismatch {
                field,
                expected: "nullable integer",
            }),
        }
    }

    fn encode(self) -> FieldValue {
        self.map_or(FieldValue::Null, FieldValue::Integer)
    }
}

impl FieldType for Importance {
    fn decode(field: TaskField, value: &FieldValue) -> RecordResult<Self> {
        let ordinal = i64::decode(field, value)?;
        Importance::from_ordinal(ordinal).ok_or(RecordError::CorruptEnum {
            field,
            value: ordinal,
        })
    }

    fn encode(self) -> FieldValue {
        FieldValue::Integer(self.ordinal())
    }
}

impl FieldType for Option<TaskId> {
    fn decode(field: TaskField, value: &FieldValue) -> RecordResult<Self> {
        Ok(Option::<i64>::decode(field, value)?.map(TaskId::new))
    }

    fn encode(self) -> FieldValue {
        self.map_or(FieldValue::Null, |id| FieldValue::Integer(id.get()))
    }
}

/// Typed key binding a `TaskField` to its Rust value type.
pub struct Field<T> {
    field: TaskField,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Field<T> {
    pub const fn new(field: TaskField) -> Self {
        Self {
            field,
            _marker: PhantomData,
        }
    }

    pub fn field(&self) -> TaskField {
        self.field
    }
}

impl<T> Clone for Field<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Field<T> {}

impl<T> std::fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Field").field(&self.field).finish()
    }
}

/// Typed keys for every task field.
pub mod fields {
    use super::{Field, TaskField};
    use crate::model::importance::Importance;
    use crate::model::task::TaskId;

    pub const NAME: Field<String> = Field::new(TaskField::Name);
    pub const NOTES: Field<String> = Field::new(TaskField::Notes);
    pub const PROGRESS_PERCENTAGE: Field<i64> = Field::new(TaskField::ProgressPercentage);
    pub const IMPORTANCE: Field<Importance> = Field::new(TaskField::Importance);
    pub const ESTIMATED_SECONDS: Field<Option<i64>> = Field::new(TaskField::EstimatedSeconds);
    pub const ELAPSED_SECONDS: Field<i64> = Field::new(TaskField::ElapsedSeconds);
    pub const TIMER_START: Field<Option<i64>> = Field::new(TaskField::TimerStart);
    pub const DEFINITE_DUE_DATE: Field<Option<i64>> = Field::new(TaskField::DefiniteDueDate);
    pub const PREFERRED_DUE_DATE: Field<Option<i64>> = Field::new(TaskField::PreferredDueDate);
    pub const HIDDEN_UNTIL: Field<Option<i64>> = Field::new(TaskField::HiddenUntil);
    pub const BLOCKING_ON: Field<Option<TaskId>> = Field::new(TaskField::BlockingOn);
    pub const NOTIFICATIONS: Field<i64> = Field::new(TaskField::Notifications);
    pub const CREATION_DATE: Field<Option<i64>> = Field::new(TaskField::CreationDate);
    pub const COMPLETION_DATE: Field<Option<i64>> = Field::new(TaskField::CompletionDate);
}
