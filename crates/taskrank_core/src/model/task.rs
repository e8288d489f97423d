//! Task record with retrieved and pending value layers.
//!
//! # Responsibility
//! - Wrap one persisted (or not yet persisted) task row.
//! - Track uncommitted assignments separately from the last loaded values.
//! - Expose derived read-only properties used by list views.
//!
//! # Invariants
//! - Reads resolve pending, then retrieved, then the schema default. An
//!   explicit null in pending is returned as is.
//! - The retrieved layer is an immutable snapshot; it is only ever replaced
//!   as a whole (on commit or reload).
//! - Setters never touch storage.
//! - `progressPercentage` stays within `[0, 100]`.
//! - Moving `progressPercentage` to 100 stamps `completionDate` once.
//!
//! # See also
//! - `repo::task_store` for the persistence contract.

use crate::model::clock::now_epoch_ms;
use crate::model::field::{fields, Field, FieldMap, FieldType, FieldValue, TaskField};
use crate::model::importance::TaskColorClass;
use crate::repo::task_store::{RawRow, RepoError, RepoResult, TaskStore};
use log::debug;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Progress value at which a task counts as done.
pub const COMPLETE_PERCENTAGE: i64 = 100;

/// Opaque identifier assigned by storage on first insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(i64);

impl TaskId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub type RecordResult<T> = Result<T, RecordError>;

/// Errors raised by record field access and record state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// Stored enum ordinal is outside the known range.
    CorruptEnum { field: TaskField, value: i64 },
    /// Stored value has a different storage type than the schema declares.
    TypeMismatch {
        field: TaskField,
        expected: &'static str,
    },
    /// Value rejected by a field range rule.
    InvalidValue { field: TaskField, message: String },
    TimerNotRunning,
    TimerAlreadyRunning,
    /// Task would block on itself.
    SelfBlocking(TaskId),
    /// Operation needs a persisted record.
    MissingIdentifier,
}

impl Display for RecordError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CorruptEnum { field, value } => {
                write!(f, "corrupt enum value `{value}` in field `{field}`")
            }
            Self::TypeMismatch { field, expected } => {
                write!(f, "field `{field}` does not hold a {expected} value")
            }
            Self::InvalidValue { field, message } => {
                write!(f, "invalid value for field `{field}`: {message}")
            }
            Self::TimerNotRunning => write!(f, "timer is not running"),
            Self::TimerAlreadyRunning => write!(f, "timer is already running"),
            Self::SelfBlocking(id) => write!(f, "task {id} cannot block on itself"),
            Self::MissingIdentifier => write!(f, "task has not been persisted yet"),
        }
    }
}

impl Error for RecordError {}

/// Position of a record in its clean → dirty → committed lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    /// Pending layer empty; retrieved layer mirrors the last read.
    Clean,
    /// At least one uncommitted assignment.
    Dirty,
    /// Pending values were written; retrieved holds the merged snapshot but
    /// has not been re-read from storage.
    Committed,
}

/// In-memory task entity bound to the field schema.
#[derive(Debug, Clone)]
pub struct TaskRecord {
    id: Option<TaskId>,
    retrieved: Arc<FieldMap>,
    pending: FieldMap,
    state: RecordState,
}

impl Default for TaskRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskRecord {
    /// Creates a fresh, unsaved record with every field at its default.
    pub fn new() -> Self {
        Self {
            id: None,
            retrieved: Arc::new(FieldMap::new()),
            pending: FieldMap::new(),
            state: RecordState::Clean,
        }
    }

    /// Hydrates a record from a stored row.
    pub fn from_row(row: RawRow) -> Self {
        Self {
            id: Some(row.id),
            retrieved: Arc::new(row.fields),
            pending: FieldMap::new(),
            state: RecordState::Clean,
        }
    }

    pub fn id(&self) -> Option<TaskId> {
        self.id
    }

    pub fn state(&self) -> RecordState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn is_pending(&self, field: TaskField) -> bool {
        self.pending.contains_key(&field)
    }

    pub fn pending_fields(&self) -> impl Iterator<Item = TaskField> + '_ {
        self.pending.keys().copied()
    }

    /// Reads a typed field value.
    ///
    /// # Errors
    /// - `CorruptEnum` for an out-of-range importance ordinal.
    /// - `TypeMismatch` when the stored value has the wrong storage class.
    pub fn get<T: FieldType>(&self, key: Field<T>) -> RecordResult<T> {
        let field = key.field();
        T::decode(field, &self.resolve(field))
    }

    /// Assigns a typed field value into the pending layer.
    pub fn set<T: FieldType>(&mut self, key: Field<T>, value: T) -> RecordResult<()> {
        self.set_at(key, value, now_epoch_ms())
    }

    /// Same as [`TaskRecord::set`], using `now` for any timestamp side effect.
    ///
    /// # Side effects
    /// - Setting `progressPercentage` to 100 while the current value is not
    ///   100 also assigns `completionDate = now`.
    pub fn set_at<T: FieldType>(&mut self, key: Field<T>, value: T, now: i64) -> RecordResult<()> {
        let field = key.field();
        let value = value.encode();
        check_range(field, &value)?;

        if field == TaskField::ProgressPercentage {
            let previous = self.get(fields::PROGRESS_PERCENTAGE)?;
            if previous != COMPLETE_PERCENTAGE
                && value == FieldValue::Integer(COMPLETE_PERCENTAGE)
            {
                self.write_pending(TaskField::CompletionDate, FieldValue::Integer(now));
            }
        }

        self.write_pending(field, value);
        Ok(())
    }

    pub fn is_task_completed(&self) -> RecordResult<bool> {
        Ok(self.get(fields::PROGRESS_PERCENTAGE)? >= COMPLETE_PERCENTAGE)
    }

    pub fn is_timer_running(&self) -> RecordResult<bool> {
        Ok(self.get(fields::TIMER_START)?.is_some())
    }

    /// Starts the timer at `now`.
    pub fn start_timer_at(&mut self, now: i64) -> RecordResult<()> {
        if self.is_timer_running()? {
            return Err(RecordError::TimerAlreadyRunning);
        }
        self.write_pending(TaskField::TimerStart, FieldValue::Integer(now));
        Ok(())
    }

    pub fn stop_timer_and_update_elapsed_time(&mut self) -> RecordResult<i64> {
        self.stop_timer_at(now_epoch_ms())
    }

    /// Stops the running timer and folds the elapsed whole seconds into
    /// `elapsedSeconds`. Returns the number of seconds added.
    ///
    /// A stop time earlier than the start adds nothing.
    pub fn stop_timer_at(&mut self, now: i64) -> RecordResult<i64> {
        let start = self
            .get(fields::TIMER_START)?
            .ok_or(RecordError::TimerNotRunning)?;
        let elapsed = self.get(fields::ELAPSED_SECONDS)?;
        let added = now.saturating_sub(start).max(0) / 1000;

        self.write_pending(TaskField::TimerStart, FieldValue::Null);
        self.write_pending(
            TaskField::ElapsedSeconds,
            FieldValue::Integer(elapsed.saturating_add(added)),
        );
        Ok(added)
    }

    pub fn task_color_class(&self) -> RecordResult<TaskColorClass> {
        self.task_color_class_at(now_epoch_ms())
    }

    /// Overdue when the definite due date is before `now`; otherwise the
    /// importance class.
    pub fn task_color_class_at(&self, now: i64) -> RecordResult<TaskColorClass> {
        if let Some(due) = self.get(fields::DEFINITE_DUE_DATE)? {
            if due < now {
                return Ok(TaskColorClass::Overdue);
            }
        }
        Ok(self.get(fields::IMPORTANCE)?.color_class())
    }

    /// Checks cross-field rules that single setters cannot see.
    pub fn validate(&self) -> RecordResult<()> {
        if let (Some(id), Some(blocking_on)) = (self.id, self.get(fields::BLOCKING_ON)?) {
            if id == blocking_on {
                return Err(RecordError::SelfBlocking(id));
            }
        }
        Ok(())
    }

    pub fn commit<S: TaskStore + ?Sized>(&mut self, store: &S) -> RepoResult<TaskId> {
        self.commit_at(store, now_epoch_ms())
    }

    /// Flushes the pending layer through `store`.
    ///
    /// Inserts write the full merged field map and stamp `creationDate` when
    /// unset; updates write only pending fields.
    pub fn commit_at<S: TaskStore + ?Sized>(&mut self, store: &S, now: i64) -> RepoResult<TaskId> {
        self.validate()?;

        let mut merged = self.merged_fields();
        let id = match self.id {
            None => {
                if self.get(fields::CREATION_DATE)?.is_none() {
                    merged.insert(TaskField::CreationDate, FieldValue::Integer(now));
                }
                store.write_row(None, &merged)?
            }
            Some(id) => store.write_row(Some(id), &self.pending)?,
        };

        debug!(
            "event=task_commit module=model status=ok task_id={} fields={}",
            id,
            self.pending.len()
        );

        self.retrieved = Arc::new(merged);
        self.pending = FieldMap::new();
        self.id = Some(id);
        self.state = RecordState::Committed;
        Ok(id)
    }

    /// Replaces the retrieved layer with a fresh read and drops pending values.
    pub fn reload<S: TaskStore + ?Sized>(&mut self, store: &S) -> RepoResult<()> {
        let id = self.id.ok_or(RepoError::Record(RecordError::MissingIdentifier))?;
        let row = store.load_row(id)?;
        self.retrieved = Arc::new(row.fields);
        self.pending = FieldMap::new();
        self.state = RecordState::Clean;
        Ok(())
    }

    fn merged_fields(&self) -> FieldMap {
        let mut merged = self.retrieved.as_ref().clone();
        merged.extend(
            self.pending
                .iter()
                .map(|(field, value)| (*field, value.clone())),
        );
        merged
    }

    fn resolve(&self, field: TaskField) -> Cow<'_, FieldValue> {
        if let Some(value) = self.pending.get(&field) {
            return Cow::Borrowed(value);
        }
        match self.retrieved.get(&field) {
            Some(FieldValue::Null) if field.null_reads_as_default() => {
                Cow::Owned(field.default_value())
            }
            Some(value) => Cow::Borrowed(value),
            None => Cow::Owned(field.default_value()),
        }
    }

    fn write_pending(&mut self, field: TaskField, value: FieldValue) {
        self.pending.insert(field, value);
        self.state = RecordState::Dirty;
    }
}

fn check_range(field: TaskField, value: &FieldValue) -> RecordResult<()> {
    let FieldValue::Integer(number) = value else {
        return Ok(());
    };

    match field {
        TaskField::ProgressPercentage if !(0..=COMPLETE_PERCENTAGE).contains(number) => {
            Err(RecordError::InvalidValue {
                field,
                message: format!("{number} is outside 0..=100"),
            })
        }
        TaskField::EstimatedSeconds | TaskField::ElapsedSeconds | TaskField::Notifications
            if *number < 0 =>
        {
            Err(RecordError::InvalidValue {
                field,
                message: format!("{number} must not be negative"),
            })
        }
        _ => Ok(()),
    }
}
