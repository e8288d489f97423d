//! Task use-case service.
//!
//! # Responsibility
//! - Provide stable task entry points for host callers.
//! - Load records through the store, mutate them through typed setters and
//!   commit them back.
//!
//! # Invariants
//! - Service APIs never bypass record validation or the store contract.
//! - Service layer remains storage-agnostic.

use crate::model::clock::now_epoch_ms;
use crate::model::field::fields;
use crate::model::task::{TaskId, TaskRecord};
use crate::ranking::rank_and_filter_at;
use crate::repo::task_store::{RepoResult, TaskStore};
use log::info;

/// Use-case service wrapper over a task store.
pub struct TaskService<S: TaskStore> {
    store: S,
}

impl<S: TaskStore> TaskService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates and persists a task with the given name.
    ///
    /// # Contract
    /// - Every other field starts at its schema default.
    /// - `creationDate` is stamped on insert.
    pub fn create_task(&self, name: impl Into<String>) -> RepoResult<TaskRecord> {
        let mut record = TaskRecord::new();
        record.set(fields::NAME, name.into())?;
        let id = record.commit(&self.store)?;
        info!("event=task_create module=service status=ok task_id={id}");
        Ok(record)
    }

    /// Loads one task. Missing ids return `RepoError::NotFound`.
    pub fn get_task(&self, id: TaskId) -> RepoResult<TaskRecord> {
        self.store.load_row(id).map(TaskRecord::from_row)
    }

    /// Commits pending changes of `record`.
    pub fn save_task(&self, record: &mut TaskRecord) -> RepoResult<TaskId> {
        record.commit(&self.store)
    }

    pub fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        self.store.delete_row(id)?;
        info!("event=task_delete module=service status=ok task_id={id}");
        Ok(())
    }

    /// Lists every task in store order.
    pub fn list_tasks(&self) -> RepoResult<Vec<TaskRecord>> {
        Ok(self
            .store
            .list_rows()?
            .into_iter()
            .map(TaskRecord::from_row)
            .collect())
    }

    /// Lists tasks ordered by weight, optionally without hidden ones.
    pub fn list_ranked(&self, hide_hidden: bool) -> RepoResult<Vec<TaskRecord>> {
        self.list_ranked_at(hide_hidden, now_epoch_ms())
    }

    pub fn list_ranked_at(&self, hide_hidden: bool, now: i64) -> RepoResult<Vec<TaskRecord>> {
        let records = self.list_tasks()?;
        let ranked = rank_and_filter_at(&records, hide_hidden, now)?;
        Ok(ranked.into_iter().cloned().collect())
    }

    /// Sets progress and commits; reaching 100 stamps the completion date.
    pub fn set_progress(&self, id: TaskId, percentage: i64) -> RepoResult<TaskRecord> {
        let mut record = self.get_task(id)?;
        record.set(fields::PROGRESS_PERCENTAGE, percentage)?;
        record.commit(&self.store)?;
        Ok(record)
    }

    pub fn start_timer(&self, id: TaskId) -> RepoResult<TaskRecord> {
        let mut record = self.get_task(id)?;
        record.start_timer_at(now_epoch_ms())?;
        record.commit(&self.store)?;
        Ok(record)
    }

    /// Stops the timer and returns the whole seconds added.
    pub fn stop_timer(&self, id: TaskId) -> RepoResult<i64> {
        let mut record = self.get_task(id)?;
        let added = record.stop_timer_and_update_elapsed_time()?;
        record.commit(&self.store)?;
        info!("event=timer_stop module=service status=ok task_id={id} added_seconds={added}");
        Ok(added)
    }
}
