//! Task list weighting, filtering and ordering.
//!
//! # Responsibility
//! - Compute a signed priority weight per task (lower ranks first).
//! - Drop tasks whose visibility window has not opened yet.
//! - Produce a stable ascending order over a weight snapshot.
//!
//! # Invariants
//! - One `now` is used for filtering and for every weight of a pass.
//! - Weights are computed once per record before sorting.
//! - Equal weights keep their input order.
//! - Records are read through their getters only and never mutated.

use crate::model::clock::now_epoch_ms;
use crate::model::field::fields;
use crate::model::task::{RecordResult, TaskRecord};

const IMPORTANCE_STEP: i64 = 60;
const ESTIMATE_DIVISOR: i64 = 120;
const DUE_HORIZON_HOURS: i64 = 5 * 24;
const COMPLETED_PENALTY: i64 = 1000;
const MS_PER_HOUR: i64 = 1000 * 3600;

/// Filters and orders `records` using the current time.
pub fn rank_and_filter(
    records: &[TaskRecord],
    hide_hidden: bool,
) -> RecordResult<Vec<&TaskRecord>> {
    rank_and_filter_at(records, hide_hidden, now_epoch_ms())
}

/// Filters and orders `records` as seen at `now`.
///
/// # Errors
/// - Propagates field decode errors (for example a corrupt importance).
pub fn rank_and_filter_at(
    records: &[TaskRecord],
    hide_hidden: bool,
    now: i64,
) -> RecordResult<Vec<&TaskRecord>> {
    let mut weighted = Vec::with_capacity(records.len());
    for record in records {
        if hide_hidden && is_hidden_at(record, now)? {
            continue;
        }
        weighted.push((weight_at(record, now)?, record));
    }

    weighted.sort_by_key(|(weight, _)| *weight);
    Ok(weighted.into_iter().map(|(_, record)| record).collect())
}

/// True while `hiddenUntil` lies strictly in the future.
pub fn is_hidden_at(record: &TaskRecord, now: i64) -> RecordResult<bool> {
    Ok(record
        .get(fields::HIDDEN_UNTIL)?
        .is_some_and(|hidden_until| hidden_until > now))
}

/// Priority weight of `record` at `now`. Smaller is more important.
pub fn weight_at(record: &TaskRecord, now: i64) -> RecordResult<i64> {
    let mut weight = record.get(fields::IMPORTANCE)?.ordinal() * IMPORTANCE_STEP;

    let estimated = record.get(fields::ESTIMATED_SECONDS)?.unwrap_or(0);
    let seconds_left = estimated.saturating_sub(record.get(fields::ELAPSED_SECONDS)?);
    if seconds_left > 0 {
        weight += seconds_left / ESTIMATE_DIVISOR;
    }

    if let Some(due) = record.get(fields::DEFINITE_DUE_DATE)? {
        if let Some(urgency) = deadline_urgency(due, now) {
            weight = weight.saturating_add(urgency);
        }
    }

    if let Some(due) = record.get(fields::PREFERRED_DUE_DATE)? {
        if let Some(urgency) = deadline_urgency(due, now) {
            weight = weight.saturating_add(urgency / 2);
        }
    }

    if record.is_task_completed()? {
        weight = weight.saturating_add(COMPLETED_PENALTY);
    }

    Ok(weight)
}

/// Negative bonus for a deadline inside the horizon; grows without bound
/// once overdue. Hours truncate toward zero.
fn deadline_urgency(due: i64, now: i64) -> Option<i64> {
    let hours_left = due.saturating_sub(now) / MS_PER_HOUR;
    (hours_left < DUE_HORIZON_HOURS).then_some(hours_left - DUE_HORIZON_HOURS)
}
