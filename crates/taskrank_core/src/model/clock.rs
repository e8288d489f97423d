//! Wall-clock helper shared by record and ranking code.
//!
//! Every time-dependent operation also has an `*_at(now)` variant so one
//! call can use a single timestamp throughout.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current time in Unix epoch milliseconds.
///
/// Clocks set before the epoch read as `0`.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
