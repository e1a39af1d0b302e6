//! Domain model for projects, members and board tasks.
//!
//! # Responsibility
//! - Define the records owned by the reconciliation store.
//! - Keep membership/role rules next to the data they protect.
//!
//! # Invariants
//! - Every entity is identified by a UUID; provisional ids are replaced by
//!   canonical ids once the server confirms a create.
//! - Timestamps are Unix epoch milliseconds.

pub mod member;
pub mod project;
pub mod task;
pub mod validation;

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in Unix epoch milliseconds.
///
/// Returns 0 if the system clock is set before the epoch.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}
