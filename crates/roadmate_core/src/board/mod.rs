//! Board index: per-status ordering of a project's tasks.
//!
//! # Responsibility
//! - Expose ordered column views over a project's task collection.
//! - Insert, reorder, move and remove tasks while keeping columns contiguous.
//!
//! # Invariants
//! - For every status, sorting that column by `sort_index` yields exactly
//!   `0..n-1` after each mutation.
//! - Indices are unique per column only, never across the whole project.
//! - Unknown task ids are skipped and logged, never fatal.

mod index;

pub use index::{
    append_slot, check_contiguity, column_ids, column_len, column_of, Board,
    BoardInvariantError,
};
