//! Local persistence for the project cache.
//!
//! # Responsibility
//! - Store and load per-identity snapshots of the reconciliation store.
//! - Keep SQLite details out of the store and services.
//!
//! # Invariants
//! - The snapshot is a mirror for cold start only; it is never authoritative
//!   once a server round-trip has succeeded.
//! - Missing or corrupt snapshots mean "no cached state".

pub mod snapshot_repo;
pub mod snapshot_writer;
