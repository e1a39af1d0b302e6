//! Remote API contracts consumed by the core.
//!
//! # Responsibility
//! - Describe the sync gateway the services call for server round-trips.
//! - Describe where bearer credentials come from.
//!
//! # Invariants
//! - The core never performs network I/O itself; adapters implement
//!   `SyncGateway` outside this crate.
//! - Every gateway call receives a credential; calls are never made without
//!   one.

pub mod gateway;

pub use gateway::{
    Credential, CredentialStore, StaticCredentialStore, SyncError, SyncGateway, SyncResult,
};
