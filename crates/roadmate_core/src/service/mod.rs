//! Use-case services.
//!
//! # Responsibility
//! - `sync_service`: optimistic remote mutations over the store.
//! - `session`: per-login context that owns the store.

pub mod session;
pub mod sync_service;
