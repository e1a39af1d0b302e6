//! Core domain logic for Roadmate.
//! Owns board ordering and reconciliation of the local project cache with
//! the remote service.

pub mod board;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;
pub mod sync;

pub use board::{check_contiguity, column_of, Board, BoardInvariantError};
pub use config::CoreConfig;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::member::{MemberId, ProjectMember, ProjectRole};
pub use model::project::{Project, ProjectDetails, ProjectId};
pub use model::task::{TaskDraft, TaskId, TaskItem, TaskStatus};
pub use model::validation::ValidationError;
pub use repo::snapshot_repo::{
    Snapshot, SnapshotError, SnapshotRepository, SnapshotResult, SqliteSnapshotRepository,
};
pub use repo::snapshot_writer::{SnapshotSink, SnapshotWriter};
pub use service::session::{Session, SessionUser};
pub use service::sync_service::{DeleteOutcome, ServiceError, ServiceResult, SyncService};
pub use store::{MutationTicket, ProjectStore, Reconciled, StoreError, StoreResult};
pub use sync::{
    Credential, CredentialStore, StaticCredentialStore, SyncError, SyncGateway, SyncResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
