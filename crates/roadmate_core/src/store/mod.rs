//! In-memory reconciliation store.
//!
//! # Responsibility
//! - Hold the authoritative client-side project list.
//! - Apply optimistic mutations and reconcile them with server results.
//! - Hand every committed state to the snapshot sink.
//!
//! # Invariants
//! - Project ids are unique in the store; new projects are inserted first.
//! - Every project's board satisfies column contiguity after each call.
//! - A reconcile whose ticket is no longer the latest for its entity is
//!   discarded without touching state.
//! - The store has a single logical writer and takes no locks.

mod project_store;
mod sequence;

pub use project_store::ProjectStore;
pub use sequence::MutationTicket;

use crate::model::project::ProjectId;
use crate::model::validation::ValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from local store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Project id (provisional or canonical) is not in the store.
    ProjectNotFound(ProjectId),
    /// Input failed a model precondition.
    Validation(ValidationError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Outcome of reconciling a server response against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled<T> {
    /// The response was current and has been applied.
    Applied(T),
    /// A newer mutation for the same entity was issued; nothing changed.
    Stale,
}

impl<T> Reconciled<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}
