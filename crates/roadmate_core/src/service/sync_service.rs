//! Server round-trip use cases.
//!
//! # Responsibility
//! - Run each remote mutation as optimistic apply, gateway call, then
//!   reconcile or roll back.
//! - Keep credential handling and input validation ahead of the network.
//!
//! # Invariants
//! - No gateway call is made without a credential.
//! - Validation failures never reach the gateway and never touch the store.
//! - Deletes change local state only after the server confirms.
//! - Operations that address a project on the server require its canonical id.

use crate::model::member::ProjectMember;
use crate::model::project::{normalize_project_name, Project, ProjectId};
use crate::model::task::{TaskDraft, TaskId};
use crate::model::validation::ValidationError;
use crate::store::{ProjectStore, Reconciled, StoreError};
use crate::sync::{Credential, CredentialStore, SyncError, SyncGateway};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors from service operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Input failed a client-side precondition.
    Validation(ValidationError),
    /// Gateway reported a failure.
    Sync(SyncError),
    /// No credential is stored.
    Unauthenticated,
    /// Project is not in the local store.
    ProjectNotFound(ProjectId),
    /// Project still carries a provisional id.
    ProjectNotSynced(ProjectId),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Sync(err) => write!(f, "{err}"),
            Self::Unauthenticated => write!(f, "not signed in"),
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::ProjectNotSynced(id) => {
                write!(f, "project {id} is not yet confirmed by the server")
            }
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Sync(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<SyncError> for ServiceError {
    fn from(value: SyncError) -> Self {
        Self::Sync(value)
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::ProjectNotFound(id) => Self::ProjectNotFound(id),
            StoreError::Validation(err) => Self::Validation(err),
        }
    }
}

/// Result of a confirmed delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The server no longer had the project; the local copy was dropped.
    AlreadyGone,
}

/// Drives store mutations through the sync gateway.
pub struct SyncService<G: SyncGateway, C: CredentialStore> {
    gateway: G,
    credentials: C,
}

impl<G: SyncGateway, C: CredentialStore> SyncService<G, C> {
    pub fn new(gateway: G, credentials: C) -> Self {
        Self {
            gateway,
            credentials,
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Replaces the store with the server's project list.
    ///
    /// Returns the number of projects loaded. Mutations still in flight are
    /// discarded as stale when they complete.
    pub fn refresh(&self, store: &mut ProjectStore) -> ServiceResult<usize> {
        let credential = self.credential("refresh")?;
        let started_at = Instant::now();
        let projects = self.gateway.fetch_projects(&credential).map_err(|err| {
            log_failure("refresh", &err);
            err
        })?;
        let count = projects.len();
        store.replace_all(projects);
        info!(
            "event=sync_refresh module=service status=ok projects={} duration_ms={}",
            count,
            started_at.elapsed().as_millis()
        );
        Ok(count)
    }

    /// Creates a project, showing it immediately under a provisional id.
    ///
    /// On success the provisional entry is replaced by the canonical project
    /// and the canonical id is returned. On failure the entry is removed.
    pub fn create_project(
        &self,
        store: &mut ProjectStore,
        owner: ProjectMember,
        name: &str,
        description: &str,
    ) -> ServiceResult<Reconciled<ProjectId>> {
        let name = normalize_project_name(name)?;
        let description = description.trim();
        let credential = self.credential("create_project")?;

        let provisional = Project::new(name.as_str(), description, owner);
        let ticket = store.begin_create_project(provisional);
        match self
            .gateway
            .create_project(&credential, name.as_str(), description)
        {
            Ok(canonical) => Ok(store.complete_create_project(ticket, canonical)),
            Err(err) => {
                log_failure("create_project", &err);
                store.rollback_create_project(ticket);
                Err(err.into())
            }
        }
    }

    /// Renames a project and updates its description.
    ///
    /// The new values show immediately; a failure restores the old ones.
    /// `NotFound` drops the local copy.
    pub fn edit_project(
        &self,
        store: &mut ProjectStore,
        project_id: ProjectId,
        name: &str,
        description: &str,
    ) -> ServiceResult<Reconciled<()>> {
        let name = normalize_project_name(name)?;
        let description = description.trim();
        let project_id = self.synced_project_id(store, project_id)?;
        let credential = self.credential("edit_project")?;

        let (ticket, previous) =
            store.begin_edit_project(project_id, name.as_str(), description)?;
        match self
            .gateway
            .update_project(&credential, project_id, name.as_str(), description)
        {
            Ok(details) => Ok(store.complete_edit_project(ticket, &details)),
            Err(SyncError::NotFound) => {
                warn!(
                    "event=sync_edit_project module=service status=error reason=not_found project_id={}",
                    project_id
                );
                store.discard_project(ticket);
                Err(SyncError::NotFound.into())
            }
            Err(err) => {
                log_failure("edit_project", &err);
                store.rollback_edit_project(ticket, &previous);
                Err(err.into())
            }
        }
    }

    /// Deletes a project once the server confirms.
    pub fn delete_project(
        &self,
        store: &mut ProjectStore,
        project_id: ProjectId,
    ) -> ServiceResult<Reconciled<DeleteOutcome>> {
        let project_id = self.synced_project_id(store, project_id)?;
        let credential = self.credential("delete_project")?;

        let ticket = store.begin_delete_project(project_id)?;
        let outcome = match self.gateway.delete_project(&credential, project_id) {
            Ok(()) => DeleteOutcome::Deleted,
            Err(SyncError::NotFound) => DeleteOutcome::AlreadyGone,
            Err(err) => {
                log_failure("delete_project", &err);
                store.release(ticket);
                return Err(err.into());
            }
        };

        info!(
            "event=sync_delete_project module=service status=ok project_id={} outcome={:?}",
            project_id, outcome
        );
        Ok(match store.discard_project(ticket) {
            Reconciled::Applied(_) => Reconciled::Applied(outcome),
            Reconciled::Stale => Reconciled::Stale,
        })
    }

    /// Creates a task at the end of its column.
    ///
    /// The task keeps its local slot once the canonical copy arrives; a
    /// failure removes it and renumbers the column.
    pub fn create_task(
        &self,
        store: &mut ProjectStore,
        project_id: ProjectId,
        draft: &TaskDraft,
    ) -> ServiceResult<Reconciled<TaskId>> {
        let draft = draft.normalized()?;
        let project_id = self.synced_project_id(store, project_id)?;
        let credential = self.credential("create_task")?;

        let ticket = store.begin_create_task(project_id, &draft)?;
        match self.gateway.create_task(&credential, project_id, &draft) {
            Ok(canonical) => Ok(store.complete_create_task(ticket, project_id, canonical)),
            Err(err) => {
                log_failure("create_task", &err);
                store.rollback_create_task(ticket, project_id);
                Err(err.into())
            }
        }
    }

    fn credential(&self, op: &str) -> ServiceResult<Credential> {
        self.credentials.load_credential().ok_or_else(|| {
            warn!(
                "event=sync_{} module=service status=skip reason=unauthenticated",
                op
            );
            ServiceError::Unauthenticated
        })
    }

    /// Resolves `project_id` to a canonical id present in the store.
    fn synced_project_id(
        &self,
        store: &ProjectStore,
        project_id: ProjectId,
    ) -> ServiceResult<ProjectId> {
        let project = store
            .project(project_id)
            .ok_or(ServiceError::ProjectNotFound(project_id))?;
        if !store.is_synced(project.id) {
            return Err(ServiceError::ProjectNotSynced(project.id));
        }
        Ok(project.id)
    }
}

fn log_failure(op: &str, err: &SyncError) {
    match err {
        SyncError::NotFound => warn!(
            "event=sync_{} module=service status=error reason=not_found",
            op
        ),
        SyncError::Server { status, .. } => warn!(
            "event=sync_{} module=service status=error reason=server http_status={}",
            op,
            status.map_or_else(|| "none".to_string(), |code| code.to_string())
        ),
    }
}
