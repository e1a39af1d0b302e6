//! Per-login context.
//!
//! # Responsibility
//! - Bind one signed-in identity to its store, sync service and snapshot
//!   writer.
//! - Seed the store from the identity's cached snapshot on login.
//!
//! # Invariants
//! - A session is created by `login` and destroyed by `logout` (or drop);
//!   nothing survives it except the snapshot on disk.
//! - Snapshot problems on login degrade to an empty store.

use crate::model::member::{MemberId, ProjectMember, ProjectRole};
use crate::model::project::ProjectId;
use crate::model::task::{TaskDraft, TaskId};
use crate::model::validation::ValidationError;
use crate::repo::snapshot_repo::SnapshotRepository;
use crate::repo::snapshot_writer::SnapshotWriter;
use crate::service::sync_service::{DeleteOutcome, ServiceResult, SyncService};
use crate::store::{ProjectStore, Reconciled};
use crate::sync::{CredentialStore, SyncGateway};
use log::{info, warn};
use std::sync::Arc;

/// Role given to the creator in a provisional project, matching the
/// server's default owner role.
const PROVISIONAL_OWNER_ROLE: ProjectRole = ProjectRole::Frontend;

/// Signed-in identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub user_id: MemberId,
    pub username: String,
}

/// Everything that lives between login and logout.
pub struct Session<G: SyncGateway, C: CredentialStore> {
    user: SessionUser,
    store: ProjectStore,
    sync: SyncService<G, C>,
}

impl<G: SyncGateway, C: CredentialStore> Session<G, C> {
    /// Starts a session for `user`.
    ///
    /// With a snapshot repository the store is seeded from the cached
    /// snapshot and every later mutation is written back in the background.
    pub fn login(
        user: SessionUser,
        gateway: G,
        credentials: C,
        snapshots: Option<Arc<dyn SnapshotRepository>>,
    ) -> ServiceResult<Self> {
        let username = user.username.trim();
        if username.is_empty() {
            return Err(ValidationError::EmptyUsername.into());
        }
        let user = SessionUser {
            user_id: user.user_id,
            username: username.to_string(),
        };

        let store = match snapshots {
            Some(repo) => open_store(repo),
            None => ProjectStore::new(),
        };
        info!(
            "event=session_login module=service status=ok user_id={} cached_projects={}",
            user.user_id,
            store.projects().len()
        );
        Ok(Self {
            user,
            store,
            sync: SyncService::new(gateway, credentials),
        })
    }

    /// Ends the session and flushes pending snapshot writes.
    pub fn logout(self) {
        let user_id = self.user.user_id;
        drop(self.store);
        info!(
            "event=session_logout module=service status=ok user_id={}",
            user_id
        );
    }

    pub fn user(&self) -> &SessionUser {
        &self.user
    }

    pub fn store(&self) -> &ProjectStore {
        &self.store
    }

    /// Local-only operations (board, members, roles, pinning).
    pub fn store_mut(&mut self) -> &mut ProjectStore {
        &mut self.store
    }

    pub fn sync(&self) -> &SyncService<G, C> {
        &self.sync
    }

    pub fn refresh(&mut self) -> ServiceResult<usize> {
        self.sync.refresh(&mut self.store)
    }

    /// Creates a project owned by the signed-in user.
    pub fn create_project(
        &mut self,
        name: &str,
        description: &str,
    ) -> ServiceResult<Reconciled<ProjectId>> {
        let owner = ProjectMember::with_id(
            self.user.user_id,
            self.user.username.as_str(),
            PROVISIONAL_OWNER_ROLE.key(),
        );
        self.sync
            .create_project(&mut self.store, owner, name, description)
    }

    pub fn edit_project(
        &mut self,
        project_id: ProjectId,
        name: &str,
        description: &str,
    ) -> ServiceResult<Reconciled<()>> {
        self.sync
            .edit_project(&mut self.store, project_id, name, description)
    }

    pub fn delete_project(
        &mut self,
        project_id: ProjectId,
    ) -> ServiceResult<Reconciled<DeleteOutcome>> {
        self.sync.delete_project(&mut self.store, project_id)
    }

    pub fn create_task(
        &mut self,
        project_id: ProjectId,
        draft: &TaskDraft,
    ) -> ServiceResult<Reconciled<TaskId>> {
        self.sync.create_task(&mut self.store, project_id, draft)
    }
}

fn open_store(repo: Arc<dyn SnapshotRepository>) -> ProjectStore {
    let cached = match repo.load() {
        Ok(cached) => cached,
        Err(err) => {
            warn!(
                "event=session_restore module=service status=error error={}",
                err
            );
            None
        }
    };

    let mut store = match SnapshotWriter::spawn(repo) {
        Ok(writer) => ProjectStore::with_sink(Box::new(writer)),
        Err(err) => {
            warn!(
                "event=snapshot_writer_start module=service status=error error={}",
                err
            );
            ProjectStore::new()
        }
    };
    if let Some(snapshot) = cached {
        store.restore(snapshot);
    }
    store
}
