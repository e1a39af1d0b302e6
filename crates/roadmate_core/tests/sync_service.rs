use roadmate_core::{
    column_of, Credential, DeleteOutcome, Project, ProjectDetails, ProjectId, ProjectMember,
    ProjectStore, Reconciled, ServiceError, Session, SessionUser, SnapshotRepository,
    SqliteSnapshotRepository, StaticCredentialStore, StoreError, SyncError, SyncGateway,
    SyncResult, SyncService, TaskDraft, TaskItem, TaskStatus, ValidationError,
};
use std::cell::RefCell;
use std::sync::Arc;
use uuid::Uuid;

/// In-process server double: keeps its own project list and can be told to
/// fail the next call.
#[derive(Default)]
struct ScriptedGateway {
    server: RefCell<Vec<Project>>,
    fail_next: RefCell<Option<SyncError>>,
    calls: RefCell<Vec<&'static str>>,
}

impl ScriptedGateway {
    fn with_projects(projects: Vec<Project>) -> Self {
        let gateway = Self::default();
        *gateway.server.borrow_mut() = projects;
        gateway
    }

    fn fail_next(&self, err: SyncError) {
        *self.fail_next.borrow_mut() = Some(err);
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }

    fn enter(&self, call: &'static str, credential: &Credential) -> SyncResult<()> {
        assert_eq!(credential.token(), "token");
        self.calls.borrow_mut().push(call);
        match self.fail_next.borrow_mut().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl SyncGateway for ScriptedGateway {
    fn fetch_projects(&self, credential: &Credential) -> SyncResult<Vec<Project>> {
        self.enter("fetch_projects", credential)?;
        Ok(self.server.borrow().clone())
    }

    fn create_project(
        &self,
        credential: &Credential,
        name: &str,
        description: &str,
    ) -> SyncResult<Project> {
        self.enter("create_project", credential)?;
        let canonical = Project::new(name, description, ProjectMember::new("alice", "frontend"));
        self.server.borrow_mut().insert(0, canonical.clone());
        Ok(canonical)
    }

    fn update_project(
        &self,
        credential: &Credential,
        id: ProjectId,
        name: &str,
        description: &str,
    ) -> SyncResult<ProjectDetails> {
        self.enter("update_project", credential)?;
        let mut server = self.server.borrow_mut();
        let project = server
            .iter_mut()
            .find(|project| project.id == id)
            .ok_or(SyncError::NotFound)?;
        project.name = name.to_string();
        project.description = format!("{description} (saved)");
        Ok(ProjectDetails {
            id,
            name: project.name.clone(),
            description: project.description.clone(),
        })
    }

    fn delete_project(&self, credential: &Credential, id: ProjectId) -> SyncResult<()> {
        self.enter("delete_project", credential)?;
        let mut server = self.server.borrow_mut();
        let before = server.len();
        server.retain(|project| project.id != id);
        if server.len() == before {
            return Err(SyncError::NotFound);
        }
        Ok(())
    }

    fn create_task(
        &self,
        credential: &Credential,
        project_id: ProjectId,
        draft: &TaskDraft,
    ) -> SyncResult<TaskItem> {
        self.enter("create_task", credential)?;
        let task = draft.to_provisional_task();
        let mut server = self.server.borrow_mut();
        let project = server
            .iter_mut()
            .find(|project| project.id == project_id)
            .ok_or(SyncError::NotFound)?;
        project.tasks.push(task.clone());
        Ok(task)
    }
}

fn signed_in() -> StaticCredentialStore {
    StaticCredentialStore::new(Some(Credential::new("token")))
}

fn alice() -> SessionUser {
    SessionUser {
        user_id: Uuid::new_v4(),
        username: "alice".to_string(),
    }
}

fn login(gateway: ScriptedGateway) -> Session<ScriptedGateway, StaticCredentialStore> {
    Session::login(alice(), gateway, signed_in(), None).unwrap()
}

fn synced_project(session: &mut Session<ScriptedGateway, StaticCredentialStore>) -> ProjectId {
    match session.create_project("Alpha", "").unwrap() {
        Reconciled::Applied(id) => id,
        Reconciled::Stale => panic!("create should apply"),
    }
}

#[test]
fn refresh_replaces_store_with_server_list() {
    let server = vec![
        Project::new("One", "", ProjectMember::new("alice", "pm")),
        Project::new("Two", "", ProjectMember::new("alice", "pm")),
    ];
    let mut session = login(ScriptedGateway::with_projects(server));
    session
        .store_mut()
        .upsert(Project::new("Local only", "", ProjectMember::new("alice", "qa")));

    assert_eq!(session.refresh().unwrap(), 2);
    let names = session
        .store()
        .projects()
        .iter()
        .map(|project| project.name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["One", "Two"]);
}

#[test]
fn missing_credential_aborts_before_gateway() {
    let service = SyncService::new(ScriptedGateway::default(), StaticCredentialStore::default());
    let mut store = ProjectStore::new();

    let err = service
        .create_project(&mut store, ProjectMember::new("alice", "frontend"), "Alpha", "")
        .unwrap_err();
    assert_eq!(err, ServiceError::Unauthenticated);
    assert_eq!(service.refresh(&mut store), Err(ServiceError::Unauthenticated));
    assert!(store.projects().is_empty());
    assert!(service.gateway().calls().is_empty());
}

#[test]
fn blank_name_never_reaches_gateway() {
    let mut session = login(ScriptedGateway::default());
    assert_eq!(
        session.create_project("   ", "desc"),
        Err(ServiceError::Validation(ValidationError::EmptyName))
    );
    assert!(session.store().projects().is_empty());
    assert!(session.sync().gateway().calls().is_empty());
}

#[test]
fn create_project_swaps_in_canonical_identity() {
    let mut session = login(ScriptedGateway::default());
    let canonical_id = synced_project(&mut session);

    let store = session.store();
    assert_eq!(store.projects().len(), 1);
    assert_eq!(store.projects()[0].id, canonical_id);
    assert_eq!(store.projects()[0].name, "Alpha");
    assert!(store.is_synced(canonical_id));
}

#[test]
fn failed_create_project_leaves_no_trace() {
    let gateway = ScriptedGateway::default();
    gateway.fail_next(SyncError::server(500, "boom"));
    let mut session = login(gateway);

    let err = session.create_project("Alpha", "").unwrap_err();
    assert_eq!(err, ServiceError::Sync(SyncError::server(500, "boom")));
    assert!(session.store().projects().is_empty());
}

#[test]
fn edit_project_applies_server_values() {
    let mut session = login(ScriptedGateway::default());
    let id = synced_project(&mut session);

    assert!(session
        .edit_project(id, " Beta ", "notes")
        .unwrap()
        .is_applied());
    let project = session.store().project(id).unwrap();
    assert_eq!(project.name, "Beta");
    assert_eq!(project.description, "notes (saved)");
}

#[test]
fn failed_edit_restores_previous_values() {
    let mut session = login(ScriptedGateway::default());
    let id = synced_project(&mut session);

    session
        .sync()
        .gateway()
        .fail_next(SyncError::unreachable("offline"));
    assert!(matches!(
        session.edit_project(id, "Beta", "notes"),
        Err(ServiceError::Sync(SyncError::Server { status: None, .. }))
    ));
    assert_eq!(session.store().project(id).unwrap().name, "Alpha");
}

#[test]
fn edit_of_project_gone_on_server_drops_local_copy() {
    let mut session = login(ScriptedGateway::default());
    let id = synced_project(&mut session);
    session.sync().gateway().server.borrow_mut().clear();

    assert_eq!(
        session.edit_project(id, "Beta", ""),
        Err(ServiceError::Sync(SyncError::NotFound))
    );
    assert!(session.store().project(id).is_none());
}

#[test]
fn delete_waits_for_confirmation() {
    let mut session = login(ScriptedGateway::default());
    let id = synced_project(&mut session);

    session
        .sync()
        .gateway()
        .fail_next(SyncError::server(503, "busy"));
    assert!(session.delete_project(id).is_err());
    assert!(session.store().project(id).is_some());

    assert_eq!(
        session.delete_project(id),
        Ok(Reconciled::Applied(DeleteOutcome::Deleted))
    );
    assert!(session.store().projects().is_empty());
}

#[test]
fn delete_of_missing_project_reports_already_gone() {
    let mut session = login(ScriptedGateway::default());
    let id = synced_project(&mut session);
    session.sync().gateway().server.borrow_mut().clear();

    assert_eq!(
        session.delete_project(id),
        Ok(Reconciled::Applied(DeleteOutcome::AlreadyGone))
    );
    assert!(session.store().project(id).is_none());
}

#[test]
fn unknown_and_unsynced_projects_are_refused() {
    let mut session = login(ScriptedGateway::default());
    let ghost = Uuid::new_v4();
    assert_eq!(
        session.delete_project(ghost),
        Err(ServiceError::ProjectNotFound(ghost))
    );

    let provisional = Project::new("Pending", "", ProjectMember::new("alice", "qa"));
    let provisional_id = provisional.id;
    let _ticket = session.store_mut().begin_create_project(provisional);
    assert_eq!(
        session.create_task(provisional_id, &TaskDraft::new("t", TaskStatus::Backlog)),
        Err(ServiceError::ProjectNotSynced(provisional_id))
    );
    assert!(session.sync().gateway().calls().is_empty());
}

#[test]
fn create_task_appends_and_clamps_difficulty() {
    let mut session = login(ScriptedGateway::default());
    let id = synced_project(&mut session);

    let mut draft = TaskDraft::new("  wire api ", TaskStatus::InProgress);
    draft.difficulty = 99;
    let task_id = match session.create_task(id, &draft).unwrap() {
        Reconciled::Applied(task_id) => task_id,
        Reconciled::Stale => panic!("create should apply"),
    };

    let project = session.store().project(id).unwrap();
    let column = column_of(&project.tasks, TaskStatus::InProgress);
    assert_eq!(column.len(), 1);
    assert_eq!(column[0].id, task_id);
    assert_eq!(column[0].title, "wire api");
    assert_eq!(column[0].difficulty, 5);
}

#[test]
fn failed_task_create_is_rolled_back() {
    let mut session = login(ScriptedGateway::default());
    let id = synced_project(&mut session);
    session
        .sync()
        .gateway()
        .fail_next(SyncError::server(400, "bad"));

    assert!(session
        .create_task(id, &TaskDraft::new("t", TaskStatus::Done))
        .is_err());
    assert!(session.store().project(id).unwrap().tasks.is_empty());
}

#[test]
fn session_restores_and_persists_snapshots() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.sqlite3");
    let repo: Arc<dyn SnapshotRepository> =
        Arc::new(SqliteSnapshotRepository::open(&path, "alice").unwrap());

    let mut session =
        Session::login(alice(), ScriptedGateway::default(), signed_in(), Some(repo.clone()))
            .unwrap();
    let id = synced_project(&mut session);
    session.store_mut().set_pinned(id, true).unwrap();
    session.logout();

    let cached = repo.load().unwrap().unwrap();
    assert_eq!(cached.projects.len(), 1);
    assert!(cached.projects[0].is_pinned);

    let session =
        Session::login(alice(), ScriptedGateway::default(), signed_in(), Some(repo)).unwrap();
    assert_eq!(session.store().projects()[0].id, id);
}

#[test]
fn blank_username_cannot_log_in() {
    let user = SessionUser {
        user_id: Uuid::new_v4(),
        username: "  ".to_string(),
    };
    assert!(matches!(
        Session::login(user, ScriptedGateway::default(), signed_in(), None),
        Err(ServiceError::Validation(ValidationError::EmptyUsername))
    ));
}

#[test]
fn store_errors_map_onto_service_errors() {
    let project_id = Uuid::new_v4();
    assert_eq!(
        ServiceError::from(StoreError::ProjectNotFound(project_id)),
        ServiceError::ProjectNotFound(project_id)
    );
    assert_eq!(
        ServiceError::from(StoreError::Validation(ValidationError::EmptyTitle)),
        ServiceError::Validation(ValidationError::EmptyTitle)
    );
}
