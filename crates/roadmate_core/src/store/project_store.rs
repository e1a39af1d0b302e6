use crate::board::Board;
use crate::model::member::{MemberId, ProjectMember};
use crate::model::project::{Project, ProjectDetails, ProjectId};
use crate::model::task::{TaskDraft, TaskId, TaskItem, TaskStatus};
use crate::model::validation::ValidationError;
use crate::repo::snapshot_repo::Snapshot;
use crate::repo::snapshot_writer::SnapshotSink;
use crate::store::sequence::{MutationTicket, SequenceTracker};
use crate::store::{Reconciled, StoreError, StoreResult};
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};

/// Authoritative client-side list of projects.
///
/// Local edits (board moves, members, roles, pinning) apply immediately.
/// Edits that need the server are split into `begin_*` (optimistic apply and
/// a [`MutationTicket`]) and a reconcile call that takes the ticket back.
pub struct ProjectStore {
    projects: Vec<Project>,
    sequences: SequenceTracker,
    /// Provisional project id -> canonical id, filled on confirmed creates.
    canonical_ids: HashMap<ProjectId, ProjectId>,
    /// Provisional projects whose create has not been reconciled yet.
    pending_creates: HashSet<ProjectId>,
    sink: Option<Box<dyn SnapshotSink>>,
}

impl Default for ProjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectStore {
    /// Creates an empty store that persists nothing.
    pub fn new() -> Self {
        Self {
            projects: Vec::new(),
            sequences: SequenceTracker::default(),
            canonical_ids: HashMap::new(),
            pending_creates: HashSet::new(),
            sink: None,
        }
    }

    /// Creates an empty store that submits a snapshot after every mutation.
    pub fn with_sink(sink: Box<dyn SnapshotSink>) -> Self {
        Self {
            sink: Some(sink),
            ..Self::new()
        }
    }

    /// Seeds state from a cached snapshot without writing it back.
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.projects = snapshot.projects.into_iter().map(with_normalized_board).collect();
        info!(
            "event=store_restore module=store status=ok projects={} captured_at={}",
            self.projects.len(),
            snapshot.captured_at
        );
    }

    pub fn projects(&self) -> &[Project] {
        self.projects.as_slice()
    }

    /// Projects with pinned ones first; order is otherwise unchanged.
    pub fn projects_pinned_first(&self) -> Vec<&Project> {
        let mut listed = self.projects.iter().collect::<Vec<_>>();
        listed.sort_by_key(|project| !project.is_pinned);
        listed
    }

    /// Looks up a project by canonical or provisional id.
    pub fn project(&self, project_id: ProjectId) -> Option<&Project> {
        self.position_of(project_id)
            .map(|position| &self.projects[position])
    }

    /// Maps a provisional id to its canonical id once a create is confirmed.
    ///
    /// Ids that were never remapped are returned unchanged.
    pub fn resolve_project_id(&self, project_id: ProjectId) -> ProjectId {
        self.canonical_ids
            .get(&project_id)
            .copied()
            .unwrap_or(project_id)
    }

    /// Returns `false` while the project only exists under a provisional id.
    pub fn is_synced(&self, project_id: ProjectId) -> bool {
        !self
            .pending_creates
            .contains(&self.resolve_project_id(project_id))
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.projects)
    }

    /// Replaces the whole list with server data.
    ///
    /// In-flight tickets become stale.
    pub fn replace_all(&mut self, projects: Vec<Project>) {
        self.projects = projects.into_iter().map(with_normalized_board).collect();
        self.sequences.reset();
        self.canonical_ids.clear();
        self.pending_creates.clear();
        info!(
            "event=store_replace_all module=store status=ok projects={}",
            self.projects.len()
        );
        self.persist();
    }

    /// Replaces a project with the same id in place, or inserts it first.
    ///
    /// Returns `true` when the project was inserted.
    pub fn upsert(&mut self, project: Project) -> bool {
        let project_id = project.id;
        let inserted = self.put(project);
        debug!(
            "event=store_upsert module=store status=ok project_id={} inserted={}",
            project_id, inserted
        );
        self.persist();
        inserted
    }

    /// Removes a project.
    pub fn delete(&mut self, project_id: ProjectId) -> Option<Project> {
        let removed = self.take_project(project_id);
        if removed.is_some() {
            self.persist();
        }
        removed
    }

    /// Replaces the member list.
    ///
    /// The list is checked like `add_member` input: non-blank usernames,
    /// unique ids, usernames unique ignoring case, known roles, and the
    /// owner still present. Tasks assigned to dropped members are
    /// unassigned.
    pub fn update_members(
        &mut self,
        project_id: ProjectId,
        members: Vec<ProjectMember>,
    ) -> StoreResult<()> {
        let project = self.project_mut(project_id)?;
        let members = checked_members(project, members)?;

        project.members = members;
        for task in project.tasks.iter_mut() {
            let dangling = task
                .assignee_id
                .is_some_and(|id| !project.members.iter().any(|member| member.id == id));
            if dangling {
                task.assignee_id = None;
                task.assignee_username = None;
            }
        }
        self.persist();
        Ok(())
    }

    /// Replaces the task list and renumbers every column.
    pub fn update_tasks(&mut self, project_id: ProjectId, tasks: Vec<TaskItem>) -> StoreResult<()> {
        let project = self.project_mut(project_id)?;
        let mut tasks = tasks;
        let mut ids = HashSet::new();
        for task in tasks.iter_mut() {
            task.validate()?;
            if !ids.insert(task.id) {
                return Err(ValidationError::DuplicateTaskId(task.id).into());
            }
            task.clamp_difficulty();
            attach_assignee(project, task)?;
        }
        Board::new(&mut tasks).normalize_all();
        project.tasks = tasks;
        self.persist();
        Ok(())
    }

    /// Appends a task to the end of its column.
    ///
    /// Returns the assigned slot, or `None` when the id is already on the board.
    pub fn add_task(&mut self, project_id: ProjectId, task: TaskItem) -> StoreResult<Option<u32>> {
        task.validate()?;
        let project = self.project_mut(project_id)?;
        let mut task = task;
        attach_assignee(project, &mut task)?;
        let slot = Board::new(&mut project.tasks).insert(task);
        if slot.is_some() {
            self.persist();
        }
        Ok(slot)
    }

    /// Moves a task to the end of another column.
    ///
    /// Returns `false` for unknown tasks and same-column moves.
    pub fn move_task(
        &mut self,
        project_id: ProjectId,
        task_id: TaskId,
        to_status: TaskStatus,
    ) -> StoreResult<bool> {
        let project = self.project_mut(project_id)?;
        let moved = Board::new(&mut project.tasks).move_across_columns(task_id, to_status);
        if moved {
            self.persist();
        }
        Ok(moved)
    }

    /// Reorders one column by position.
    pub fn reorder_task(
        &mut self,
        project_id: ProjectId,
        status: TaskStatus,
        from: usize,
        to: usize,
    ) -> StoreResult<bool> {
        let project = self.project_mut(project_id)?;
        let reordered = Board::new(&mut project.tasks).reorder_within_column(status, from, to);
        if reordered {
            self.persist();
        }
        Ok(reordered)
    }

    pub fn remove_task(
        &mut self,
        project_id: ProjectId,
        task_id: TaskId,
    ) -> StoreResult<Option<TaskItem>> {
        let project = self.project_mut(project_id)?;
        let removed = Board::new(&mut project.tasks).remove_from_column(task_id);
        if removed.is_some() {
            self.persist();
        }
        Ok(removed)
    }

    /// Edits a task in place; a status change moves it to the end of the
    /// new column.
    pub fn replace_task(&mut self, project_id: ProjectId, task: TaskItem) -> StoreResult<bool> {
        task.validate()?;
        let project = self.project_mut(project_id)?;
        let mut task = task;
        attach_assignee(project, &mut task)?;
        let replaced = Board::new(&mut project.tasks).replace_task(task);
        if replaced {
            self.persist();
        }
        Ok(replaced)
    }

    pub fn add_member(
        &mut self,
        project_id: ProjectId,
        username: &str,
        role_key: &str,
    ) -> StoreResult<ProjectMember> {
        let project = self.project_mut(project_id)?;
        let member = project.add_member(username, role_key)?.clone();
        self.persist();
        Ok(member)
    }

    pub fn update_member_role(
        &mut self,
        project_id: ProjectId,
        member_id: MemberId,
        role_key: &str,
    ) -> StoreResult<()> {
        self.project_mut(project_id)?
            .update_member_role(member_id, role_key)?;
        self.persist();
        Ok(())
    }

    /// Removes a non-owner member and unassigns their tasks.
    pub fn remove_member(
        &mut self,
        project_id: ProjectId,
        member_id: MemberId,
    ) -> StoreResult<ProjectMember> {
        let removed = self.project_mut(project_id)?.remove_member(member_id)?;
        self.persist();
        Ok(removed)
    }

    pub fn add_custom_role(&mut self, project_id: ProjectId, role: &str) -> StoreResult<()> {
        self.project_mut(project_id)?.add_custom_role(role)?;
        self.persist();
        Ok(())
    }

    pub fn set_pinned(&mut self, project_id: ProjectId, pinned: bool) -> StoreResult<()> {
        self.project_mut(project_id)?.is_pinned = pinned;
        self.persist();
        Ok(())
    }

    /// Inserts a provisional project ahead of the server create.
    pub fn begin_create_project(&mut self, project: Project) -> MutationTicket {
        let provisional_id = project.id;
        self.put(project);
        self.pending_creates.insert(provisional_id);
        let ticket = self.sequences.issue(provisional_id);
        self.persist();
        ticket
    }

    /// Swaps the provisional project for the server's canonical one.
    ///
    /// The canonical project takes the provisional slot; the local pin flag
    /// carries over. Returns the canonical id.
    pub fn complete_create_project(
        &mut self,
        ticket: MutationTicket,
        canonical: Project,
    ) -> Reconciled<ProjectId> {
        if !self.take_current(&ticket, "create_project") {
            return Reconciled::Stale;
        }

        let provisional_id = ticket.entity();
        self.pending_creates.remove(&provisional_id);
        let mut canonical = with_normalized_board(canonical);
        let canonical_id = canonical.id;
        if canonical_id != provisional_id {
            self.projects.retain(|project| project.id != canonical_id);
        }
        match self
            .projects
            .iter()
            .position(|project| project.id == provisional_id)
        {
            Some(position) => {
                canonical.is_pinned = self.projects[position].is_pinned;
                self.projects[position] = canonical;
            }
            None => self.projects.insert(0, canonical),
        }
        if canonical_id != provisional_id {
            self.canonical_ids.insert(provisional_id, canonical_id);
        }

        debug!(
            "event=store_reconcile module=store status=ok op=create_project provisional_id={} canonical_id={}",
            provisional_id, canonical_id
        );
        self.persist();
        Reconciled::Applied(canonical_id)
    }

    /// Drops the provisional project after a failed create.
    pub fn rollback_create_project(&mut self, ticket: MutationTicket) -> Reconciled<Option<Project>> {
        if !self.take_current(&ticket, "create_project") {
            return Reconciled::Stale;
        }
        let removed = self.take_project(ticket.entity());
        self.persist();
        Reconciled::Applied(removed)
    }

    /// Applies new name and description ahead of the server update.
    ///
    /// Returns the ticket and the values to restore on failure.
    pub fn begin_edit_project(
        &mut self,
        project_id: ProjectId,
        name: &str,
        description: &str,
    ) -> StoreResult<(MutationTicket, ProjectDetails)> {
        let project = self.project_mut(project_id)?;
        let previous = ProjectDetails {
            id: project.id,
            name: project.name.clone(),
            description: project.description.clone(),
        };
        project.apply_details(&ProjectDetails {
            id: previous.id,
            name: name.to_string(),
            description: description.to_string(),
        });

        let ticket = self.sequences.issue(previous.id);
        self.persist();
        Ok((ticket, previous))
    }

    /// Overwrites name and description with the server's values.
    pub fn complete_edit_project(
        &mut self,
        ticket: MutationTicket,
        details: &ProjectDetails,
    ) -> Reconciled<()> {
        self.apply_details_if_current(ticket, details, "edit_project")
    }

    /// Restores the values captured by `begin_edit_project`.
    pub fn rollback_edit_project(
        &mut self,
        ticket: MutationTicket,
        previous: &ProjectDetails,
    ) -> Reconciled<()> {
        self.apply_details_if_current(ticket, previous, "edit_project_rollback")
    }

    /// Issues a ticket for a delete; nothing changes until it is confirmed.
    pub fn begin_delete_project(&mut self, project_id: ProjectId) -> StoreResult<MutationTicket> {
        let project_id = self.project_mut(project_id)?.id;
        Ok(self.sequences.issue(project_id))
    }

    /// Removes the ticket's project once the server confirms it is gone.
    pub fn discard_project(&mut self, ticket: MutationTicket) -> Reconciled<Option<Project>> {
        if !self.take_current(&ticket, "discard_project") {
            return Reconciled::Stale;
        }
        let removed = self.take_project(ticket.entity());
        if removed.is_some() {
            self.persist();
        }
        Reconciled::Applied(removed)
    }

    /// Closes a ticket whose mutation failed without local effects.
    pub fn release(&mut self, ticket: MutationTicket) {
        self.sequences.retire(&ticket);
    }

    /// Appends a provisional task ahead of the server create.
    pub fn begin_create_task(
        &mut self,
        project_id: ProjectId,
        draft: &TaskDraft,
    ) -> StoreResult<MutationTicket> {
        let project = self.project_mut(project_id)?;
        let mut task = draft.to_provisional_task();
        attach_assignee(project, &mut task)?;
        let provisional_id = task.id;
        Board::new(&mut project.tasks).insert(task);

        let ticket = self.sequences.issue(provisional_id);
        self.persist();
        Ok(ticket)
    }

    /// Swaps the provisional task for the server's canonical one.
    ///
    /// The task keeps its local column slot. If the server placed it in a
    /// different column it is moved there like a cross-column move. A task
    /// removed locally while the create was in flight stays removed and the
    /// result is `Stale`.
    pub fn complete_create_task(
        &mut self,
        ticket: MutationTicket,
        project_id: ProjectId,
        canonical: TaskItem,
    ) -> Reconciled<TaskId> {
        if !self.take_current(&ticket, "create_task") {
            return Reconciled::Stale;
        }
        let Ok(project) = self.project_mut(project_id) else {
            warn!(
                "event=store_reconcile module=store status=skip op=create_task reason=project_gone project_id={}",
                project_id
            );
            return Reconciled::Stale;
        };

        let provisional_id = ticket.entity();
        if project.task(provisional_id).is_none() {
            debug!(
                "event=store_reconcile module=store status=skip op=create_task reason=removed_locally provisional_id={} canonical_id={}",
                provisional_id, canonical.id
            );
            return Reconciled::Stale;
        }

        let mut canonical = canonical;
        let canonical_id = canonical.id;
        let canonical_status = canonical.status;
        if canonical.assignee_username.is_none() {
            canonical.assignee_username = canonical
                .assignee_id
                .and_then(|id| project.member(id))
                .map(|member| member.username.clone());
        }
        if canonical_id != provisional_id {
            project.tasks.retain(|task| task.id != canonical_id);
        }

        if let Some(position) = project
            .tasks
            .iter()
            .position(|task| task.id == provisional_id)
        {
            let local = &project.tasks[position];
            canonical.status = local.status;
            canonical.sort_index = local.sort_index;
            canonical.clamp_difficulty();
            project.tasks[position] = canonical;

            let mut board = Board::new(&mut project.tasks);
            board.move_across_columns(canonical_id, canonical_status);
            board.normalize_all();
        }

        debug!(
            "event=store_reconcile module=store status=ok op=create_task provisional_id={} canonical_id={}",
            provisional_id, canonical_id
        );
        self.persist();
        Reconciled::Applied(canonical_id)
    }

    /// Drops the provisional task after a failed create.
    pub fn rollback_create_task(
        &mut self,
        ticket: MutationTicket,
        project_id: ProjectId,
    ) -> Reconciled<Option<TaskItem>> {
        if !self.take_current(&ticket, "create_task") {
            return Reconciled::Stale;
        }
        let removed = match self.project_mut(project_id) {
            Ok(project) => Board::new(&mut project.tasks).remove_from_column(ticket.entity()),
            Err(_) => None,
        };
        if removed.is_some() {
            self.persist();
        }
        Reconciled::Applied(removed)
    }

    fn apply_details_if_current(
        &mut self,
        ticket: MutationTicket,
        details: &ProjectDetails,
        op: &str,
    ) -> Reconciled<()> {
        if !self.take_current(&ticket, op) {
            return Reconciled::Stale;
        }
        if let Some(position) = self.position_of(ticket.entity()) {
            self.projects[position].apply_details(details);
            self.persist();
        }
        Reconciled::Applied(())
    }

    /// Retires `ticket` and returns `true` if it was still the latest.
    fn take_current(&mut self, ticket: &MutationTicket, op: &str) -> bool {
        if !self.sequences.is_current(ticket) {
            debug!(
                "event=store_reconcile module=store status=skip op={} reason=stale entity_id={} sequence={}",
                op,
                ticket.entity(),
                ticket.sequence()
            );
            return false;
        }
        self.sequences.retire(ticket);
        true
    }

    fn put(&mut self, project: Project) -> bool {
        let project = with_normalized_board(project);
        match self.position_of(project.id) {
            Some(position) => {
                self.projects[position] = project;
                false
            }
            None => {
                self.projects.insert(0, project);
                true
            }
        }
    }

    fn take_project(&mut self, project_id: ProjectId) -> Option<Project> {
        let position = self.position_of(project_id)?;
        let removed = self.projects.remove(position);
        self.pending_creates.remove(&removed.id);
        Some(removed)
    }

    fn position_of(&self, project_id: ProjectId) -> Option<usize> {
        let resolved = self.resolve_project_id(project_id);
        self.projects
            .iter()
            .position(|project| project.id == resolved)
    }

    fn project_mut(&mut self, project_id: ProjectId) -> StoreResult<&mut Project> {
        let resolved = self.resolve_project_id(project_id);
        self.projects
            .iter_mut()
            .find(|project| project.id == resolved)
            .ok_or(StoreError::ProjectNotFound(project_id))
    }

    fn persist(&self) {
        if let Some(sink) = self.sink.as_ref() {
            sink.submit(Snapshot::capture(&self.projects));
        }
    }
}

fn with_normalized_board(mut project: Project) -> Project {
    let mut board = Board::new(&mut project.tasks);
    board.drop_duplicate_ids();
    board.normalize_all();
    for task in project.tasks.iter_mut() {
        task.clamp_difficulty();
    }
    project
}

/// Trims usernames, canonicalizes role keys, and checks the member rules.
fn checked_members(
    project: &Project,
    members: Vec<ProjectMember>,
) -> Result<Vec<ProjectMember>, ValidationError> {
    let mut ids = HashSet::new();
    let mut usernames = HashSet::new();
    let mut checked = Vec::with_capacity(members.len());
    for mut member in members {
        member.username = member.username.trim().to_string();
        if member.username.is_empty() {
            return Err(ValidationError::EmptyUsername);
        }
        if !ids.insert(member.id) {
            return Err(ValidationError::DuplicateMemberId(member.id));
        }
        if !usernames.insert(member.username.to_lowercase()) {
            return Err(ValidationError::DuplicateUsername(member.username));
        }
        member.role_key = project
            .canonical_role_key(&member.role_key)
            .ok_or_else(|| ValidationError::UnknownRole(member.role_key.clone()))?;
        checked.push(member);
    }
    if !ids.contains(&project.owner_member_id) {
        return Err(ValidationError::OwnerNotMember(project.owner_member_id));
    }
    Ok(checked)
}

/// Checks the assignee is a member and copies their username onto the task.
fn attach_assignee(project: &Project, task: &mut TaskItem) -> Result<(), ValidationError> {
    task.assignee_username = match task.assignee_id {
        Some(assignee_id) => {
            let member = project
                .member(assignee_id)
                .ok_or(ValidationError::UnknownAssignee(assignee_id))?;
            Some(member.username.clone())
        }
        None => None,
    };
    Ok(())
}
