//! Project aggregate: team membership, custom roles and the task set.
//!
//! # Responsibility
//! - Own membership and role rules for one project.
//! - Carry the task collection that the board index orders.
//!
//! # Invariants
//! - `owner_member_id` resolves to a member in `members`; the owner is never
//!   removed.
//! - Member ids are unique; usernames are unique ignoring case.
//! - `custom_roles` are unique ignoring case, never collide with predefined
//!   role keys, and stay sorted ignoring case.
//! - A task's `assignee_id`, when set, names a member of this project.

use crate::model::member::{MemberId, ProjectMember, ProjectRole};
use crate::model::now_epoch_ms;
use crate::model::task::TaskItem;
use crate::model::validation::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Project identifier. Provisional until the server confirms a create.
pub type ProjectId = Uuid;

/// One project with its team and board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub description: String,
    pub members: Vec<ProjectMember>,
    #[serde(default)]
    pub tasks: Vec<TaskItem>,
    pub owner_member_id: MemberId,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub custom_roles: Vec<String>,
}

/// Server-confirmed subset returned by a project edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDetails {
    pub id: ProjectId,
    pub name: String,
    pub description: String,
}

impl Project {
    /// Creates a project owned by `owner` with a generated id.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        owner: ProjectMember,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
            owner_member_id: owner.id,
            members: vec![owner],
            tasks: Vec::new(),
            created_at: now_epoch_ms(),
            is_pinned: false,
            custom_roles: Vec::new(),
        }
    }

    /// Checks aggregate invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_nil() {
            return Err(ValidationError::NilId);
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }

        let mut ids = HashSet::new();
        let mut usernames = HashSet::new();
        for member in &self.members {
            if !ids.insert(member.id) {
                return Err(ValidationError::DuplicateMemberId(member.id));
            }
            if !usernames.insert(member.username.to_lowercase()) {
                return Err(ValidationError::DuplicateUsername(member.username.clone()));
            }
        }
        if !ids.contains(&self.owner_member_id) {
            return Err(ValidationError::OwnerNotMember(self.owner_member_id));
        }

        for task in &self.tasks {
            task.validate()?;
            if let Some(assignee_id) = task.assignee_id {
                if !ids.contains(&assignee_id) {
                    return Err(ValidationError::UnknownAssignee(assignee_id));
                }
            }
        }
        Ok(())
    }

    pub fn owner(&self) -> Option<&ProjectMember> {
        self.member(self.owner_member_id)
    }

    pub fn member(&self, member_id: MemberId) -> Option<&ProjectMember> {
        self.members.iter().find(|member| member.id == member_id)
    }

    pub fn task(&self, task_id: Uuid) -> Option<&TaskItem> {
        self.tasks.iter().find(|task| task.id == task_id)
    }

    /// Returns whether `role_key` is predefined or registered on this project,
    /// ignoring case.
    pub fn is_known_role(&self, role_key: &str) -> bool {
        self.canonical_role_key(role_key).is_some()
    }

    /// Stored spelling of a known role key, matched ignoring case.
    pub fn canonical_role_key(&self, role_key: &str) -> Option<String> {
        let role_key = role_key.trim();
        if let Some(role) = ProjectRole::ALL
            .into_iter()
            .find(|role| role.key().eq_ignore_ascii_case(role_key))
        {
            return Some(role.key().to_string());
        }
        let lower = role_key.to_lowercase();
        self.custom_roles
            .iter()
            .find(|role| role.to_lowercase() == lower)
            .cloned()
    }

    /// Overwrites name and description with server-confirmed values.
    pub fn apply_details(&mut self, details: &ProjectDetails) {
        self.name = details.name.clone();
        self.description = details.description.clone();
    }

    /// Adds a member after trimming and uniqueness checks.
    pub fn add_member(
        &mut self,
        username: &str,
        role_key: &str,
    ) -> Result<&ProjectMember, ValidationError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ValidationError::EmptyUsername);
        }
        if self.members.iter().any(|member| member.has_username(username)) {
            return Err(ValidationError::DuplicateUsername(username.to_string()));
        }
        let role_key = self
            .canonical_role_key(role_key)
            .ok_or_else(|| ValidationError::UnknownRole(role_key.to_string()))?;

        self.members.push(ProjectMember::new(username, role_key));
        let index = self.members.len() - 1;
        Ok(&self.members[index])
    }

    /// Changes one member's role.
    pub fn update_member_role(
        &mut self,
        member_id: MemberId,
        role_key: &str,
    ) -> Result<(), ValidationError> {
        let role_key = self
            .canonical_role_key(role_key)
            .ok_or_else(|| ValidationError::UnknownRole(role_key.to_string()))?;
        let member = self
            .members
            .iter_mut()
            .find(|member| member.id == member_id)
            .ok_or(ValidationError::MemberNotFound(member_id))?;
        member.role_key = role_key;
        Ok(())
    }

    /// Removes a non-owner member and unassigns their tasks.
    pub fn remove_member(&mut self, member_id: MemberId) -> Result<ProjectMember, ValidationError> {
        if member_id == self.owner_member_id {
            return Err(ValidationError::OwnerNotRemovable(member_id));
        }
        let index = self
            .members
            .iter()
            .position(|member| member.id == member_id)
            .ok_or(ValidationError::MemberNotFound(member_id))?;
        let removed = self.members.remove(index);

        for task in self
            .tasks
            .iter_mut()
            .filter(|task| task.assignee_id == Some(member_id))
        {
            task.assignee_id = None;
            task.assignee_username = None;
        }
        Ok(removed)
    }

    /// Registers a custom role and keeps the list sorted ignoring case.
    pub fn add_custom_role(&mut self, role: &str) -> Result<(), ValidationError> {
        let role = role.trim();
        if role.is_empty() {
            return Err(ValidationError::EmptyRole);
        }
        if ProjectRole::collides_with(role) {
            return Err(ValidationError::RoleCollision(role.to_string()));
        }
        let lower = role.to_lowercase();
        if self
            .custom_roles
            .iter()
            .any(|existing| existing.to_lowercase() == lower)
        {
            return Err(ValidationError::DuplicateRole(role.to_string()));
        }

        self.custom_roles.push(role.to_string());
        self.custom_roles
            .sort_by_key(|existing| existing.to_lowercase());
        Ok(())
    }

    /// Members ordered owner first, then by username ignoring case.
    pub fn members_for_display(&self) -> Vec<&ProjectMember> {
        let mut members = self.members.iter().collect::<Vec<_>>();
        members.sort_by(|a, b| {
            let a_owner = a.id == self.owner_member_id;
            let b_owner = b.id == self.owner_member_id;
            b_owner
                .cmp(&a_owner)
                .then_with(|| a.username.to_lowercase().cmp(&b.username.to_lowercase()))
        });
        members
    }
}

/// Trims a project name and rejects blank input.
pub fn normalize_project_name(value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(trimmed.to_string())
}
