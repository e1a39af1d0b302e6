//! Client-side validation errors.
//!
//! # Responsibility
//! - Describe precondition failures detected before any network call.
//!
//! # Invariants
//! - Validation errors never reach the sync gateway; callers resolve them
//!   locally and surface the message.

use crate::model::member::MemberId;
use crate::model::task::TaskId;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Precondition failure on project, member or task input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Entity id is the nil UUID.
    NilId,
    /// Project name is blank after trim.
    EmptyName,
    /// Task title is blank after trim.
    EmptyTitle,
    /// Member username is blank after trim.
    EmptyUsername,
    /// Another member already uses this username (case-insensitive).
    DuplicateUsername(String),
    /// Two members share one id.
    DuplicateMemberId(MemberId),
    /// Role key is neither predefined nor registered as a custom role.
    UnknownRole(String),
    /// Custom role name is blank after trim.
    EmptyRole,
    /// Custom role collides with a predefined role key.
    RoleCollision(String),
    /// Custom role is already registered (case-insensitive).
    DuplicateRole(String),
    /// `owner_member_id` does not resolve to a project member.
    OwnerNotMember(MemberId),
    /// The project owner cannot be removed.
    OwnerNotRemovable(MemberId),
    /// Member id is not part of the project.
    MemberNotFound(MemberId),
    /// Task assignee is not a member of the project.
    UnknownAssignee(MemberId),
    /// Two tasks share one id.
    DuplicateTaskId(TaskId),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "id must not be {}", Uuid::nil()),
            Self::EmptyName => write!(f, "project name cannot be empty"),
            Self::EmptyTitle => write!(f, "task title cannot be empty"),
            Self::EmptyUsername => write!(f, "username cannot be empty"),
            Self::DuplicateUsername(name) => write!(f, "member `{name}` already exists"),
            Self::DuplicateMemberId(id) => write!(f, "duplicate member id: {id}"),
            Self::UnknownRole(key) => write!(f, "unknown role key `{key}`"),
            Self::EmptyRole => write!(f, "role name cannot be empty"),
            Self::RoleCollision(role) => {
                write!(f, "role `{role}` collides with a predefined role")
            }
            Self::DuplicateRole(role) => write!(f, "role `{role}` already exists"),
            Self::OwnerNotMember(id) => write!(f, "owner {id} is not a project member"),
            Self::OwnerNotRemovable(id) => write!(f, "project owner {id} cannot be removed"),
            Self::MemberNotFound(id) => write!(f, "member not found: {id}"),
            Self::UnknownAssignee(id) => write!(f, "assignee {id} is not a project member"),
            Self::DuplicateTaskId(id) => write!(f, "duplicate task id: {id}"),
        }
    }
}

impl Error for ValidationError {}
