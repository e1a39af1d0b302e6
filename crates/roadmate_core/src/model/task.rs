//! Kanban task model.
//!
//! # Responsibility
//! - Define the task record shown on a project board.
//! - Normalize task input (`TaskDraft`) before it is applied or sent.
//!
//! # Invariants
//! - `difficulty` is always within `MIN_DIFFICULTY..=MAX_DIFFICULTY`;
//!   out-of-range input is clamped, including on deserialization.
//! - `sort_index` is owned by the board index; it is only meaningful
//!   relative to tasks with the same `status`.

use crate::model::member::MemberId;
use crate::model::now_epoch_ms;
use crate::model::validation::ValidationError;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Stable task identifier.
pub type TaskId = Uuid;

pub const MIN_DIFFICULTY: u8 = 1;
pub const MAX_DIFFICULTY: u8 = 5;
/// Difficulty applied when the caller does not pick one.
pub const DEFAULT_DIFFICULTY: u8 = 2;

/// Workflow column a task belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    Backlog,
    InProgress,
    Blocked,
    Done,
}

impl TaskStatus {
    /// Board columns in display order.
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Backlog,
        TaskStatus::InProgress,
        TaskStatus::Blocked,
        TaskStatus::Done,
    ];

    /// Wire value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::InProgress => "inProgress",
            Self::Blocked => "blocked",
            Self::Done => "done",
        }
    }

    /// Column heading.
    pub fn title(self) -> &'static str {
        match self {
            Self::Backlog => "Backlog",
            Self::InProgress => "In Progress",
            Self::Blocked => "Blocked",
            Self::Done => "Done",
        }
    }

    /// Parses a wire value.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == value)
    }
}

/// One card on a project board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskItem {
    pub id: TaskId,
    pub title: String,
    pub details: String,
    pub status: TaskStatus,
    pub assignee_id: Option<MemberId>,
    /// Display name resolved by the server; not authoritative.
    #[serde(default)]
    pub assignee_username: Option<String>,
    #[serde(deserialize_with = "deserialize_difficulty")]
    pub difficulty: u8,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    pub sort_index: u32,
}

impl TaskItem {
    /// Creates a task with a generated id in the given column.
    ///
    /// `sort_index` starts at 0; the board assigns the real slot on insert.
    pub fn new(title: impl Into<String>, status: TaskStatus) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            details: String::new(),
            status,
            assignee_id: None,
            assignee_username: None,
            difficulty: DEFAULT_DIFFICULTY,
            created_at: now_epoch_ms(),
            sort_index: 0,
        }
    }

    /// Checks record-level invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_nil() {
            return Err(ValidationError::NilId);
        }
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        Ok(())
    }

    /// Pulls `difficulty` back into `MIN_DIFFICULTY..=MAX_DIFFICULTY`.
    pub fn clamp_difficulty(&mut self) {
        self.difficulty = clamp_difficulty(i64::from(self.difficulty));
    }
}

/// User input for a new task, before the server assigns identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub details: String,
    pub status: TaskStatus,
    pub assignee_id: Option<MemberId>,
    pub difficulty: i64,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, status: TaskStatus) -> Self {
        Self {
            title: title.into(),
            details: String::new(),
            status,
            assignee_id: None,
            difficulty: i64::from(DEFAULT_DIFFICULTY),
        }
    }

    /// Returns a trimmed, clamped copy or a validation error.
    pub fn normalized(&self) -> Result<TaskDraft, ValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        Ok(TaskDraft {
            title: title.to_string(),
            details: self.details.trim().to_string(),
            status: self.status,
            assignee_id: self.assignee_id,
            difficulty: i64::from(clamp_difficulty(self.difficulty)),
        })
    }

    /// Builds the locally visible task under a provisional id.
    pub fn to_provisional_task(&self) -> TaskItem {
        let mut task = TaskItem::new(self.title.clone(), self.status);
        task.details = self.details.clone();
        task.assignee_id = self.assignee_id;
        task.difficulty = clamp_difficulty(self.difficulty);
        task
    }
}

/// Clamps any integer difficulty into the supported range.
pub fn clamp_difficulty(value: i64) -> u8 {
    value.clamp(i64::from(MIN_DIFFICULTY), i64::from(MAX_DIFFICULTY)) as u8
}

fn deserialize_difficulty<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = i64::deserialize(deserializer)?;
    Ok(clamp_difficulty(raw))
}
