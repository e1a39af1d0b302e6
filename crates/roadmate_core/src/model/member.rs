//! Project member model and predefined roles.
//!
//! # Invariants
//! - `username` is unique within one project (case-insensitive).
//! - `role_key` is a predefined key or a custom role of the owning project.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable member identifier. Equals the user id once confirmed by the server.
pub type MemberId = Uuid;

/// Fixed role set every project offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectRole {
    Frontend,
    Backend,
    Fullstack,
    Pm,
    Qa,
}

impl ProjectRole {
    /// All predefined roles in picker order.
    pub const ALL: [ProjectRole; 5] = [
        ProjectRole::Frontend,
        ProjectRole::Backend,
        ProjectRole::Fullstack,
        ProjectRole::Pm,
        ProjectRole::Qa,
    ];

    /// Stored role key.
    pub fn key(self) -> &'static str {
        match self {
            Self::Frontend => "frontend",
            Self::Backend => "backend",
            Self::Fullstack => "fullstack",
            Self::Pm => "pm",
            Self::Qa => "qa",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Frontend => "Frontend",
            Self::Backend => "Backend",
            Self::Fullstack => "Full-stack",
            Self::Pm => "Coordinator/PM",
            Self::Qa => "QA",
        }
    }

    /// Exact key lookup.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.key() == key)
    }

    /// Returns whether `value` equals a predefined key ignoring case.
    pub fn collides_with(value: &str) -> bool {
        Self::ALL
            .iter()
            .any(|role| role.key().eq_ignore_ascii_case(value))
    }
}

/// One member of a project team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMember {
    pub id: MemberId,
    pub username: String,
    pub role_key: String,
}

impl ProjectMember {
    /// Creates a member with a generated id.
    pub fn new(username: impl Into<String>, role_key: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), username, role_key)
    }

    /// Creates a member with a known id (server user id).
    pub fn with_id(
        id: MemberId,
        username: impl Into<String>,
        role_key: impl Into<String>,
    ) -> Self {
        Self {
            id,
            username: username.into(),
            role_key: role_key.into(),
        }
    }

    /// Predefined role label, or the custom role text itself.
    pub fn display_role(&self) -> &str {
        match ProjectRole::from_key(&self.role_key) {
            Some(role) => role.label(),
            None => self.role_key.as_str(),
        }
    }

    pub(crate) fn has_username(&self, username: &str) -> bool {
        self.username.to_lowercase() == username.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::{ProjectMember, ProjectRole};

    #[test]
    fn display_role_uses_predefined_label() {
        let member = ProjectMember::new("alice", "pm");
        assert_eq!(member.display_role(), "Coordinator/PM");
    }

    #[test]
    fn display_role_falls_back_to_custom_key() {
        let member = ProjectMember::new("bob", "Designer");
        assert_eq!(member.display_role(), "Designer");
    }

    #[test]
    fn collision_check_ignores_case() {
        assert!(ProjectRole::collides_with("QA"));
        assert!(!ProjectRole::collides_with("designer"));
    }
}
