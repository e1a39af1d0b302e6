//! Sync gateway SPI and credential source.

use crate::model::project::{Project, ProjectDetails, ProjectId};
use crate::model::task::{TaskDraft, TaskItem};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

pub type SyncResult<T> = Result<T, SyncError>;

/// Failure reported by a gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Target entity is already gone on the server.
    NotFound,
    /// Any other non-success outcome. `status` is `None` when no HTTP
    /// response was received.
    Server { status: Option<u16>, body: String },
}

impl SyncError {
    pub fn server(status: u16, body: impl Into<String>) -> Self {
        Self::Server {
            status: Some(status),
            body: body.into(),
        }
    }

    pub fn unreachable(body: impl Into<String>) -> Self {
        Self::Server {
            status: None,
            body: body.into(),
        }
    }
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "entity no longer exists on the server"),
            Self::Server {
                status: Some(status),
                body,
            } => write!(f, "server responded with status {status}: {body}"),
            Self::Server { status: None, body } => write!(f, "server unreachable: {body}"),
        }
    }
}

impl Error for SyncError {}

/// Bearer credential attached to every gateway call.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn token(&self) -> &str {
        self.0.as_str()
    }

    /// `Authorization` header value.
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Source of the current bearer credential (keychain or equivalent).
pub trait CredentialStore {
    fn load_credential(&self) -> Option<Credential>;
}

/// Credential store holding one fixed value.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialStore {
    credential: Option<Credential>,
}

impl StaticCredentialStore {
    pub fn new(credential: Option<Credential>) -> Self {
        Self { credential }
    }
}

impl CredentialStore for StaticCredentialStore {
    fn load_credential(&self) -> Option<Credential> {
        self.credential.clone()
    }
}

/// Remote project/task API.
///
/// Implementations must return canonical entities: server-assigned ids,
/// normalized strings and server-computed fields.
pub trait SyncGateway {
    /// Lists the caller's projects, newest first.
    fn fetch_projects(&self, credential: &Credential) -> SyncResult<Vec<Project>>;
    /// Creates a project; the server assigns identity and owner membership.
    fn create_project(
        &self,
        credential: &Credential,
        name: &str,
        description: &str,
    ) -> SyncResult<Project>;
    /// Updates name and description.
    fn update_project(
        &self,
        credential: &Credential,
        id: ProjectId,
        name: &str,
        description: &str,
    ) -> SyncResult<ProjectDetails>;
    fn delete_project(&self, credential: &Credential, id: ProjectId) -> SyncResult<()>;
    /// Creates one task in `project_id`.
    fn create_task(
        &self,
        credential: &Credential,
        project_id: ProjectId,
        draft: &TaskDraft,
    ) -> SyncResult<TaskItem>;
}
