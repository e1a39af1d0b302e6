//! Session snapshot repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist one JSON snapshot of the project cache per logged-in identity.
//! - Load it back for cold start and offline viewing.
//!
//! # Invariants
//! - Snapshots are namespaced by sanitized username.
//! - A save replaces the namespace row in a single statement.
//! - Undecodable payloads or foreign schema versions load as `None`.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::now_epoch_ms;
use crate::model::project::Project;
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::Mutex;

/// Payload layout version written into every row.
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

static NAMESPACE_UNSAFE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9_-]+").expect("valid namespace regex"));

pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Errors from snapshot persistence.
#[derive(Debug)]
pub enum SnapshotError {
    Db(DbError),
    Encode(serde_json::Error),
    /// Connection mutex was poisoned by a panicking writer.
    Poisoned,
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "snapshot encode failed: {err}"),
            Self::Poisoned => write!(f, "snapshot connection is poisoned"),
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::Poisoned => None,
        }
    }
}

impl From<DbError> for SnapshotError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for SnapshotError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Serializable copy of the project cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub projects: Vec<Project>,
    /// Unix epoch milliseconds when the snapshot was captured.
    pub captured_at: i64,
}

impl Snapshot {
    pub fn capture(projects: &[Project]) -> Self {
        Self {
            projects: projects.to_vec(),
            captured_at: now_epoch_ms(),
        }
    }
}

/// Row metadata, readable without decoding the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotSummary {
    pub namespace: String,
    pub project_count: u32,
    pub saved_at: i64,
}

/// Durable snapshot storage for one identity.
pub trait SnapshotRepository: Send + Sync {
    fn save(&self, snapshot: &Snapshot) -> SnapshotResult<()>;
    /// Returns `Ok(None)` when nothing usable is cached.
    fn load(&self) -> SnapshotResult<Option<Snapshot>>;
}

/// Maps a username to a storage-safe namespace.
///
/// Runs of characters outside `[A-Za-z0-9_-]` collapse into a single `-`.
pub fn snapshot_namespace(username: &str) -> String {
    NAMESPACE_UNSAFE_RE
        .replace_all(username.trim(), "-")
        .into_owned()
}

/// SQLite-backed snapshot repository.
pub struct SqliteSnapshotRepository {
    conn: Mutex<Connection>,
    namespace: String,
}

impl SqliteSnapshotRepository {
    /// Opens the cache file at `path` for `username`.
    pub fn open(path: impl AsRef<Path>, username: &str) -> SnapshotResult<Self> {
        Ok(Self::from_connection(open_db(path)?, username))
    }

    /// Creates a repository over a private in-memory database.
    pub fn in_memory(username: &str) -> SnapshotResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?, username))
    }

    fn from_connection(conn: Connection, username: &str) -> Self {
        Self {
            conn: Mutex::new(conn),
            namespace: snapshot_namespace(username),
        }
    }

    pub fn namespace(&self) -> &str {
        self.namespace.as_str()
    }

    /// Lists every cached identity in this database.
    pub fn list_summaries(&self) -> SnapshotResult<Vec<SnapshotSummary>> {
        let conn = self.conn.lock().map_err(|_| SnapshotError::Poisoned)?;
        let mut stmt = conn.prepare(
            "SELECT namespace, project_count, saved_at
             FROM session_snapshots
             ORDER BY saved_at DESC, namespace ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut summaries = Vec::new();
        while let Some(row) = rows.next()? {
            summaries.push(SnapshotSummary {
                namespace: row.get(0)?,
                project_count: row.get(1)?,
                saved_at: row.get(2)?,
            });
        }
        Ok(summaries)
    }
}

impl SnapshotRepository for SqliteSnapshotRepository {
    fn save(&self, snapshot: &Snapshot) -> SnapshotResult<()> {
        let payload = serde_json::to_string(snapshot).map_err(SnapshotError::Encode)?;
        let conn = self.conn.lock().map_err(|_| SnapshotError::Poisoned)?;
        conn.execute(
            "INSERT INTO session_snapshots (
                namespace,
                schema_version,
                payload,
                saved_at,
                project_count
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(namespace) DO UPDATE SET
                schema_version = excluded.schema_version,
                payload = excluded.payload,
                saved_at = excluded.saved_at,
                project_count = excluded.project_count;",
            params![
                self.namespace.as_str(),
                SNAPSHOT_SCHEMA_VERSION,
                payload,
                snapshot.captured_at,
                snapshot.projects.len() as i64,
            ],
        )?;
        Ok(())
    }

    fn load(&self) -> SnapshotResult<Option<Snapshot>> {
        let conn = self.conn.lock().map_err(|_| SnapshotError::Poisoned)?;
        let row: Option<(u32, String)> = conn
            .query_row(
                "SELECT schema_version, payload
                 FROM session_snapshots
                 WHERE namespace = ?1;",
                [self.namespace.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((schema_version, payload)) = row else {
            return Ok(None);
        };
        if schema_version != SNAPSHOT_SCHEMA_VERSION {
            warn!(
                "event=snapshot_load module=repo status=skip reason=schema_mismatch namespace={} found={} expected={}",
                self.namespace, schema_version, SNAPSHOT_SCHEMA_VERSION
            );
            return Ok(None);
        }

        match serde_json::from_str::<Snapshot>(&payload) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(err) => {
                warn!(
                    "event=snapshot_load module=repo status=skip reason=corrupt_payload namespace={} error={}",
                    self.namespace, err
                );
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::snapshot_namespace;

    #[test]
    fn namespace_collapses_unsafe_runs() {
        assert_eq!(snapshot_namespace("alice"), "alice");
        assert_eq!(snapshot_namespace("a.l i@ce"), "a-l-i-ce");
        assert_eq!(snapshot_namespace("bob_smith-2"), "bob_smith-2");
        assert_eq!(snapshot_namespace("  ../etc  "), "-etc");
    }
}
