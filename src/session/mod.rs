//! Session storage for conversation history
//!
//! Sessions are ordered lists of role-tagged messages keyed by an opaque
//! session id. The store is two-tiered behind one interface: a durable
//! SQLite tier, and an in-process map used when the durable tier is
//! unavailable or fails mid-operation. Fallback data is lost on process
//! restart; that degradation is accepted and logged, not hidden.
//!
//! Sessions are keyed by id alone, so ownership is enforced here: loading
//! or appending to a session owned by another user fails with an
//! authentication error instead of leaking history.

use crate::config::SessionConfig;
use crate::error::{Result, VoxcrmError};
use crate::providers::Message;
use anyhow::Context;
use chrono::Utc;
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// Durable session tier backed by SQLite
pub struct SqliteSessionStore {
    db_path: PathBuf,
}

impl SqliteSessionStore {
    /// Opens the store at the default platform data directory
    pub fn new() -> Result<Self> {
        let proj_dirs = ProjectDirs::from("com", "voxcrm", "voxcrm")
            .ok_or_else(|| VoxcrmError::Storage("Could not determine data directory".into()))?;

        let data_dir = proj_dirs.data_dir();
        std::fs::create_dir_all(data_dir)
            .context("Failed to create data directory")
            .map_err(|e| VoxcrmError::Storage(e.to_string()))?;

        Self::new_with_path(data_dir.join("sessions.db"))
    }

    /// Opens the store at a specific database path
    ///
    /// Primarily useful for tests pointing the store at a temporary
    /// directory.
    ///
    /// # Examples
    ///
    /// ```
    /// use voxcrm::session::SqliteSessionStore;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let store = SqliteSessionStore::new_with_path(dir.path().join("sessions.db")).unwrap();
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create parent directory for database")
                .map_err(|e| VoxcrmError::Storage(e.to_string()))?;
        }

        let store = Self { db_path };
        store.init()?;
        Ok(store)
    }

    /// Initializes the database schema
    fn init(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                messages JSON NOT NULL
            )",
            [],
        )
        .context("Failed to create tables")
        .map_err(|e| VoxcrmError::Storage(e.to_string()))?;

        Ok(())
    }

    fn connect(&self) -> Result<Connection> {
        Connection::open(&self.db_path)
            .context("Failed to open database")
            .map_err(|e| VoxcrmError::Storage(e.to_string()).into())
    }

    /// Loads a session's messages, enforcing ownership
    ///
    /// A missing session is not an error; it is created lazily on first
    /// append and loads as an empty history.
    pub fn load(&self, session_id: &str, user_id: &str) -> Result<Vec<Message>> {
        let conn = self.connect()?;

        let row = conn
            .query_row(
                "SELECT user_id, messages FROM sessions WHERE id = ?",
                params![session_id],
                |row| {
                    let owner: String = row.get(0)?;
                    let messages_json: String = row.get(1)?;
                    Ok((owner, messages_json))
                },
            )
            .optional()
            .context("Failed to query session")
            .map_err(|e| VoxcrmError::Storage(e.to_string()))?;

        match row {
            Some((owner, messages_json)) => {
                if owner != user_id {
                    return Err(VoxcrmError::Auth(
                        "session does not belong to this user".to_string(),
                    )
                    .into());
                }
                let messages: Vec<Message> = serde_json::from_str(&messages_json)
                    .context("Failed to deserialize session messages")
                    .map_err(|e| VoxcrmError::Storage(e.to_string()))?;
                Ok(messages)
            }
            None => Ok(Vec::new()),
        }
    }

    /// Appends messages to a session, enforcing ownership
    ///
    /// The whole read-modify-write runs in one transaction so concurrent
    /// appends to the same session id cannot interleave messages.
    pub fn append(&self, session_id: &str, user_id: &str, new_messages: &[Message]) -> Result<()> {
        let mut conn = self.connect()?;
        let now = Utc::now().to_rfc3339();

        let tx = conn
            .transaction()
            .context("Failed to start transaction")
            .map_err(|e| VoxcrmError::Storage(e.to_string()))?;

        let existing = tx
            .query_row(
                "SELECT user_id, messages FROM sessions WHERE id = ?",
                params![session_id],
                |row| {
                    let owner: String = row.get(0)?;
                    let messages_json: String = row.get(1)?;
                    Ok((owner, messages_json))
                },
            )
            .optional()
            .context("Failed to query session")
            .map_err(|e| VoxcrmError::Storage(e.to_string()))?;

        match existing {
            Some((owner, messages_json)) => {
                if owner != user_id {
                    return Err(VoxcrmError::Auth(
                        "session does not belong to this user".to_string(),
                    )
                    .into());
                }

                let mut messages: Vec<Message> = serde_json::from_str(&messages_json)
                    .context("Failed to deserialize session messages")
                    .map_err(|e| VoxcrmError::Storage(e.to_string()))?;
                messages.extend_from_slice(new_messages);

                let messages_json = serde_json::to_string(&messages)
                    .map_err(|e| VoxcrmError::Storage(e.to_string()))?;
                tx.execute(
                    "UPDATE sessions SET updated_at = ?, messages = ? WHERE id = ?",
                    params![now, messages_json, session_id],
                )
                .context("Failed to update session")
                .map_err(|e| VoxcrmError::Storage(e.to_string()))?;
            }
            None => {
                let messages_json = serde_json::to_string(new_messages)
                    .map_err(|e| VoxcrmError::Storage(e.to_string()))?;
                tx.execute(
                    "INSERT INTO sessions (id, user_id, created_at, updated_at, messages)
                     VALUES (?, ?, ?, ?, ?)",
                    params![session_id, user_id, now, now, messages_json],
                )
                .context("Failed to insert session")
                .map_err(|e| VoxcrmError::Storage(e.to_string()))?;
            }
        }

        tx.commit()
            .context("Failed to commit transaction")
            .map_err(|e| VoxcrmError::Storage(e.to_string()))?;

        Ok(())
    }
}

/// In-process session tier used when the durable tier is unavailable
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, (String, Vec<Message>)>>,
}

impl MemorySessionStore {
    /// Creates an empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a session's messages, enforcing ownership
    pub fn load(&self, session_id: &str, user_id: &str) -> Result<Vec<Message>> {
        let sessions = self.sessions.lock().unwrap();
        match sessions.get(session_id) {
            Some((owner, messages)) => {
                if owner != user_id {
                    return Err(VoxcrmError::Auth(
                        "session does not belong to this user".to_string(),
                    )
                    .into());
                }
                Ok(messages.clone())
            }
            None => Ok(Vec::new()),
        }
    }

    /// Appends messages to a session, enforcing ownership
    pub fn append(&self, session_id: &str, user_id: &str, new_messages: &[Message]) -> Result<()> {
        let mut sessions = self.sessions.lock().unwrap();
        let entry = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| (user_id.to_string(), Vec::new()));

        if entry.0 != user_id {
            return Err(
                VoxcrmError::Auth("session does not belong to this user".to_string()).into(),
            );
        }

        entry.1.extend_from_slice(new_messages);
        Ok(())
    }
}

/// Two-tier session store: durable SQLite with in-memory fallback
///
/// The durable tier is chosen at startup when it can be opened; any
/// operation that fails on it (other than an ownership rejection) is
/// retried on the in-memory tier so the agent stays functional in
/// degraded mode.
pub struct TieredSessionStore {
    primary: Option<SqliteSessionStore>,
    fallback: MemorySessionStore,
}

impl TieredSessionStore {
    /// Opens the store per configuration
    ///
    /// A failure to open the durable tier logs a warning and leaves the
    /// store running purely in memory.
    pub fn open(config: &SessionConfig) -> Self {
        let primary = match &config.db_path {
            Some(path) => SqliteSessionStore::new_with_path(path),
            None => SqliteSessionStore::new(),
        };

        let primary = match primary {
            Ok(store) => Some(store),
            Err(e) => {
                tracing::warn!(
                    "Session database unavailable, falling back to in-memory store: {}",
                    e
                );
                None
            }
        };

        Self {
            primary,
            fallback: MemorySessionStore::new(),
        }
    }

    /// Creates a store with no durable tier (tests, degraded mode)
    pub fn in_memory() -> Self {
        Self {
            primary: None,
            fallback: MemorySessionStore::new(),
        }
    }

    /// Loads a session's messages in exact append order
    ///
    /// # Errors
    ///
    /// Returns `VoxcrmError::Auth` when the session belongs to another
    /// user; storage failures fall back to the in-memory tier.
    pub fn load(&self, session_id: &str, user_id: &str) -> Result<Vec<Message>> {
        if let Some(primary) = &self.primary {
            match primary.load(session_id, user_id) {
                Ok(messages) => return Ok(messages),
                Err(e) if is_auth_error(&e) => return Err(e),
                Err(e) => {
                    tracing::warn!("Durable session load failed, using fallback: {}", e);
                }
            }
        }
        self.fallback.load(session_id, user_id)
    }

    /// Appends messages to a session
    ///
    /// # Errors
    ///
    /// Returns `VoxcrmError::Auth` when the session belongs to another
    /// user; storage failures fall back to the in-memory tier.
    pub fn append(&self, session_id: &str, user_id: &str, new_messages: &[Message]) -> Result<()> {
        if let Some(primary) = &self.primary {
            match primary.append(session_id, user_id, new_messages) {
                Ok(()) => return Ok(()),
                Err(e) if is_auth_error(&e) => return Err(e),
                Err(e) => {
                    tracing::warn!("Durable session append failed, using fallback: {}", e);
                }
            }
        }
        self.fallback.append(session_id, user_id, new_messages)
    }
}

fn is_auth_error(error: &anyhow::Error) -> bool {
    matches!(error.downcast_ref::<VoxcrmError>(), Some(VoxcrmError::Auth(_)))
}
