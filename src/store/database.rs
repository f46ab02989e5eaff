//! SQLite database handle
//!
//! The handle is opened once at process start and closed on shutdown. All
//! SQL runs on the blocking pool through [`Database::call`].

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use tracing::debug;

use super::errors::{StoreError, StoreResult};

const SCHEMA_VERSION: &str = "1";

/// Shared, closable SQLite connection
#[derive(Debug, Clone)]
pub struct Database {
    inner: Arc<Mutex<Option<Connection>>>,
    location: String,
}

impl Database {
    /// Opens (creating if needed) the database file and applies migrations.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        Self::from_connection(conn, path.display().to_string())
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, ":memory:".to_string())
    }

    fn from_connection(conn: Connection, location: String) -> StoreResult<Self> {
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        migrate(&conn)?;
        debug!(location = %location, "database opened");

        Ok(Self {
            inner: Arc::new(Mutex::new(Some(conn))),
            location,
        })
    }

    /// Path or `:memory:`
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Runs `f` against the connection on the blocking pool.
    pub async fn call<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let mut guard = inner
                .lock()
                .map_err(|_| StoreError::Task("database mutex poisoned".to_string()))?;
            let conn = guard.as_mut().ok_or(StoreError::Closed)?;
            f(conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }

    pub fn is_open(&self) -> bool {
        self.inner.lock().map(|guard| guard.is_some()).unwrap_or(false)
    }

    /// Closes the connection. Later calls fail with [`StoreError::Closed`].
    pub async fn close(&self) -> StoreResult<()> {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let mut guard = inner
                .lock()
                .map_err(|_| StoreError::Task("database mutex poisoned".to_string()))?;
            match guard.take() {
                Some(conn) => conn.close().map_err(|(_, e)| StoreError::Sqlite(e)),
                None => Ok(()),
            }
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

/// Default database file under a data directory
pub fn default_database_path(data_dir: &Path) -> PathBuf {
    data_dir.join("surveys.db")
}

fn migrate(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS meta (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS surveys (
          id TEXT PRIMARY KEY,
          patient_id TEXT NOT NULL,
          study_id TEXT NOT NULL,
          completed_at TEXT NOT NULL,
          metadata TEXT NOT NULL DEFAULT '{}',
          created_at TEXT NOT NULL,
          version INTEGER NOT NULL DEFAULT 1,
          status TEXT NOT NULL DEFAULT 'completed'
            CHECK (status IN ('in_progress', 'completed', 'abandoned')),
          UNIQUE (patient_id, study_id, version)
        );

        CREATE INDEX IF NOT EXISTS idx_surveys_study_completed
          ON surveys(study_id, completed_at DESC);

        CREATE TABLE IF NOT EXISTS responses (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          survey_id TEXT NOT NULL REFERENCES surveys(id) ON DELETE CASCADE,
          question_id INTEGER NOT NULL CHECK (question_id >= 1),
          question TEXT NOT NULL,
          answer TEXT NOT NULL,
          response_type TEXT NOT NULL
            CHECK (response_type IN ('text', 'number', 'boolean', 'scale', 'multiple_choice', 'checkbox')),
          UNIQUE (survey_id, question_id)
        );

        CREATE INDEX IF NOT EXISTS idx_responses_survey
          ON responses(survey_id, question_id);

        CREATE TABLE IF NOT EXISTS study_configs (
          study_id TEXT PRIMARY KEY,
          config TEXT NOT NULL,
          updated_at TEXT NOT NULL
        );
        "#,
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO meta(key, value) VALUES ('schema_version', ?1)",
        [SCHEMA_VERSION],
    )?;
    Ok(())
}
