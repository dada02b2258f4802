mod context;
mod error;
mod goals;
mod intents;
mod predicate;
mod schema;
mod tags;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Row};
use uuid::Uuid;

use crate::config::DatabaseConfig;

pub use context::RequestContext;
pub use error::{RepoError, RepoResult};
pub use goals::GoalRepository;
pub use intents::IntentRepository;
pub use predicate::{PredicateBuilder, Predicates};
pub use tags::normalize_tags;

/// How many SQLite VM instructions run between deadline checks.
const PROGRESS_INTERVAL: i32 = 1_000;

/// Shared connection handle injected into each repository.
///
/// Clones share one connection guarded by a mutex, which makes the handle a
/// bounded pool of size one: any number of threads may use it and statements
/// run one at a time.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf, config: &DatabaseConfig) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;

        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(config.busy_timeout)?;

        tracing::debug!(path = %path.display(), "opened database");
        Self::from_connection(conn)
    }

    /// Open the database named by `config`, or the platform default location.
    pub fn open_configured(config: &DatabaseConfig) -> Result<Self> {
        let path = match &config.path {
            Some(path) => path.clone(),
            None => default_path()?,
        };
        Self::open(path, config)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        predicate::register_case_fold(&conn).context("Failed to register SQL functions")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow::anyhow!("database lock poisoned"))?;
        schema::run_migrations(&conn)
    }

    /// Run `op` on the connection under `ctx`.
    ///
    /// Fails with [`RepoError::Interrupted`] without touching the database if
    /// `ctx` is already done, and aborts the running statement if `ctx` fires
    /// while it executes.
    pub(crate) fn with_conn<T>(
        &self,
        ctx: &RequestContext,
        op: impl FnOnce(&Connection) -> RepoResult<T>,
    ) -> RepoResult<T> {
        if ctx.is_done() {
            return Err(RepoError::Interrupted);
        }

        let conn = self.conn.lock().map_err(|_| RepoError::Unavailable)?;
        if ctx.is_done() {
            return Err(RepoError::Interrupted);
        }

        let watch = ctx.clone();
        conn.progress_handler(PROGRESS_INTERVAL, Some(move || watch.is_done()));
        let result = op(&conn);
        conn.progress_handler(0, None::<fn() -> bool>);

        result
    }
}

fn default_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "intent")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    Ok(dirs.data_dir().join("intent.db"))
}

/// Fixed-width RFC 3339 in UTC with nanoseconds, so stored timestamps sort
/// lexically in chronological order.
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(crate) fn read_uuid(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn read_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
