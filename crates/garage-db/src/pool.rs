//! # Cache Database
//!
//! Opens the SQLite file behind the snapshot cache.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GarageConfig.cache.path ──► DbConfig::new(path)                        │
//! │                                   │                                     │
//! │                                   ▼                                     │
//! │  Database::new(config) ── open pool ── apply migrations                 │
//! │                                   │                                     │
//! │                                   ▼                                     │
//! │  db.cache() ──► CacheRepository        (shares the pool)                │
//! │                                   │                                     │
//! │                                   ▼                                     │
//! │  db.close()                                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! File caches run in WAL mode so `garage-report` can read while a
//! dashboard session writes. Tests use [`CacheLocation::Memory`], which
//! lives exactly as long as the pool's single connection.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::cache::CacheRepository;

/// How long a writer waits on a locked file before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// =============================================================================
// Configuration
// =============================================================================

/// Where the cache lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLocation {
    /// A file, created on first open.
    File(PathBuf),
    /// Private to one pool; gone when it closes.
    Memory,
}

/// Cache database settings.
///
/// ## Example
/// ```rust
/// use garage_db::DbConfig;
///
/// let config = DbConfig::new("/tmp/garage-cache.db").max_connections(2);
/// assert_eq!(config.max_connections, 2);
/// assert!(!config.is_in_memory());
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub location: CacheLocation,

    /// Default: 4. Always 1 in memory, where each connection would
    /// otherwise see its own empty database.
    pub max_connections: u32,

    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            location: CacheLocation::File(path.into()),
            max_connections: 4,
            run_migrations: true,
        }
    }

    /// A throwaway cache for tests.
    pub fn in_memory() -> Self {
        DbConfig {
            location: CacheLocation::Memory,
            max_connections: 1,
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    pub fn is_in_memory(&self) -> bool {
        self.location == CacheLocation::Memory
    }

    fn connect_options(&self) -> SqliteConnectOptions {
        match &self.location {
            CacheLocation::Memory => SqliteConnectOptions::new().in_memory(true),
            CacheLocation::File(path) => SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
                .busy_timeout(BUSY_TIMEOUT),
        }
    }

    fn pool_options(&self) -> SqlitePoolOptions {
        let options = SqlitePoolOptions::new().min_connections(1);
        match self.location {
            CacheLocation::Memory => options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None),
            CacheLocation::File(_) => options
                .max_connections(self.max_connections.max(1))
                .idle_timeout(Some(Duration::from_secs(600))),
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Handle to the cache database. Cloning shares the pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the cache, creating the file and schema if needed.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(location = ?config.location, "Opening cache database");

        let pool = config
            .pool_options()
            .connect_with(config.connect_options())
            .await
            .map_err(|e| DbError::Open(e.to_string()))?;

        let db = Database { pool };
        if config.run_migrations {
            db.run_migrations().await?;
        }
        Ok(db)
    }

    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// The snapshot repository.
    ///
    /// ```rust,ignore
    /// db.cache().write(keys::JOBS, &jobs).await?;
    /// ```
    pub fn cache(&self) -> CacheRepository {
        CacheRepository::new(self.pool.clone())
    }

    /// Closes the pool. Repository calls fail afterwards.
    pub async fn close(&self) {
        info!("Closing cache database");
        self.pool.close().await;
    }

    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}
