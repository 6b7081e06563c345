//! # Cache Errors
//!
//! ```text
//! sqlx::Error / MigrateError / serde_json::Error
//!        │
//!        ▼
//!   DbError ──► SyncError::Cache (garage-sync), failing the mutation
//! ```
//!
//! A corrupt snapshot is not an error: [`crate::CacheRepository::read`]
//! logs it and reports nothing stored.

use thiserror::Error;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    /// The cache file couldn't be opened or created.
    ///
    /// ## When This Occurs
    /// - Parent directory missing or not writable
    /// - Disk full
    /// - Pool already closed
    #[error("Cannot open cache: {0}")]
    Open(String),

    #[error("Cache migration failed: {0}")]
    Migration(String),

    #[error("Cache query failed: {0}")]
    Query(String),

    /// Another writer held the file for longer than the busy timeout.
    #[error("Cache is busy")]
    Busy,

    /// A snapshot could not be encoded for storage.
    #[error("Cannot encode snapshot: {0}")]
    Encode(String),
}

impl DbError {
    /// True if the same call may succeed a moment later.
    pub fn is_transient(&self) -> bool {
        matches!(self, DbError::Busy)
    }
}

/// ```text
/// Database (SQLITE_BUSY / LOCKED) → Busy
/// Database (other)                → Query
/// PoolTimedOut                    → Busy
/// PoolClosed                      → Open
/// other                           → Query
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                if message.contains("database is locked") || message.contains("database table is locked") {
                    DbError::Busy
                } else {
                    DbError::Query(message)
                }
            }
            sqlx::Error::PoolTimedOut => DbError::Busy,
            sqlx::Error::PoolClosed => DbError::Open("pool is closed".to_string()),
            other => DbError::Query(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::Migration(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Encode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_errors_map_to_kinds() {
        assert!(matches!(DbError::from(sqlx::Error::PoolTimedOut), DbError::Busy));
        assert!(matches!(DbError::from(sqlx::Error::PoolClosed), DbError::Open(_)));
        assert!(DbError::Busy.is_transient());
        assert!(!DbError::Query("no such table".into()).is_transient());
    }
}
