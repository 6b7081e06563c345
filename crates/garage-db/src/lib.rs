//! # garage-db: Local Snapshot Cache for Garage Desk
//!
//! Durable, key-per-collection storage on SQLite. It is a mirror, never the
//! primary read path while the process is alive.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Garage Desk Data Flow                             │
//! │                                                                         │
//! │  GarageStore::save_job(job)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     garage-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │ CacheRepository│    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│  write(key, T) │    │  (embedded)  │  │   │
//! │  │   │  SqlitePool   │    │  read(key)     │    │ 001_cache... │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  SQLite file: cache_snapshots(key, payload, item_count, ...)    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Snapshot cache repository and cache keys
//!
//! ## Usage
//!
//! ```rust,ignore
//! use garage_db::{keys, Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("garage-cache.db")).await?;
//! db.cache().write(keys::JOBS, &jobs).await?;
//! let cached: Option<Vec<Job>> = db.cache().read(keys::JOBS).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{CacheLocation, Database, DbConfig};

pub use repository::cache::{keys, CacheEntry, CacheRepository};
