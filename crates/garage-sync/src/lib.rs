//! # garage-sync: Working Set & Remote Sync for Garage Desk
//!
//! Keeps three copies of the workshop's data in step: the in-memory working
//! set every read is served from, the local SQLite cache used when the
//! remote can't be reached, and the remote table store.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          GarageStore (store.rs)                         │
//! │                                                                         │
//! │   reads ─────────► WorkingSet ◄───────── mutations                      │
//! │   (views, lists)   (working_set.rs)        │                            │
//! │                                            ├──► CacheRepository         │
//! │                                            │    (garage-db, snapshots)  │
//! │                                            │                            │
//! │                                            └──► RemoteAdapter           │
//! │                                                 (remote/)               │
//! │                                                  │ fails                │
//! │                                                  ▼                      │
//! │                                            PendingQueue (pending.rs)    │
//! │                                                                         │
//! │   job → Completed ──► Notifier (notify.rs)                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`store`] - `GarageStore`: init, reads, views, mutations
//! - [`working_set`] - In-memory collections and the `Record` trait
//! - [`remote`] - Backend trait, PostgREST and in-process backends
//! - [`pending`] - Failed remote pushes awaiting replay
//! - [`notify`] - Customer notification hook
//! - [`config`] - `GarageConfig` (TOML + env)
//! - [`error`] - Sync error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use garage_db::{Database, DbConfig};
//! use garage_sync::{GarageConfig, GarageStore, RestBackend, StoreOptions};
//!
//! let config = GarageConfig::load_or_default(None);
//! let db = Database::new(DbConfig::new(config.cache_path())).await?;
//! let backend = RestBackend::from_config(&config)?.expect("remote.url set");
//!
//! let store = GarageStore::init(&db, Arc::new(backend), StoreOptions::from_config(&config)).await;
//! println!("{:?}", store.state());
//!
//! let job = store.save_job_draft(draft).await?;
//! store.update_job_status(&job.id, JobStatus::Completed).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod notify;
pub mod pending;
pub mod remote;
pub mod store;
pub mod working_set;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{CacheSettings, GarageConfig, OutreachSettings, RemoteSettings};
pub use error::{SyncError, SyncResult};
pub use notify::{NoOpNotifier, Notifier, TracingNotifier};
pub use pending::{PendingOp, PendingWrite, MAX_RETRY_ATTEMPTS};
pub use remote::{MemoryBackend, RemoteAdapter, RemoteBackend, RestBackend, Table};
pub use store::{GarageStore, RetryReport, StoreOptions, SyncState};
pub use working_set::{Collections, Record};
