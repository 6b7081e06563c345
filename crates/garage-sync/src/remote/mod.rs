//! # Remote Store Adapter
//!
//! ## Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GarageStore                                                            │
//! │       │  fetch_all::<Job>()   upsert_row(..)   delete_row(..)          │
//! │       ▼                                                                 │
//! │  RemoteAdapter  ← typed records, column renames (schema.rs)            │
//! │       │  select_all("customers")   upsert("customers", row)            │
//! │       ▼                                                                 │
//! │  dyn RemoteBackend                                                     │
//! │       ├── RestBackend    PostgREST over HTTPS (rest.rs)                │
//! │       └── MemoryBackend  in-process tables (memory.rs)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Backends move untyped JSON rows. Every write either succeeds or returns
//! an error carrying the backend's message.

pub mod memory;
pub mod rest;
pub mod schema;

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use garage_core::{ShopConfig, SHOP_CONFIG_ID};

use crate::error::SyncResult;
use crate::working_set::Record;

pub use memory::MemoryBackend;
pub use rest::RestBackend;
pub use schema::Table;

// =============================================================================
// Backend Trait
// =============================================================================

/// A tabular store with one table per collection, rows keyed by `id`.
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    /// Every row of `table`.
    async fn select_all(&self, table: &str) -> SyncResult<Vec<Value>>;

    /// The row with this id, if any.
    async fn select_one(&self, table: &str, id: &str) -> SyncResult<Option<Value>>;

    /// Insert, or merge into the row with the same `id`.
    async fn upsert(&self, table: &str, row: Value) -> SyncResult<()>;

    /// Set `fields` on the row with this id. No row is not an error.
    async fn update(&self, table: &str, id: &str, fields: Value) -> SyncResult<()>;

    /// Delete the row with this id. No row is not an error.
    async fn delete(&self, table: &str, id: &str) -> SyncResult<()>;
}

// =============================================================================
// Typed Adapter
// =============================================================================

/// Typed access to a [`RemoteBackend`].
#[derive(Clone)]
pub struct RemoteAdapter {
    backend: Arc<dyn RemoteBackend>,
}

impl RemoteAdapter {
    pub fn new(backend: Arc<dyn RemoteBackend>) -> Self {
        RemoteAdapter { backend }
    }

    /// All records of one collection.
    ///
    /// Rows that don't decode are logged and skipped; the fetch itself
    /// only fails when the backend does.
    pub async fn fetch_all<R: Record>(&self) -> SyncResult<Vec<R>> {
        let table = R::TABLE;
        let rows = self.backend.select_all(table.name()).await?;
        let total = rows.len();

        let records: Vec<R> = rows
            .into_iter()
            .filter_map(|row| {
                let id = row.get("id").cloned().unwrap_or(Value::Null);
                match serde_json::from_value(schema::from_remote(table, row)) {
                    Ok(record) => Some(record),
                    Err(e) => {
                        warn!(table = %table, id = %id, error = %e, "Skipping unreadable remote row");
                        None
                    }
                }
            })
            .collect();

        debug!(table = %table, fetched = total, kept = records.len(), "Fetched remote table");
        Ok(records)
    }

    /// The shop config row, if one has been saved.
    pub async fn fetch_config(&self) -> SyncResult<Option<ShopConfig>> {
        let row = self.backend.select_one(Table::Config.name(), SHOP_CONFIG_ID).await?;
        match row {
            Some(row) => Ok(Some(serde_json::from_value(row)?)),
            None => Ok(None),
        }
    }

    /// The remote row for a record.
    pub fn encode<R: Record>(record: &R) -> SyncResult<Value> {
        Ok(schema::to_remote(R::TABLE, serde_json::to_value(record)?))
    }

    /// The remote row for the shop config, with its fixed id.
    pub fn encode_config(config: &ShopConfig) -> SyncResult<Value> {
        let mut row = serde_json::to_value(config)?;
        if let Value::Object(map) = &mut row {
            map.insert("id".to_string(), json!(SHOP_CONFIG_ID));
        }
        Ok(row)
    }

    /// Sends an already-encoded row.
    pub async fn upsert_row(&self, table: Table, row: Value) -> SyncResult<()> {
        self.backend.upsert(table.name(), row).await
    }

    pub async fn update_fields(&self, table: Table, id: &str, fields: Value) -> SyncResult<()> {
        self.backend
            .update(table.name(), id, schema::to_remote(table, fields))
            .await
    }

    pub async fn delete_row(&self, table: Table, id: &str) -> SyncResult<()> {
        self.backend.delete(table.name(), id).await
    }
}
