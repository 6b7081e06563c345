//! # Snapshot Cache Repository
//!
//! Key-per-collection storage of full JSON snapshots.
//!
//! ## Write-Through Mirror
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  mutation (save_job, delete_invoice, ...)                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  working set updated                                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  write(keys::JOBS, &all_jobs)   ← full snapshot, replaces the row      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  remote push                                                            │
//! │                                                                         │
//! │  startup with remote down:                                             │
//! │  read_list(keys::JOBS) ──► last snapshot, or [] if missing / corrupt   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reads never fail on bad data. A snapshot that doesn't parse is logged
//! and treated as absent; inside a list, rows that don't parse are skipped.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::DbResult;

/// Cache keys, one per collection.
///
/// The jobs and config keys match what earlier dashboard builds wrote, so
/// existing caches stay readable.
pub mod keys {
    pub const JOBS: &str = "autocare_flat_jobs";
    pub const CONFIG: &str = "autocare_config";
    pub const INVENTORY: &str = "autocare_inventory";
    pub const SUPPLIERS: &str = "autocare_suppliers";
    pub const INVOICES: &str = "autocare_invoices";
    pub const PURCHASES: &str = "autocare_purchases";
    pub const BRANCHES: &str = "autocare_branches";
}

/// Metadata of one stored snapshot.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CacheEntry {
    pub key: String,
    /// Array length for list snapshots, 1 for single records.
    pub item_count: i64,
    pub updated_at: DateTime<Utc>,
}

/// Repository for snapshot operations.
#[derive(Debug, Clone)]
pub struct CacheRepository {
    pool: SqlitePool,
}

impl CacheRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CacheRepository { pool }
    }

    /// Replaces the snapshot stored under `key`.
    ///
    /// ## Example
    /// ```rust,ignore
    /// db.cache().write(keys::INVENTORY, &items).await?;
    /// ```
    pub async fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> DbResult<()> {
        let json = serde_json::to_value(value)?;
        let item_count = match &json {
            Value::Array(items) => items.len() as i64,
            _ => 1,
        };
        let payload = serde_json::to_string(&json)?;

        sqlx::query(
            r#"
            INSERT INTO cache_snapshots (key, payload, item_count, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(key) DO UPDATE SET
                payload = excluded.payload,
                item_count = excluded.item_count,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(&payload)
        .bind(item_count)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        debug!(key = %key, items = item_count, "Cache snapshot written");
        Ok(())
    }

    /// Reads the snapshot under `key`.
    ///
    /// Returns `Ok(None)` when nothing is stored or the payload doesn't
    /// decode as `T`.
    pub async fn read<T: DeserializeOwned>(&self, key: &str) -> DbResult<Option<T>> {
        let Some(payload) = self.payload(key).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<T>(&payload) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(key = %key, error = %e, "Corrupt cache snapshot ignored");
                Ok(None)
            }
        }
    }

    /// Reads a list snapshot, keeping every row that decodes.
    ///
    /// Missing or non-list snapshots read as empty.
    pub async fn read_list<T: DeserializeOwned>(&self, key: &str) -> DbResult<Vec<T>> {
        let Some(Value::Array(rows)) = self.read::<Value>(key).await? else {
            return Ok(Vec::new());
        };

        let total = rows.len();
        let items: Vec<T> = rows
            .into_iter()
            .filter_map(|row| serde_json::from_value(row).ok())
            .collect();

        if items.len() < total {
            warn!(
                key = %key,
                skipped = total - items.len(),
                "Skipped unreadable rows in cache snapshot"
            );
        }

        Ok(items)
    }

    async fn payload(&self, key: &str) -> DbResult<Option<String>> {
        let payload: Option<String> =
            sqlx::query_scalar("SELECT payload FROM cache_snapshots WHERE key = ?1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(payload)
    }

    /// Metadata for every stored snapshot, ordered by key.
    pub async fn entries(&self) -> DbResult<Vec<CacheEntry>> {
        let entries = sqlx::query_as::<_, CacheEntry>(
            "SELECT key, item_count, updated_at FROM cache_snapshots ORDER BY key",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    /// Deletes one snapshot. Returns whether it existed.
    pub async fn remove(&self, key: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM cache_snapshots WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Deletes every snapshot. Returns how many were removed.
    pub async fn clear(&self) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM cache_snapshots")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cache_snapshots")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use garage_core::{InventoryItem, Job, ShopConfig};
    use serde_json::json;

    async fn repo() -> CacheRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().cache()
    }

    #[tokio::test]
    async fn test_missing_key_reads_empty() {
        let cache = repo().await;
        assert_eq!(cache.read::<ShopConfig>(keys::CONFIG).await.unwrap(), None);
        assert!(cache.read_list::<Job>(keys::JOBS).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_replaces_snapshot() {
        let cache = repo().await;
        let first = vec![InventoryItem::new("Engine Oil", "Fluids")];
        let second = vec![
            InventoryItem::new("Brake Pad", "Brakes"),
            InventoryItem::new("Air Filter", "Filters"),
        ];

        cache.write(keys::INVENTORY, &first).await.unwrap();
        cache.write(keys::INVENTORY, &second).await.unwrap();

        let stored: Vec<InventoryItem> = cache.read_list(keys::INVENTORY).await.unwrap();
        assert_eq!(stored, second);
        assert_eq!(cache.count().await.unwrap(), 1);

        let entries = cache.entries().await.unwrap();
        assert_eq!(entries[0].key, keys::INVENTORY);
        assert_eq!(entries[0].item_count, 2);
    }

    #[tokio::test]
    async fn test_single_record_snapshot() {
        let cache = repo().await;
        let config = ShopConfig {
            group_invite_link: "https://chat.whatsapp.com/xyz".into(),
            ..Default::default()
        };

        cache.write(keys::CONFIG, &config).await.unwrap();
        assert_eq!(cache.read::<ShopConfig>(keys::CONFIG).await.unwrap(), Some(config));
        assert_eq!(cache.entries().await.unwrap()[0].item_count, 1);
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_reads_as_absent() {
        let cache = repo().await;
        sqlx::query(
            "INSERT INTO cache_snapshots (key, payload, item_count, updated_at) VALUES (?1, '{not json', 0, ?2)",
        )
        .bind(keys::JOBS)
        .bind(Utc::now())
        .execute(&cache.pool)
        .await
        .unwrap();

        assert!(cache.read_list::<Job>(keys::JOBS).await.unwrap().is_empty());
        assert_eq!(cache.read::<Value>(keys::JOBS).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_bad_rows_are_skipped() {
        let cache = repo().await;
        let rows = json!([
            {"id": "oil", "name": "Engine Oil", "quantity": 3},
            {"id": "bad", "quantity": "lots"},
        ]);
        cache.write(keys::INVENTORY, &rows).await.unwrap();

        let items: Vec<InventoryItem> = cache.read_list(keys::INVENTORY).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "oil");
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let cache = repo().await;
        cache.write(keys::SUPPLIERS, &json!([])).await.unwrap();
        cache.write(keys::BRANCHES, &json!([])).await.unwrap();

        assert!(cache.remove(keys::SUPPLIERS).await.unwrap());
        assert!(!cache.remove(keys::SUPPLIERS).await.unwrap());
        assert_eq!(cache.clear().await.unwrap(), 1);
        assert_eq!(cache.count().await.unwrap(), 0);
    }
}
