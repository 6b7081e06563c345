//! # Pending Writes
//!
//! Remote pushes that failed, kept so the caller can replay them later.
//!
//! ## Queue Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       PendingQueue (by table, id)                       │
//! │                                                                         │
//! │  push fails ──────────► record_failure()                                │
//! │                          • no entry:        insert, attempts = 1        │
//! │                          • Upsert + Update: merge fields into Upsert    │
//! │                          • otherwise:       newest op replaces, 1       │
//! │                                                                         │
//! │  push succeeds ───────► clear()            (entry for the key is gone)  │
//! │                                                                         │
//! │  retry_pending():                                                       │
//! │    entries with attempts < 10 are replayed once                         │
//! │      ok   ─► clear_if_seq()       (unless re-queued meanwhile)          │
//! │      fail ─► record_retry_failure() (attempts += 1)                     │
//! │    entries at 10 attempts are logged and skipped                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here retries on its own.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::remote::Table;

// =============================================================================
// Constants
// =============================================================================

/// Replays after which an entry is skipped rather than retried.
pub const MAX_RETRY_ATTEMPTS: u32 = 10;

// =============================================================================
// Types
// =============================================================================

/// What the failed push was trying to do.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "row")]
pub enum PendingOp {
    /// Full remote row.
    Upsert(Value),
    /// Partial fields for the row's id.
    Update(Value),
    Delete,
}

/// One queued write.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingWrite {
    pub table: Table,
    pub id: String,
    pub op: PendingOp,
    /// Failed pushes for this key, the original one included.
    pub attempts: u32,
    pub last_error: String,
    pub queued_at: DateTime<Utc>,
    /// Changes every time the entry is replaced.
    pub seq: u64,
}

impl PendingWrite {
    pub fn is_exhausted(&self) -> bool {
        self.attempts >= MAX_RETRY_ATTEMPTS
    }
}

// =============================================================================
// Queue
// =============================================================================

#[derive(Debug, Default)]
pub struct PendingQueue {
    entries: Mutex<HashMap<(Table, String), PendingWrite>>,
    next_seq: AtomicU64,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<(Table, String), PendingWrite>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Records a fresh failed push from a mutation.
    pub fn record_failure(&self, table: Table, id: &str, op: PendingOp, error: &str) {
        let seq = self.seq();
        let mut entries = self.lock();
        let key = (table, id.to_string());

        let op = match (entries.remove(&key).map(|e| e.op), op) {
            (Some(PendingOp::Upsert(mut row)), PendingOp::Update(fields)) => {
                if let (Value::Object(row_map), Value::Object(fields)) = (&mut row, fields) {
                    row_map.extend(fields);
                }
                PendingOp::Upsert(row)
            }
            (_, op) => op,
        };

        entries.insert(
            key,
            PendingWrite {
                table,
                id: id.to_string(),
                op,
                attempts: 1,
                last_error: error.to_string(),
                queued_at: Utc::now(),
                seq,
            },
        );
    }

    /// Counts another failed replay of the entry with this `seq`.
    pub fn record_retry_failure(&self, table: Table, id: &str, seq: u64, error: &str) {
        if let Some(entry) = self.lock().get_mut(&(table, id.to_string())) {
            if entry.seq == seq {
                entry.attempts += 1;
                entry.last_error = error.to_string();
            }
        }
    }

    /// Drops the entry for this key after a successful push.
    pub fn clear(&self, table: Table, id: &str) -> bool {
        self.lock().remove(&(table, id.to_string())).is_some()
    }

    /// Drops the entry only if it is still the one that was replayed.
    pub fn clear_if_seq(&self, table: Table, id: &str, seq: u64) -> bool {
        let mut entries = self.lock();
        let key = (table, id.to_string());
        if entries.get(&key).is_some_and(|e| e.seq == seq) {
            entries.remove(&key);
            true
        } else {
            false
        }
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> Vec<PendingWrite> {
        let mut all: Vec<PendingWrite> = self.lock().values().cloned().collect();
        all.sort_by_key(|e| e.seq);
        all
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_newest_failure_replaces() {
        let queue = PendingQueue::new();
        queue.record_failure(Table::Jobs, "j1", PendingOp::Upsert(json!({"id": "j1"})), "down");
        queue.record_failure(Table::Jobs, "j1", PendingOp::Delete, "still down");

        let entries = queue.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].op, PendingOp::Delete);
        assert_eq!(entries[0].attempts, 1);
        assert_eq!(entries[0].last_error, "still down");
    }

    #[test]
    fn test_update_merges_into_pending_upsert() {
        let queue = PendingQueue::new();
        queue.record_failure(
            Table::Jobs,
            "j1",
            PendingOp::Upsert(json!({"id": "j1", "status": "Received", "charges": 500.0})),
            "down",
        );
        queue.record_failure(Table::Jobs, "j1", PendingOp::Update(json!({"status": "Completed"})), "down");

        assert_eq!(
            queue.entries()[0].op,
            PendingOp::Upsert(json!({"id": "j1", "status": "Completed", "charges": 500.0}))
        );
    }

    #[test]
    fn test_keys_are_per_table() {
        let queue = PendingQueue::new();
        queue.record_failure(Table::Jobs, "x", PendingOp::Delete, "down");
        queue.record_failure(Table::Invoices, "x", PendingOp::Delete, "down");
        assert_eq!(queue.len(), 2);

        assert!(queue.clear(Table::Jobs, "x"));
        assert!(!queue.clear(Table::Jobs, "x"));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_retry_bookkeeping_respects_seq() {
        let queue = PendingQueue::new();
        queue.record_failure(Table::Suppliers, "s1", PendingOp::Delete, "down");
        let stale = queue.entries()[0].seq;

        queue.record_retry_failure(Table::Suppliers, "s1", stale, "again");
        assert_eq!(queue.entries()[0].attempts, 2);

        queue.record_failure(Table::Suppliers, "s1", PendingOp::Delete, "newer");
        assert!(!queue.clear_if_seq(Table::Suppliers, "s1", stale));
        assert_eq!(queue.entries()[0].attempts, 1);

        let current = queue.entries()[0].seq;
        assert!(queue.clear_if_seq(Table::Suppliers, "s1", current));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_exhaustion() {
        let queue = PendingQueue::new();
        queue.record_failure(Table::Branches, "b1", PendingOp::Delete, "down");
        let seq = queue.entries()[0].seq;
        for _ in 1..MAX_RETRY_ATTEMPTS {
            queue.record_retry_failure(Table::Branches, "b1", seq, "down");
        }
        assert!(queue.entries()[0].is_exhausted());
    }
}
