//! # In-Process Backend
//!
//! Tables held in memory, with switchable failures. Used for tests and for
//! running offline with no remote configured.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{SyncError, SyncResult};
use crate::remote::RemoteBackend;

/// In-memory tables keyed by name; rows keyed by their `id` field.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    write_attempts: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose every call fails, for running without a remote.
    pub fn unreachable() -> Self {
        let backend = Self::new();
        backend.fail_reads();
        backend.fail_writes();
        backend
    }

    /// Seeds a table.
    pub fn with_rows(self, table: &str, rows: Vec<Value>) -> Self {
        self.lock().insert(table.to_string(), rows);
        self
    }

    /// Makes every select fail until [`MemoryBackend::heal`].
    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    /// Makes every write fail until [`MemoryBackend::heal`].
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    pub fn heal(&self) {
        self.fail_reads.store(false, Ordering::SeqCst);
        self.fail_writes.store(false, Ordering::SeqCst);
    }

    /// Current rows of a table.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.lock().get(table).cloned().unwrap_or_default()
    }

    /// Writes attempted so far, failed ones included.
    pub fn write_attempts(&self) -> usize {
        self.write_attempts.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<Value>>> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_read(&self, table: &str) -> SyncResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(SyncError::ConnectionFailed(format!("{} unreachable", table)));
        }
        Ok(())
    }

    fn check_write(&self, table: &str) -> SyncResult<()> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SyncError::ConnectionFailed(format!("{} unreachable", table)));
        }
        Ok(())
    }
}

fn row_id(row: &Value) -> Option<&str> {
    row.get("id").and_then(Value::as_str)
}

/// Copies every field of `patch` onto `target`.
fn merge(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                target.insert(key, value);
            }
        }
        (target, patch) => *target = patch,
    }
}

#[async_trait]
impl RemoteBackend for MemoryBackend {
    async fn select_all(&self, table: &str) -> SyncResult<Vec<Value>> {
        self.check_read(table)?;
        Ok(self.rows(table))
    }

    async fn select_one(&self, table: &str, id: &str) -> SyncResult<Option<Value>> {
        self.check_read(table)?;
        Ok(self
            .lock()
            .get(table)
            .and_then(|rows| rows.iter().find(|row| row_id(row) == Some(id)).cloned()))
    }

    async fn upsert(&self, table: &str, row: Value) -> SyncResult<()> {
        self.check_write(table)?;
        let id = row_id(&row)
            .map(str::to_string)
            .ok_or_else(|| SyncError::Remote {
                table: table.to_string(),
                status: 400,
                message: "row has no id".to_string(),
            })?;

        let mut tables = self.lock();
        let rows = tables.entry(table.to_string()).or_default();
        match rows.iter_mut().find(|existing| row_id(existing) == Some(id.as_str())) {
            Some(existing) => merge(existing, row),
            None => rows.push(row),
        }
        Ok(())
    }

    async fn update(&self, table: &str, id: &str, fields: Value) -> SyncResult<()> {
        self.check_write(table)?;
        let mut tables = self.lock();
        if let Some(existing) = tables
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|row| row_id(row) == Some(id)))
        {
            merge(existing, fields);
        }
        Ok(())
    }

    async fn delete(&self, table: &str, id: &str) -> SyncResult<()> {
        self.check_write(table)?;
        if let Some(rows) = self.lock().get_mut(table) {
            rows.retain(|row| row_id(row) != Some(id));
        }
        Ok(())
    }
}
