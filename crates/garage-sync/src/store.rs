//! # Garage Store
//!
//! The one object the dashboard talks to. It owns the working set, keeps
//! the local cache in step with it and pushes every change to the remote.
//!
//! ## Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GarageStore::init                                                      │
//! │                                                                         │
//! │   tokio::join!(jobs, inventory, suppliers, invoices,                    │
//! │                purchases, branches, config)                             │
//! │        │                                                                │
//! │        ├── all ok ──► working set = remote  ──► refresh local cache     │
//! │        │              SyncState::RemoteSynced                           │
//! │        │                                                                │
//! │        └── any err ─► working set = local cache (missing → empty)       │
//! │                       SyncState::CacheFallback { reason }               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Mutations
//! ```text
//!   save_x(record)
//!     1. id assigned if blank
//!     2. working set: replace by id, else append
//!     3. local cache: whole collection written, one writer at a time,
//!        snapshot taken once the writer holds the lock
//!     4. remote: upsert (purchases: purchase + touched inventory, concurrent)
//!     5. remote error ─► returned, recorded in the pending queue
//!                        working set and cache keep the change
//! ```
//!
//! Reads never touch I/O; they are served from the working set.
//! Concurrent sessions writing the same id are last-write-wins. Nothing
//! detects the lost update.

use chrono::{NaiveDate, Utc};
use futures_util::future::join_all;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use garage_core::inventory::{self, apply_stock_deltas, generate_purchase_no, stock_deltas};
use garage_core::outreach::{self, OutboundMessage};
use garage_core::views::{
    self, CustomerHistory, DashboardStats, DateRange, JobFilter, Report, ReportFilter, VisitStats,
};
use garage_core::{
    new_id, today, Branch, Customer, InventoryItem, Invoice, Job, JobDraft, JobStatus, Purchase,
    ShopConfig, Supplier, DEFAULT_COUNTRY_CODE, SHOP_CONFIG_ID,
};
use garage_db::{CacheRepository, Database};

use crate::config::GarageConfig;
use crate::error::{SyncError, SyncResult};
use crate::notify::{Notifier, TracingNotifier};
use crate::pending::{PendingOp, PendingQueue, PendingWrite};
use crate::remote::{schema, RemoteAdapter, RemoteBackend, Table};
use crate::working_set::{Collections, Record, WorkingSet};

// =============================================================================
// Options & State
// =============================================================================

/// Store settings that don't come from the data itself.
#[derive(Clone)]
pub struct StoreOptions {
    /// Prefixed to bare 10-digit mobiles in outgoing messages.
    pub country_code: String,
    pub notifier: Arc<dyn Notifier>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        StoreOptions {
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
            notifier: Arc::new(TracingNotifier),
        }
    }
}

impl StoreOptions {
    pub fn from_config(config: &GarageConfig) -> Self {
        StoreOptions {
            country_code: config.country_code().to_string(),
            ..Default::default()
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }
}

/// Where the working set came from at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum SyncState {
    RemoteSynced,
    CacheFallback { reason: String },
}

impl SyncState {
    pub fn is_remote_synced(&self) -> bool {
        matches!(self, SyncState::RemoteSynced)
    }
}

/// Outcome of [`GarageStore::retry_pending`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RetryReport {
    pub succeeded: usize,
    pub failed: usize,
    /// Entries past the attempt limit, left untouched.
    pub skipped: usize,
}

// =============================================================================
// Store
// =============================================================================

pub struct GarageStore {
    working: WorkingSet,
    cache: CacheRepository,
    /// Held for every cache write so a stale snapshot can't land last.
    cache_writer: Mutex<()>,
    remote: RemoteAdapter,
    pending: PendingQueue,
    options: StoreOptions,
    state: SyncState,
}

impl GarageStore {
    /// Loads every collection, from the remote if it answers, otherwise
    /// from the local cache. Never fails; check [`GarageStore::state`].
    pub async fn init(db: &Database, backend: Arc<dyn RemoteBackend>, options: StoreOptions) -> Self {
        let cache = db.cache();
        let remote = RemoteAdapter::new(backend);

        let (collections, state) = match pull(&remote).await {
            Ok(collections) => (collections, SyncState::RemoteSynced),
            Err(e) => {
                warn!(error = %e, "Remote store unavailable, loading from local cache");
                let reason = e.message();
                (load_cached(&cache).await, SyncState::CacheFallback { reason })
            }
        };

        let store = GarageStore {
            working: WorkingSet::new(collections),
            cache,
            cache_writer: Mutex::new(()),
            remote,
            pending: PendingQueue::new(),
            options,
            state,
        };

        if store.state.is_remote_synced() {
            store.refresh_cache().await;
        }

        store.working.with(|set| {
            info!(
                state = ?store.state,
                jobs = set.jobs.len(),
                inventory = set.inventory.len(),
                invoices = set.invoices.len(),
                purchases = set.purchases.len(),
                "Garage store ready"
            );
        });

        store
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    /// Writes every collection to the local cache. Failures are logged.
    async fn refresh_cache(&self) {
        let _writer = self.cache_writer.lock().await;
        let set = self.working.snapshot();
        let writes = [
            (Table::Jobs, self.cache.write(Table::Jobs.cache_key(), &set.jobs).await),
            (Table::Inventory, self.cache.write(Table::Inventory.cache_key(), &set.inventory).await),
            (Table::Suppliers, self.cache.write(Table::Suppliers.cache_key(), &set.suppliers).await),
            (Table::Invoices, self.cache.write(Table::Invoices.cache_key(), &set.invoices).await),
            (Table::Purchases, self.cache.write(Table::Purchases.cache_key(), &set.purchases).await),
            (Table::Branches, self.cache.write(Table::Branches.cache_key(), &set.branches).await),
            (Table::Config, self.cache.write(Table::Config.cache_key(), &set.config).await),
        ];
        for (table, result) in writes {
            if let Err(e) = result {
                warn!(table = %table, error = %e, "Failed to refresh local cache");
            }
        }
    }

    // =========================================================================
    // Collections
    // =========================================================================

    pub fn jobs(&self) -> Vec<Job> {
        self.working.list()
    }

    pub fn inventory(&self) -> Vec<InventoryItem> {
        self.working.list()
    }

    pub fn suppliers(&self) -> Vec<Supplier> {
        self.working.list()
    }

    pub fn invoices(&self) -> Vec<Invoice> {
        self.working.list()
    }

    pub fn purchases(&self) -> Vec<Purchase> {
        self.working.list()
    }

    pub fn branches(&self) -> Vec<Branch> {
        self.working.list()
    }

    pub fn config(&self) -> ShopConfig {
        self.working.config()
    }

    /// Every collection at once, for export.
    pub fn snapshot(&self) -> Collections {
        self.working.snapshot()
    }

    /// One record by id.
    pub fn get<R: Record>(&self, id: &str) -> Option<R> {
        self.working.get(id)
    }

    // =========================================================================
    // Views
    // =========================================================================

    pub fn customers(&self) -> Vec<Customer> {
        self.working.with(|set| views::customers(&set.jobs))
    }

    pub fn search_customers(&self, term: &str) -> Vec<Customer> {
        views::search_customers(&self.customers(), term)
    }

    pub fn visit_stats(&self, mobile: &str) -> VisitStats {
        self.working.with(|set| views::visit_stats(&set.jobs, mobile))
    }

    pub fn customer_history(&self, mobile: &str) -> CustomerHistory {
        self.working.with(|set| views::customer_history(&set.jobs, mobile))
    }

    pub fn visit_number(&self, job_id: &str) -> Option<usize> {
        self.working.with(|set| views::visit_number(&set.jobs, job_id))
    }

    pub fn dashboard(&self, range: DateRange) -> DashboardStats {
        self.dashboard_at(range, today())
    }

    pub fn dashboard_at(&self, range: DateRange, today: NaiveDate) -> DashboardStats {
        self.working.with(|set| views::dashboard_stats(&set.jobs, range, today))
    }

    pub fn overdue_jobs(&self) -> Vec<Job> {
        self.working.with(|set| views::overdue_jobs(&set.jobs, today()))
    }

    pub fn filter_jobs(&self, filter: &JobFilter) -> Vec<Job> {
        self.working.with(|set| views::filter_jobs(&set.jobs, filter))
    }

    pub fn report(&self, filter: &ReportFilter) -> Report {
        self.working.with(|set| views::report(&set.jobs, filter))
    }

    pub fn low_stock(&self) -> Vec<InventoryItem> {
        self.working.with(|set| inventory::low_stock(&set.inventory))
    }

    // =========================================================================
    // Outreach
    // =========================================================================

    pub fn job_completed_message(&self, job_id: &str) -> Option<OutboundMessage> {
        self.working.with(|set| {
            set.jobs
                .iter()
                .find(|j| j.id == job_id)
                .map(|job| outreach::job_completed_message(job, &set.config, &self.options.country_code))
        })
    }

    pub fn group_invite_message(&self, name: &str, mobile: &str) -> OutboundMessage {
        outreach::group_invite_message(name, mobile, &self.config(), &self.options.country_code)
    }

    pub fn invoice_share_message(&self, invoice_id: &str) -> Option<OutboundMessage> {
        self.get::<Invoice>(invoice_id)
            .map(|invoice| outreach::invoice_share_message(&invoice))
    }

    /// One message per selected mobile that belongs to a known customer.
    pub fn marketing_broadcast(&self, mobiles: &[String], text: &str) -> Vec<OutboundMessage> {
        let selected: Vec<Customer> = self
            .customers()
            .into_iter()
            .filter(|c| mobiles.contains(&c.mobile))
            .collect();
        outreach::marketing_broadcast(&selected, text, &self.options.country_code)
    }

    // =========================================================================
    // Generic Mutations
    // =========================================================================

    /// Saves any list-backed record. A blank id is replaced with a fresh one.
    pub async fn save_record<R: Record>(&self, mut record: R) -> SyncResult<R> {
        if record.id().trim().is_empty() {
            record.set_id(new_id());
        }
        let row = RemoteAdapter::encode(&record)?;
        self.working.upsert(record.clone());
        debug!(table = %R::TABLE, id = %record.id(), "Saved to working set");

        self.commit::<R>(record.id(), PendingOp::Upsert(row)).await?;
        Ok(record)
    }

    /// Removes a record locally, then from the remote.
    pub async fn delete_record<R: Record>(&self, id: &str) -> SyncResult<()> {
        if self.working.remove::<R>(id).is_none() {
            debug!(table = %R::TABLE, id = %id, "Delete of record not in working set");
        }
        self.commit::<R>(id, PendingOp::Delete).await
    }

    /// Cache write, then remote push. The push is attempted even if the
    /// cache write failed; its error wins.
    async fn commit<R: Record>(&self, id: &str, op: PendingOp) -> SyncResult<()> {
        let cached = self.persist::<R>().await;
        self.push(R::TABLE, id.to_string(), op).await?;
        cached
    }

    /// Writes one collection to the cache as it stands once the writer
    /// lock is held, so the last write always carries the newest list.
    async fn persist<R: Record>(&self) -> SyncResult<()> {
        let _writer = self.cache_writer.lock().await;
        let list = self.working.list::<R>();
        self.cache.write(R::TABLE.cache_key(), &list).await.map_err(|e| {
            error!(table = %R::TABLE, error = %e, "Failed to write local cache");
            SyncError::from(e)
        })
    }

    async fn persist_config(&self) -> SyncResult<()> {
        let _writer = self.cache_writer.lock().await;
        let config = self.working.config();
        self.cache.write(Table::Config.cache_key(), &config).await.map_err(|e| {
            error!(table = %Table::Config, error = %e, "Failed to write local cache");
            SyncError::from(e)
        })
    }

    /// One remote write. A failure is logged and queued before it is
    /// returned; a success clears anything queued for the same key.
    async fn push(&self, table: Table, id: String, op: PendingOp) -> SyncResult<()> {
        match self.send(table, &id, &op).await {
            Ok(()) => {
                if self.pending.clear(table, &id) {
                    debug!(table = %table, id = %id, "Queued write superseded by successful push");
                }
                Ok(())
            }
            Err(e) => {
                error!(table = %table, id = %id, error = %e, "Remote push failed");
                self.pending.record_failure(table, &id, op, &e.message());
                Err(e)
            }
        }
    }

    async fn send(&self, table: Table, id: &str, op: &PendingOp) -> SyncResult<()> {
        match op {
            PendingOp::Upsert(row) => self.remote.upsert_row(table, row.clone()).await,
            PendingOp::Update(fields) => self.remote.update_fields(table, id, fields.clone()).await,
            PendingOp::Delete => self.remote.delete_row(table, id).await,
        }
    }

    // =========================================================================
    // Jobs
    // =========================================================================

    /// Saves a job. Moving it into `Completed` notifies the customer once
    /// the remote has the change.
    pub async fn save_job(&self, job: Job) -> SyncResult<Job> {
        let previous = self.working.get::<Job>(&job.id).map(|j| j.status);
        let saved = self.save_record(job).await?;
        if saved.status == JobStatus::Completed && previous != Some(JobStatus::Completed) {
            self.notify_completed(&saved);
        }
        Ok(saved)
    }

    /// Builds a job from intake-form input and saves it. Validation is up
    /// to the caller ([`JobDraft::validate`]).
    pub async fn save_job_draft(&self, draft: JobDraft) -> SyncResult<Job> {
        self.save_job(draft.into_job(today())).await
    }

    /// Sets one job's status; any status may follow any other.
    ///
    /// Returns the updated job, or `None` if it isn't in the working set.
    /// An unknown id touches neither the cache nor the remote.
    pub async fn update_job_status(&self, id: &str, status: JobStatus) -> SyncResult<Option<Job>> {
        let updated = self.working.with_mut(|set| {
            set.jobs.iter_mut().find(|j| j.id == id).map(|job| {
                let previous = job.status;
                job.status = status;
                (previous, job.clone())
            })
        });
        let Some((previous, job)) = updated else {
            debug!(id = %id, "Status update for job not in working set");
            return Ok(None);
        };

        let fields = schema::to_remote(Table::Jobs, json!({ "status": status }));
        self.commit::<Job>(id, PendingOp::Update(fields)).await?;

        if status == JobStatus::Completed && previous != JobStatus::Completed {
            self.notify_completed(&job);
        }
        Ok(Some(job))
    }

    pub async fn delete_job(&self, id: &str) -> SyncResult<()> {
        self.delete_record::<Job>(id).await
    }

    fn notify_completed(&self, job: &Job) {
        let message = outreach::job_completed_message(job, &self.config(), &self.options.country_code);
        self.options.notifier.job_completed(job, &message);
    }

    // =========================================================================
    // Inventory, Suppliers, Branches
    // =========================================================================

    /// Saves an item, stamping `lastUpdated`.
    pub async fn save_inventory_item(&self, mut item: InventoryItem) -> SyncResult<InventoryItem> {
        item.last_updated = Utc::now().to_rfc3339();
        self.save_record(item).await
    }

    pub async fn delete_inventory_item(&self, id: &str) -> SyncResult<()> {
        self.delete_record::<InventoryItem>(id).await
    }

    pub async fn save_supplier(&self, supplier: Supplier) -> SyncResult<Supplier> {
        self.save_record(supplier).await
    }

    pub async fn delete_supplier(&self, id: &str) -> SyncResult<()> {
        self.delete_record::<Supplier>(id).await
    }

    pub async fn save_branch(&self, branch: Branch) -> SyncResult<Branch> {
        self.save_record(branch).await
    }

    pub async fn delete_branch(&self, id: &str) -> SyncResult<()> {
        self.delete_record::<Branch>(id).await
    }

    // =========================================================================
    // Invoices
    // =========================================================================

    /// Saves an invoice with its grand total recomputed.
    pub async fn save_invoice(&self, mut invoice: Invoice) -> SyncResult<Invoice> {
        invoice.recompute_totals();
        self.save_record(invoice).await
    }

    pub async fn delete_invoice(&self, id: &str) -> SyncResult<()> {
        self.delete_record::<Invoice>(id).await
    }

    /// Marks an invoice paid and saves it. `None` if there is no such invoice.
    pub async fn mark_invoice_paid(&self, id: &str) -> SyncResult<Option<Invoice>> {
        let Some(mut invoice) = self.get::<Invoice>(id) else {
            return Ok(None);
        };
        invoice.mark_paid();
        self.save_invoice(invoice).await.map(Some)
    }

    // =========================================================================
    // Purchases
    // =========================================================================

    /// Saves a purchase and moves stock by the lines' net change.
    ///
    /// First save adds every line's quantity; a re-save adds only the
    /// difference from the stored version. Lines naming an unknown item are
    /// logged and skipped. The purchase and every touched item are pushed
    /// concurrently; the first failure is returned after all have finished.
    pub async fn save_purchase(&self, mut purchase: Purchase) -> SyncResult<Purchase> {
        if purchase.id.trim().is_empty() {
            purchase.id = new_id();
        }
        if purchase.purchase_no.trim().is_empty() {
            purchase.purchase_no = generate_purchase_no();
        }
        purchase.recompute();
        let purchase_row = RemoteAdapter::encode(&purchase)?;
        let timestamp = Utc::now().to_rfc3339();

        let applied = self.working.with_mut(|set| {
            let previous = set.purchases.iter().find(|p| p.id == purchase.id).cloned();
            let deltas = stock_deltas(previous.as_ref(), &purchase);
            let applied = apply_stock_deltas(&mut set.inventory, &deltas, &timestamp);

            match set.purchases.iter_mut().find(|p| p.id == purchase.id) {
                Some(existing) => *existing = purchase.clone(),
                None => set.purchases.push(purchase.clone()),
            }
            applied
        });

        for product_id in &applied.missing {
            warn!(purchase_id = %purchase.id, product_id = %product_id, "Purchase line names unknown inventory item");
        }
        debug!(
            purchase_id = %purchase.id,
            total = %purchase.total_amount,
            touched = applied.touched.len(),
            "Applied purchase to stock"
        );

        let item_rows = applied
            .touched
            .iter()
            .map(|item| Ok((item.id.clone(), RemoteAdapter::encode(item)?)))
            .collect::<SyncResult<Vec<_>>>()?;

        let cached = self
            .persist::<Purchase>()
            .await
            .and(self.persist::<InventoryItem>().await);

        let mut pushes = vec![self.push(Table::Purchases, purchase.id.clone(), PendingOp::Upsert(purchase_row))];
        pushes.extend(
            item_rows
                .into_iter()
                .map(|(id, row)| self.push(Table::Inventory, id, PendingOp::Upsert(row))),
        );
        join_all(pushes).await.into_iter().collect::<SyncResult<Vec<()>>>()?;

        cached?;
        Ok(purchase)
    }

    /// Removes a purchase. Stock is left as it is.
    pub async fn delete_purchase(&self, id: &str) -> SyncResult<()> {
        self.delete_record::<Purchase>(id).await
    }

    // =========================================================================
    // Shop Config
    // =========================================================================

    pub async fn save_config(&self, config: ShopConfig) -> SyncResult<ShopConfig> {
        let row = RemoteAdapter::encode_config(&config)?;
        self.working.set_config(config.clone());

        let cached = self.persist_config().await;
        self.push(Table::Config, SHOP_CONFIG_ID.to_string(), PendingOp::Upsert(row))
            .await?;
        cached?;
        Ok(config)
    }

    // =========================================================================
    // Pending Writes
    // =========================================================================

    /// Failed pushes not yet replayed successfully, oldest first.
    pub fn pending_writes(&self) -> Vec<PendingWrite> {
        self.pending.entries()
    }

    /// Replays every queued write once.
    pub async fn retry_pending(&self) -> RetryReport {
        let mut report = RetryReport::default();

        for entry in self.pending.entries() {
            if entry.is_exhausted() {
                warn!(
                    table = %entry.table,
                    id = %entry.id,
                    attempts = entry.attempts,
                    "Skipping queued write past retry limit"
                );
                report.skipped += 1;
                continue;
            }

            match self.send(entry.table, &entry.id, &entry.op).await {
                Ok(()) => {
                    self.pending.clear_if_seq(entry.table, &entry.id, entry.seq);
                    report.succeeded += 1;
                }
                Err(e) => {
                    warn!(table = %entry.table, id = %entry.id, error = %e, "Queued write failed again");
                    self.pending
                        .record_retry_failure(entry.table, &entry.id, entry.seq, &e.message());
                    report.failed += 1;
                }
            }
        }

        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            skipped = report.skipped,
            "Replayed pending writes"
        );
        report
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Every collection from the remote, fetched concurrently.
async fn pull(remote: &RemoteAdapter) -> SyncResult<Collections> {
    let (jobs, inventory, suppliers, invoices, purchases, branches, config) = tokio::join!(
        remote.fetch_all::<Job>(),
        remote.fetch_all::<InventoryItem>(),
        remote.fetch_all::<Supplier>(),
        remote.fetch_all::<Invoice>(),
        remote.fetch_all::<Purchase>(),
        remote.fetch_all::<Branch>(),
        remote.fetch_config(),
    );

    Ok(Collections {
        jobs: jobs?,
        inventory: inventory?,
        suppliers: suppliers?,
        invoices: invoices?,
        purchases: purchases?,
        branches: branches?,
        config: config?.unwrap_or_default(),
    })
}

/// Every collection from the local cache. Anything unreadable is empty.
async fn load_cached(cache: &CacheRepository) -> Collections {
    let config = match cache.read::<ShopConfig>(Table::Config.cache_key()).await {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            warn!(error = %e, "Failed to read cached shop config");
            ShopConfig::default()
        }
    };

    Collections {
        jobs: cached_list(cache).await,
        inventory: cached_list(cache).await,
        suppliers: cached_list(cache).await,
        invoices: cached_list(cache).await,
        purchases: cached_list(cache).await,
        branches: cached_list(cache).await,
        config,
    }
}

async fn cached_list<R: Record>(cache: &CacheRepository) -> Vec<R> {
    cache.read_list(R::TABLE.cache_key()).await.unwrap_or_else(|e| {
        warn!(table = %R::TABLE, error = %e, "Failed to read local cache");
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryBackend;
    use garage_core::money::Money;
    use garage_core::PurchaseLine;
    use garage_db::DbConfig;
    use std::sync::Mutex;

    // =========================================================================
    // Fixtures
    // =========================================================================

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<(String, OutboundMessage)>>,
    }

    impl RecordingNotifier {
        fn sent(&self) -> Vec<(String, OutboundMessage)> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl Notifier for RecordingNotifier {
        fn job_completed(&self, job: &Job, message: &OutboundMessage) {
            self.sent.lock().unwrap().push((job.id.clone(), message.clone()));
        }
    }

    async fn memory_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn store_with(backend: Arc<MemoryBackend>) -> (Database, GarageStore) {
        let db = memory_db().await;
        let store = GarageStore::init(&db, backend, StoreOptions::default()).await;
        (db, store)
    }

    fn draft(name: &str, mobile: &str, date_in: &str) -> JobDraft {
        JobDraft {
            customer_name: name.into(),
            customer_mobile: mobile.into(),
            vehicle_number: "ka01ab1234".into(),
            date_in: Some(date_in.into()),
            expected_delivery_date: Some(date_in.into()),
            charges: Some(1500.0),
            ..Default::default()
        }
    }

    fn oil(quantity: f64) -> InventoryItem {
        InventoryItem {
            id: "P1".into(),
            quantity,
            ..InventoryItem::new("Engine Oil 5W-30", "Lubricants")
        }
    }

    // =========================================================================
    // Init
    // =========================================================================

    #[tokio::test]
    async fn test_init_from_remote_refreshes_cache() {
        let backend = Arc::new(MemoryBackend::new().with_rows(
            "customers",
            vec![json!({
                "id": "j1",
                "customerName": "Asha",
                "customerMobile": "9876543210",
                "vehicleNumber": "KA01AB1234",
                "dateIn": 1700000000000i64,
                "expectedDeliveryDate": "2023-11-20",
                "charges": 2500,
                "status": "In Progress"
            })],
        ));
        let (db, store) = store_with(backend).await;

        assert_eq!(store.state(), &SyncState::RemoteSynced);
        assert_eq!(store.jobs()[0].date_in.to_string(), "2023-11-14");

        let cached: Vec<Job> = db.cache().read_list(Table::Jobs.cache_key()).await.unwrap();
        assert_eq!(cached, store.jobs());
    }

    #[tokio::test]
    async fn test_init_falls_back_to_cache() {
        let db = memory_db().await;
        let cached_job = draft("Ravi", "9000000001", "2024-03-05").into_job(today());
        db.cache()
            .write(Table::Jobs.cache_key(), &vec![cached_job.clone()])
            .await
            .unwrap();

        let store = GarageStore::init(&db, Arc::new(MemoryBackend::unreachable()), StoreOptions::default()).await;

        assert!(matches!(store.state(), SyncState::CacheFallback { .. }));
        assert_eq!(store.jobs(), vec![cached_job]);
        assert!(store.inventory().is_empty());
        assert_eq!(store.config(), ShopConfig::default());
    }

    #[tokio::test]
    async fn test_fallback_ignores_partial_remote_data() {
        let backend = MemoryBackend::new()
            .with_rows("inventory", vec![serde_json::to_value(oil(3.0)).unwrap()]);
        backend.fail_reads();
        let (_db, store) = store_with(Arc::new(backend)).await;

        assert!(!store.state().is_remote_synced());
        assert!(store.inventory().is_empty());
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    #[tokio::test]
    async fn test_saved_job_dates_are_canonical() {
        let (_db, store) = store_with(Arc::new(MemoryBackend::new())).await;

        let mut input = draft("Asha", "9876543210", "1700000000000");
        input.expected_delivery_date = Some("2024-03-05T10:30:00+05:30".into());
        let saved = store.save_job_draft(input).await.unwrap();

        let job = store.get::<Job>(&saved.id).unwrap();
        assert_eq!(job.date_in.to_string(), "2023-11-14");
        assert_eq!(job.expected_delivery_date.to_string(), "2024-03-05");
        assert_eq!(job.vehicle_number, "KA01AB1234");
        assert_eq!(job.id.len(), 36);
    }

    #[tokio::test]
    async fn test_failed_push_keeps_local_change() {
        let backend = Arc::new(MemoryBackend::new());
        let (db, store) = store_with(backend.clone()).await;
        backend.fail_writes();

        let job = draft("Asha", "9876543210", "2024-03-05").into_job(today());
        let result = store.save_job(job.clone()).await;

        assert!(result.is_err());
        assert_eq!(store.jobs(), vec![job.clone()]);

        let cached: Vec<Job> = db.cache().read_list(Table::Jobs.cache_key()).await.unwrap();
        assert_eq!(cached, vec![job.clone()]);

        let pending = store.pending_writes();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, job.id);
    }

    #[tokio::test]
    async fn test_retry_pending_replays_once() {
        let backend = Arc::new(MemoryBackend::new());
        let (_db, store) = store_with(backend.clone()).await;
        backend.fail_writes();

        assert!(store
            .save_job_draft(draft("Asha", "9876543210", "2024-03-05"))
            .await
            .is_err());

        let report = store.retry_pending().await;
        assert_eq!(report, RetryReport { succeeded: 0, failed: 1, skipped: 0 });
        assert_eq!(store.pending_writes()[0].attempts, 2);

        backend.heal();
        let report = store.retry_pending().await;
        assert_eq!(report.succeeded, 1);
        assert!(store.pending_writes().is_empty());
        assert_eq!(backend.rows("customers").len(), 1);
    }

    #[tokio::test]
    async fn test_purchase_restocks_inventory() {
        let backend = Arc::new(MemoryBackend::new());
        let (_db, store) = store_with(backend.clone()).await;
        store.save_inventory_item(oil(2.0)).await.unwrap();

        let mut purchase = Purchase {
            supplier_id: "s1".into(),
            items: vec![PurchaseLine {
                product_id: "P1".into(),
                quantity: 5.0,
                price: Money::from_major(10.0),
                amount: Money::zero(),
            }],
            ..Default::default()
        };
        let saved = store.save_purchase(purchase.clone()).await.unwrap();

        assert_eq!(saved.total_amount, Money::from_major(50.0));
        assert!(saved.purchase_no.starts_with("PUR-"));
        assert_eq!(store.get::<InventoryItem>("P1").unwrap().quantity, 7.0);
        assert_eq!(backend.rows("inventory")[0]["quantity"], json!(7.0));

        // Re-saving with one more unit moves stock by one, not six.
        purchase.id = saved.id.clone();
        purchase.purchase_no = saved.purchase_no.clone();
        purchase.items[0].quantity = 6.0;
        store.save_purchase(purchase).await.unwrap();
        assert_eq!(store.get::<InventoryItem>("P1").unwrap().quantity, 8.0);

        store.delete_purchase(&saved.id).await.unwrap();
        assert!(store.purchases().is_empty());
        assert_eq!(store.get::<InventoryItem>("P1").unwrap().quantity, 8.0);
    }

    #[tokio::test]
    async fn test_purchase_with_unknown_product() {
        let (_db, store) = store_with(Arc::new(MemoryBackend::new())).await;

        let purchase = Purchase {
            items: vec![PurchaseLine {
                product_id: "missing".into(),
                quantity: 1.0,
                price: Money::from_major(99.0),
                amount: Money::zero(),
            }],
            ..Default::default()
        };
        let saved = store.save_purchase(purchase).await.unwrap();

        assert_eq!(store.purchases(), vec![saved]);
        assert!(store.inventory().is_empty());
    }

    #[tokio::test]
    async fn test_delete_removes_locally_even_when_remote_fails() {
        let backend = Arc::new(MemoryBackend::new());
        let (_db, store) = store_with(backend.clone()).await;
        let supplier = store
            .save_supplier(Supplier {
                name: "Bosch".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        backend.fail_writes();
        assert!(store.delete_supplier(&supplier.id).await.is_err());
        assert!(store.suppliers().is_empty());
        assert_eq!(backend.rows("suppliers").len(), 1);
    }

    #[tokio::test]
    async fn test_invoice_totals_and_payment() {
        let (_db, store) = store_with(Arc::new(MemoryBackend::new())).await;

        let invoice = store
            .save_invoice(Invoice {
                invoice_number: Some("INV-1001".into()),
                total_amount: Money::from_major(1000.0),
                tax: Some(10.0),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(invoice.grand_total, Money::from_major(1100.0));

        let paid = store.mark_invoice_paid(&invoice.id).await.unwrap().unwrap();
        assert_eq!(paid.status, garage_core::InvoiceStatus::Paid);
        assert!(store.mark_invoice_paid("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_config_row_is_singleton() {
        let backend = Arc::new(MemoryBackend::new());
        let (_db, store) = store_with(backend.clone()).await;

        let config = ShopConfig {
            shop_name: "Speedy Motors".into(),
            ..Default::default()
        };
        store.save_config(config.clone()).await.unwrap();
        store.save_config(config.clone()).await.unwrap();

        assert_eq!(store.config(), config);
        assert_eq!(backend.rows("config").len(), 1);
        assert_eq!(backend.rows("config")[0]["id"], json!("main"));
    }

    #[tokio::test]
    async fn test_status_update_of_unknown_job_is_skipped() {
        let backend = Arc::new(MemoryBackend::new());
        let (_db, store) = store_with(backend.clone()).await;
        backend.fail_writes();
        let writes_before = backend.write_attempts();

        let updated = store.update_job_status("ghost", JobStatus::Completed).await.unwrap();

        assert!(updated.is_none());
        assert_eq!(backend.write_attempts(), writes_before);
        assert!(store.pending_writes().is_empty());
    }

    #[tokio::test]
    async fn test_branch_contact_number_round_trip() {
        let backend = Arc::new(MemoryBackend::new());
        let (db, store) = store_with(backend.clone()).await;

        let saved = store
            .save_branch(Branch {
                name: "Whitefield".into(),
                contact_number: "080-4123-5566".into(),
                city: "Bengaluru".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        let row = &backend.rows("branches")[0];
        assert_eq!(row["contactnumber"], json!("080-4123-5566"));
        assert!(row.get("contactNumber").is_none());

        let reloaded = GarageStore::init(&db, backend.clone(), StoreOptions::default()).await;
        assert!(reloaded.state().is_remote_synced());
        assert_eq!(reloaded.branches(), vec![saved]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_saves_leave_cache_current() {
        let path = std::env::temp_dir().join(format!("garage-store-{}.db", new_id()));
        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        let store = Arc::new(
            GarageStore::init(&db, Arc::new(MemoryBackend::new()), StoreOptions::default()).await,
        );

        for round in 0..25 {
            let saves: Vec<_> = (0..8)
                .map(|n| {
                    let store = store.clone();
                    tokio::spawn(async move {
                        store
                            .save_supplier(Supplier {
                                name: format!("Supplier {}-{}", round, n),
                                ..Default::default()
                            })
                            .await
                    })
                })
                .collect();
            for save in saves {
                save.await.unwrap().unwrap();
            }

            let cached: Vec<Supplier> = db.cache().read_list(Table::Suppliers.cache_key()).await.unwrap();
            assert_eq!(cached, store.suppliers(), "cache behind working set in round {}", round);
        }

        db.close().await;
        let _ = std::fs::remove_file(&path);
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    #[tokio::test]
    async fn test_completion_notifies_once() {
        let db = memory_db().await;
        let notifier = Arc::new(RecordingNotifier::default());
        let options = StoreOptions::default().with_notifier(notifier.clone());
        let store = GarageStore::init(&db, Arc::new(MemoryBackend::new()), options).await;

        let job = store
            .save_job_draft(draft("Asha", "98765 43210", "2024-03-05"))
            .await
            .unwrap();

        store.update_job_status(&job.id, JobStatus::InProgress).await.unwrap();
        assert!(notifier.sent().is_empty());

        let updated = store
            .update_job_status(&job.id, JobStatus::Completed)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, JobStatus::Completed);

        store.update_job_status(&job.id, JobStatus::Completed).await.unwrap();

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1.phone.as_deref(), Some("919876543210"));
    }

    #[tokio::test]
    async fn test_no_notification_when_push_fails() {
        let db = memory_db().await;
        let notifier = Arc::new(RecordingNotifier::default());
        let backend = Arc::new(MemoryBackend::new());
        let options = StoreOptions::default().with_notifier(notifier.clone());
        let store = GarageStore::init(&db, backend.clone(), options).await;

        let job = store
            .save_job_draft(draft("Asha", "9876543210", "2024-03-05"))
            .await
            .unwrap();
        backend.fail_writes();

        assert!(store.update_job_status(&job.id, JobStatus::Completed).await.is_err());
        assert_eq!(store.get::<Job>(&job.id).unwrap().status, JobStatus::Completed);
        assert!(notifier.sent().is_empty());
    }

    // =========================================================================
    // Views
    // =========================================================================

    #[tokio::test]
    async fn test_views_follow_working_set() {
        let (_db, store) = store_with(Arc::new(MemoryBackend::new())).await;

        store.save_job_draft(draft("Asha", "9876543210", "2024-01-10")).await.unwrap();
        let second = store
            .save_job_draft(draft("Asha K", "9876543210", "2024-03-05"))
            .await
            .unwrap();
        store.save_job_draft(draft("Ravi", "9000000001", "2024-02-01")).await.unwrap();

        let customers = store.customers();
        assert_eq!(customers.len(), 2);
        assert!(customers.iter().any(|c| c.name == "Asha K"));

        assert_eq!(store.visit_number(&second.id), Some(2));
        assert_eq!(store.visit_stats("9876543210").spend, Money::from_major(3000.0));

        let broadcast = store.marketing_broadcast(&["9000000001".to_string()], "Monsoon offer");
        assert_eq!(broadcast.len(), 1);
        assert_eq!(broadcast[0].phone.as_deref(), Some("919000000001"));
    }
}
