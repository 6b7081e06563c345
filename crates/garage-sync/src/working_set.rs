//! # Working Set
//!
//! The in-memory collections every read is served from.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  WorkingSet                                                             │
//! │  └── RwLock<Collections>                                                │
//! │       ├── jobs        Vec<Job>             Table::Jobs                  │
//! │       ├── inventory   Vec<InventoryItem>   Table::Inventory             │
//! │       ├── suppliers   Vec<Supplier>        Table::Suppliers             │
//! │       ├── invoices    Vec<Invoice>         Table::Invoices              │
//! │       ├── purchases   Vec<Purchase>        Table::Purchases             │
//! │       ├── branches    Vec<Branch>          Table::Branches              │
//! │       └── config      ShopConfig           Table::Config                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Upserts replace by id in place, otherwise append, so list order is
//! insertion order. A poisoned lock is recovered rather than propagated;
//! every write leaves the collections consistent.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use garage_core::{Branch, InventoryItem, Invoice, Job, Purchase, ShopConfig, Supplier};

use crate::remote::Table;

/// Every collection, by value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collections {
    pub jobs: Vec<Job>,
    pub inventory: Vec<InventoryItem>,
    pub suppliers: Vec<Supplier>,
    pub invoices: Vec<Invoice>,
    pub purchases: Vec<Purchase>,
    pub branches: Vec<Branch>,
    pub config: ShopConfig,
}

/// A record stored as a list in one table.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const TABLE: Table;

    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
    fn collection(set: &Collections) -> &Vec<Self>;
    fn collection_mut(set: &mut Collections) -> &mut Vec<Self>;
}

macro_rules! impl_record {
    ($ty:ty, $table:expr, $field:ident) => {
        impl Record for $ty {
            const TABLE: Table = $table;

            fn id(&self) -> &str {
                &self.id
            }

            fn set_id(&mut self, id: String) {
                self.id = id;
            }

            fn collection(set: &Collections) -> &Vec<Self> {
                &set.$field
            }

            fn collection_mut(set: &mut Collections) -> &mut Vec<Self> {
                &mut set.$field
            }
        }
    };
}

impl_record!(Job, Table::Jobs, jobs);
impl_record!(InventoryItem, Table::Inventory, inventory);
impl_record!(Supplier, Table::Suppliers, suppliers);
impl_record!(Invoice, Table::Invoices, invoices);
impl_record!(Purchase, Table::Purchases, purchases);
impl_record!(Branch, Table::Branches, branches);

/// Shared, lock-protected collections.
#[derive(Debug, Default)]
pub struct WorkingSet {
    inner: RwLock<Collections>,
}

impl WorkingSet {
    pub fn new(collections: Collections) -> Self {
        WorkingSet {
            inner: RwLock::new(collections),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Collections> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Collections> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` against the collections under the read lock.
    pub fn with<T>(&self, f: impl FnOnce(&Collections) -> T) -> T {
        f(&self.read())
    }

    /// Runs `f` against the collections under the write lock.
    pub fn with_mut<T>(&self, f: impl FnOnce(&mut Collections) -> T) -> T {
        f(&mut self.write())
    }

    pub fn snapshot(&self) -> Collections {
        self.read().clone()
    }

    pub fn list<R: Record>(&self) -> Vec<R> {
        R::collection(&self.read()).clone()
    }

    pub fn get<R: Record>(&self, id: &str) -> Option<R> {
        R::collection(&self.read()).iter().find(|r| r.id() == id).cloned()
    }

    /// Replaces the record with the same id, or appends it.
    pub fn upsert<R: Record>(&self, record: R) {
        let mut set = self.write();
        let list = R::collection_mut(&mut set);
        match list.iter_mut().find(|r| r.id() == record.id()) {
            Some(existing) => *existing = record,
            None => list.push(record),
        }
    }

    /// Removes the record with this id, returning it if it was there.
    pub fn remove<R: Record>(&self, id: &str) -> Option<R> {
        let mut set = self.write();
        let list = R::collection_mut(&mut set);
        list.iter()
            .position(|r| r.id() == id)
            .map(|idx| list.remove(idx))
    }

    pub fn config(&self) -> ShopConfig {
        self.read().config.clone()
    }

    pub fn set_config(&self, config: ShopConfig) {
        self.write().config = config;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supplier(id: &str, name: &str) -> Supplier {
        Supplier {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let set = WorkingSet::default();
        set.upsert(supplier("s1", "Bosch"));
        set.upsert(supplier("s2", "Castrol"));
        set.upsert(supplier("s1", "Bosch India"));

        let after = set.list::<Supplier>();
        assert_eq!(after.len(), 2);
        assert_eq!(after[0].name, "Bosch India");
        assert_eq!(set.get::<Supplier>("s2").unwrap().name, "Castrol");
    }

    #[test]
    fn test_remove() {
        let set = WorkingSet::default();
        set.upsert(supplier("s1", "Bosch"));

        let removed = set.remove::<Supplier>("s1");
        assert_eq!(removed.unwrap().name, "Bosch");
        assert!(set.list::<Supplier>().is_empty());

        assert!(set.remove::<Supplier>("s1").is_none());
    }

    #[test]
    fn test_poisoned_lock_is_recovered() {
        let set = std::sync::Arc::new(WorkingSet::default());
        let poisoner = set.clone();
        let _ = std::thread::spawn(move || {
            poisoner.with_mut(|_| panic!("poison the lock"));
        })
        .join();

        set.upsert(supplier("s1", "Bosch"));
        assert_eq!(set.list::<Supplier>().len(), 1);
    }
}
