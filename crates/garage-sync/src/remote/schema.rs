//! # Remote Schema
//!
//! Table names, cache keys and the few columns whose remote name differs
//! from the record field. All renames go through [`to_remote`] and
//! [`from_remote`]; nothing else in the crate knows about them.
//!
//! ```text
//! Table       remote table   cache key              renames
//! ─────────   ────────────   ────────────────────   ──────────────────────────
//! Jobs        customers      autocare_flat_jobs
//! Inventory   inventory      autocare_inventory
//! Suppliers   suppliers      autocare_suppliers
//! Invoices    invoices       autocare_invoices
//! Purchases   purchases      autocare_purchases
//! Branches    branches       autocare_branches      contactNumber ↔ contactnumber
//! Config      config         autocare_config        (single row, id "main")
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use garage_db::keys;

/// One remote table per collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Table {
    Jobs,
    Inventory,
    Suppliers,
    Invoices,
    Purchases,
    Branches,
    Config,
}

impl Table {
    /// Remote table name. Jobs live in `customers` for historical reasons.
    pub fn name(&self) -> &'static str {
        match self {
            Table::Jobs => "customers",
            Table::Inventory => "inventory",
            Table::Suppliers => "suppliers",
            Table::Invoices => "invoices",
            Table::Purchases => "purchases",
            Table::Branches => "branches",
            Table::Config => "config",
        }
    }

    /// Key of this collection's snapshot in the local cache.
    pub fn cache_key(&self) -> &'static str {
        match self {
            Table::Jobs => keys::JOBS,
            Table::Inventory => keys::INVENTORY,
            Table::Suppliers => keys::SUPPLIERS,
            Table::Invoices => keys::INVOICES,
            Table::Purchases => keys::PURCHASES,
            Table::Branches => keys::BRANCHES,
            Table::Config => keys::CONFIG,
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// (table, record field, remote column)
const COLUMN_RENAMES: &[(Table, &str, &str)] = &[(Table::Branches, "contactNumber", "contactnumber")];

/// Record JSON → remote row.
pub fn to_remote(table: Table, row: Value) -> Value {
    rename_keys(table, row, |&(_, field, column)| (field, column))
}

/// Remote row → record JSON.
pub fn from_remote(table: Table, row: Value) -> Value {
    rename_keys(table, row, |&(_, field, column)| (column, field))
}

fn rename_keys(
    table: Table,
    mut row: Value,
    direction: impl Fn(&(Table, &'static str, &'static str)) -> (&'static str, &'static str),
) -> Value {
    if let Value::Object(map) = &mut row {
        for rename in COLUMN_RENAMES.iter().filter(|(t, _, _)| *t == table) {
            let (from, to) = direction(rename);
            if let Some(value) = map.remove(from) {
                map.insert(to.to_string(), value);
            }
        }
    }
    row
}
