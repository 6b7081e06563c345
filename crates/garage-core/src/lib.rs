//! # garage-core: Pure Domain Logic for Garage Desk
//!
//! Everything the workshop dashboard computes lives here as pure functions
//! over plain records. Storage and networking live in `garage-db` and
//! `garage-sync`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Garage Desk Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Dashboard Frontend                           │   │
//! │  │   Jobs ──► Customers ──► Invoices ──► Inventory ──► Outreach    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               garage-sync (GarageStore)                         │   │
//! │  │     working set ◄──► local cache ◄──► remote store              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ garage-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  types  │ │  date   │ │  money  │ │  views  │ │outreach │  │   │
//! │  │   │ Job     │ │normalize│ │ Money   │ │customers│ │wa.me    │  │   │
//! │  │   │ Invoice │ │         │ │ totals  │ │dashboard│ │messages │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Records (Job, Invoice, InventoryItem, Purchase, ...)
//! - [`date`] - Canonical `YYYY-MM-DD` date normalizer
//! - [`money`] - Integer-cent money and percentage math
//! - [`invoice`] - Invoice totals
//! - [`inventory`] - Purchase line math, stock deltas, low stock
//! - [`views`] - Customer rollup, dashboard stats, overdue, visit numbers
//! - [`outreach`] - WhatsApp phone normalization and message templates
//! - [`validation`] - Form-level field checks
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use garage_core::invoice::compute_totals;
//! use garage_core::money::Money;
//!
//! let totals = compute_totals(Money::from_major(1000.0), 10.0, 0.0);
//! assert_eq!(totals.tax_amount, Money::from_major(100.0));
//! assert_eq!(totals.grand_total, Money::from_major(1100.0));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod date;
pub mod error;
pub mod inventory;
pub mod invoice;
pub mod money;
pub mod outreach;
pub mod types;
pub mod validation;
pub mod views;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use date::{normalize_date, normalize_date_at, today};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, Percent};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Fixed row id of the singleton shop configuration.
///
/// The remote `config` table only ever holds this one row.
pub const SHOP_CONFIG_ID: &str = "main";

/// Country code prefixed to bare 10-digit mobile numbers in WhatsApp links.
pub const DEFAULT_COUNTRY_CODE: &str = "91";

/// Shop name used in outgoing messages when the config has none.
pub const DEFAULT_SHOP_NAME: &str = "our workshop";
