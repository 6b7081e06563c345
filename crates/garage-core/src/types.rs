//! # Domain Types
//!
//! Records shared by the working set, the local cache and the remote store.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Job        │   │    Invoice      │   │  InventoryItem  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  customer snap  │   │  jobId ───────► │   │  quantity       │       │
//! │  │  vehicle snap   │   │  tax%, disc%    │   │  minStock       │       │
//! │  │  dateIn (canon) │   │  grandTotal     │   │  price          │       │
//! │  │  status         │   │  status         │   └────────▲────────┘       │
//! │  └────────┬────────┘   └─────────────────┘            │ +qty           │
//! │           │ derived                                    │                │
//! │  ┌────────▼────────┐   ┌─────────────────┐   ┌────────┴────────┐       │
//! │  │    Customer     │   │    Supplier     │◄──│    Purchase     │       │
//! │  │ (one per mobile)│   └─────────────────┘   │  lines[]        │       │
//! │  └─────────────────┘                         └─────────────────┘       │
//! │                                                                         │
//! │  Branch (contact profile)        ShopConfig (singleton, id "main")     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Shape
//! Field names are camelCase on the wire because the dashboard and the
//! remote tables were built around them. Ids are opaque strings; records
//! saved without one get a UUID v4 from [`new_id`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;
use uuid::Uuid;

use crate::date::{self, canonical_date, default_today};
use crate::error::{CoreError, ValidationError};
use crate::money::Money;
use crate::validation;

/// Generates a fresh record id (UUID v4, 122 random bits).
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// =============================================================================
// Job Status
// =============================================================================

/// Workshop stage of a job.
///
/// ```text
/// Received ──► In Progress ──► Completed ──► Delivered
/// ```
///
/// Any stage may be set from any other; the arrow is the usual path, not
/// an enforced one. Entering `Completed` notifies the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum JobStatus {
    #[default]
    Received,
    #[serde(rename = "In Progress", alias = "InProgress", alias = "in_progress")]
    InProgress,
    Completed,
    Delivered,
}

impl JobStatus {
    /// All stages in workshop order.
    pub const ALL: [JobStatus; 4] = [
        JobStatus::Received,
        JobStatus::InProgress,
        JobStatus::Completed,
        JobStatus::Delivered,
    ];

    /// The label stored in the remote table.
    pub fn label(&self) -> &'static str {
        match self {
            JobStatus::Received => "Received",
            JobStatus::InProgress => "In Progress",
            JobStatus::Completed => "Completed",
            JobStatus::Delivered => "Delivered",
        }
    }

    /// True while the vehicle is still being worked on.
    ///
    /// Only open jobs can be overdue.
    pub fn is_open(&self) -> bool {
        !matches!(self, JobStatus::Completed | JobStatus::Delivered)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for JobStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', '-'], " ").as_str() {
            "received" => Ok(JobStatus::Received),
            "in progress" | "inprogress" => Ok(JobStatus::InProgress),
            "completed" => Ok(JobStatus::Completed),
            "delivered" => Ok(JobStatus::Delivered),
            _ => Err(CoreError::UnknownStatus(s.to_string())),
        }
    }
}

// =============================================================================
// Job
// =============================================================================

/// One visit of one vehicle: the unified record behind the `customers`
/// remote table.
///
/// Customer and vehicle details are snapshots taken at intake. There is no
/// separate customer or vehicle table; see [`crate::views::customers`].
///
/// Dates are canonical `YYYY-MM-DD` regardless of how the row was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Job {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub customer_name: String,

    /// Grouping key for customers.
    #[serde(default)]
    pub customer_mobile: String,

    #[serde(default)]
    pub customer_address: Option<String>,

    /// Plate number, upper-cased at intake.
    #[serde(default)]
    pub vehicle_number: String,

    #[serde(default)]
    pub brand: Option<String>,

    #[serde(default)]
    pub model: Option<String>,

    /// Body type (sedan, SUV, bike, ...). Column is named `type`.
    #[serde(default, rename = "type")]
    pub vehicle_type: Option<String>,

    #[serde(default)]
    pub color: Option<String>,

    /// Free-text description of the work ordered.
    #[serde(default)]
    pub services: Option<String>,

    #[serde(with = "canonical_date", default = "default_today")]
    #[ts(as = "String")]
    pub date_in: NaiveDate,

    #[serde(with = "canonical_date", default = "default_today")]
    #[ts(as = "String")]
    pub expected_delivery_date: NaiveDate,

    #[serde(default)]
    #[ts(type = "number")]
    pub charges: Money,

    #[serde(default)]
    pub status: JobStatus,
}

impl Job {
    /// True if the job is still open and its promised date has passed.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status.is_open() && self.expected_delivery_date < today
    }
}

// =============================================================================
// Job Draft
// =============================================================================

/// The intake form as submitted: raw strings, nothing normalized yet.
///
/// ## User Workflow
/// ```text
/// Intake form ──► JobDraft::validate() ──► JobDraft::into_job(today)
///                                                │
///                                                ▼
///                                       GarageStore::save_job
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct JobDraft {
    /// Set when editing an existing job.
    pub id: Option<String>,
    pub customer_name: String,
    pub customer_mobile: String,
    pub customer_address: Option<String>,
    pub vehicle_number: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    #[serde(rename = "type")]
    pub vehicle_type: Option<String>,
    pub color: Option<String>,
    pub services: Option<String>,
    /// Any accepted date shape; blank means today.
    pub date_in: Option<String>,
    /// Any accepted date shape; blank means today.
    pub expected_delivery_date: Option<String>,
    pub charges: Option<f64>,
    pub status: Option<JobStatus>,
}

impl JobDraft {
    /// Form-level checks: name, mobile and plate are required, charges may
    /// not be negative.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_required("customerName", &self.customer_name)?;
        validation::validate_mobile("customerMobile", &self.customer_mobile)?;
        validation::validate_required("vehicleNumber", &self.vehicle_number)?;
        if let Some(charges) = self.charges {
            validation::validate_non_negative("charges", charges)?;
        }
        Ok(())
    }

    /// Builds the record: trims text, upper-cases the plate, normalizes
    /// dates and fills defaults (`Received`, zero charges, fresh id).
    pub fn into_job(self, today: NaiveDate) -> Job {
        let normalize = |raw: Option<String>| {
            raw.map(|r| date::normalize_date_at(&r, today))
                .unwrap_or(today)
        };

        Job {
            id: non_blank(self.id).unwrap_or_else(new_id),
            customer_name: self.customer_name.trim().to_string(),
            customer_mobile: self.customer_mobile.trim().to_string(),
            customer_address: non_blank(self.customer_address),
            vehicle_number: self.vehicle_number.trim().to_uppercase(),
            brand: non_blank(self.brand),
            model: non_blank(self.model),
            vehicle_type: non_blank(self.vehicle_type),
            color: non_blank(self.color),
            services: non_blank(self.services),
            date_in: normalize(self.date_in),
            expected_delivery_date: normalize(self.expected_delivery_date),
            charges: Money::from_major(self.charges.unwrap_or(0.0).max(0.0)),
            status: self.status.unwrap_or_default(),
        }
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer profile derived from their most recent job.
///
/// Never stored: recomputed from the job list on every read.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Customer {
    /// Id of the job the profile was taken from.
    pub id: String,
    pub name: String,
    pub mobile: String,
    pub address: Option<String>,
    /// `dateIn` of the job the profile was taken from.
    #[serde(serialize_with = "canonical_date::serialize")]
    #[ts(as = "String")]
    pub created_at: NaiveDate,
}

// =============================================================================
// Invoice
// =============================================================================

/// Payment state of an invoice. Unrecognized values read as `Unpaid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum InvoiceStatus {
    Paid,
    Partial,
    #[default]
    #[serde(other)]
    Unpaid,
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InvoiceStatus::Paid => "Paid",
            InvoiceStatus::Unpaid => "Unpaid",
            InvoiceStatus::Partial => "Partial",
        };
        f.write_str(label)
    }
}

/// An invoice raised against a job.
///
/// `invoiceNumber` is assigned by the caller and is unique by convention
/// only. `totalAmount` is the subtotal; `grandTotal` is derived from it
/// with [`Invoice::recompute_totals`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct Invoice {
    pub id: String,
    pub invoice_number: Option<String>,
    pub invoice_for: Option<String>,
    pub job_id: Option<String>,
    pub customer_name: Option<String>,
    pub customer_mobile: Option<String>,
    pub customer_email: Option<String>,
    pub customer_address: Option<String>,
    pub date: Option<String>,
    pub branch: Option<String>,
    pub status: InvoiceStatus,
    pub details: Option<String>,
    /// Tax rate in percent (5.5 = 5.5%).
    pub tax: Option<f64>,
    /// Discount rate in percent.
    pub discount: Option<f64>,
    #[ts(type = "number")]
    pub total_amount: Money,
    #[ts(type = "number")]
    pub grand_total: Money,
    #[ts(type = "number")]
    pub adjustment_amount: Money,
    #[ts(type = "number")]
    pub due_amount: Money,
    pub notes: Option<String>,
    pub is_internal_note: Option<bool>,
    pub is_shared_with_customer: Option<bool>,
    /// Line items as entered; stored as a JSON column and not interpreted.
    #[ts(type = "unknown")]
    pub items: Option<Value>,
    pub coupon_number: Option<String>,
    pub assigned_to: Option<String>,
    pub repair_category: Option<String>,
    pub service_type: Option<String>,
    pub vehicle_name: Option<String>,
    pub plate_number: Option<String>,
    pub date_in: Option<String>,
    pub date_out: Option<String>,
}

// =============================================================================
// Inventory
// =============================================================================

/// A stocked part or consumable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InventoryItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    /// Current stock. Fractional for litres and metres.
    #[serde(default)]
    pub quantity: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
    /// At or below this level the item is reported as low stock.
    #[serde(default = "default_min_stock")]
    pub min_stock: f64,
    #[serde(default)]
    #[ts(type = "number")]
    pub price: Money,
    /// RFC 3339 timestamp of the last stock change.
    #[serde(default)]
    pub last_updated: String,
}

fn default_unit() -> String {
    "pcs".to_string()
}

fn default_min_stock() -> f64 {
    5.0
}

impl InventoryItem {
    /// A new item with the form defaults: no stock, `pcs`, reorder at 5.
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        InventoryItem {
            id: new_id(),
            name: name.into(),
            category: category.into(),
            quantity: 0.0,
            unit: default_unit(),
            min_stock: default_min_stock(),
            price: Money::zero(),
            last_updated: String::new(),
        }
    }

    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.min_stock
    }
}

/// A parts supplier.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub contact_person: Option<String>,
    pub mobile: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub category: Option<String>,
}

/// One line of a purchase order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct PurchaseLine {
    /// Id of the [`InventoryItem`] being restocked.
    pub product_id: String,
    pub quantity: f64,
    /// Unit price.
    #[ts(type = "number")]
    pub price: Money,
    /// `price × quantity`, recomputed on save.
    #[ts(type = "number")]
    pub amount: Money,
}

/// A stock purchase from a supplier.
///
/// Saving a purchase adds each line's quantity to the referenced item.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct Purchase {
    pub id: String,
    /// Human-facing number such as `PUR-4821`.
    pub purchase_no: String,
    pub purchase_date: String,
    pub supplier_id: String,
    pub items: Vec<PurchaseLine>,
    /// Sum of line amounts, recomputed on save.
    #[ts(type = "number")]
    pub total_amount: Money,
    pub notes: Option<String>,
}

// =============================================================================
// Branch & Shop Config
// =============================================================================

/// A workshop location.
///
/// The remote column for `contactNumber` is `contactnumber`; the adapter in
/// `garage-sync` translates between the two.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct Branch {
    pub id: String,
    pub name: String,
    pub contact_number: String,
    pub email: String,
    pub country: String,
    pub state: String,
    pub city: String,
    pub address: String,
}

/// Shop-wide settings. Exactly one exists; its remote row id is
/// [`crate::SHOP_CONFIG_ID`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct ShopConfig {
    /// WhatsApp group new customers are invited to.
    pub group_invite_link: String,
    pub shop_name: String,
    pub shop_address: String,
    pub shop_phone: String,
    pub shop_email: String,
    pub terms_and_conditions: String,
}

impl ShopConfig {
    /// Shop name for outgoing messages.
    pub fn display_name(&self) -> &str {
        let name = self.shop_name.trim();
        if name.is_empty() {
            crate::DEFAULT_SHOP_NAME
        } else {
            name
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_status_wire_labels() {
        assert_eq!(serde_json::to_value(JobStatus::InProgress).unwrap(), json!("In Progress"));
        let parsed: JobStatus = serde_json::from_value(json!("In Progress")).unwrap();
        assert_eq!(parsed, JobStatus::InProgress);
        assert_eq!("in_progress".parse::<JobStatus>().unwrap(), JobStatus::InProgress);
        assert!("parked".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_job_row_normalizes_dates() {
        let row = json!({
            "id": "job-1",
            "customerName": "Asha",
            "customerMobile": "9876543210",
            "vehicleNumber": "KA01AB1234",
            "type": "SUV",
            "dateIn": "1700000000000",
            "expectedDeliveryDate": "2024-03-05T10:00:00Z",
            "charges": "2500",
            "status": "Completed"
        });

        let job: Job = serde_json::from_value(row).unwrap();
        assert_eq!(job.date_in, day(2023, 11, 14));
        assert_eq!(job.expected_delivery_date, day(2024, 3, 5));
        assert_eq!(job.charges, Money::from_major(2500.0));
        assert_eq!(job.vehicle_type.as_deref(), Some("SUV"));

        let back = serde_json::to_value(&job).unwrap();
        assert_eq!(back["dateIn"], json!("2023-11-14"));
        assert_eq!(back["type"], json!("SUV"));
        assert_eq!(back["status"], json!("Completed"));
    }

    #[test]
    fn test_draft_into_job_defaults() {
        let draft = JobDraft {
            customer_name: "  Ravi ".into(),
            customer_mobile: "98450 12345".into(),
            vehicle_number: "ka05mn4321".into(),
            brand: Some("  ".into()),
            date_in: Some("03/05/2024".into()),
            ..Default::default()
        };

        let job = draft.into_job(day(2024, 3, 6));
        assert!(!job.id.is_empty());
        assert_eq!(job.customer_name, "Ravi");
        assert_eq!(job.vehicle_number, "KA05MN4321");
        assert_eq!(job.brand, None);
        assert_eq!(job.date_in, day(2024, 3, 5));
        assert_eq!(job.expected_delivery_date, day(2024, 3, 6));
        assert_eq!(job.status, JobStatus::Received);
        assert!(job.charges.is_zero());
    }

    #[test]
    fn test_draft_validation() {
        let mut draft = JobDraft {
            customer_name: "Ravi".into(),
            customer_mobile: "9845012345".into(),
            vehicle_number: "KA05MN4321".into(),
            ..Default::default()
        };
        assert!(draft.validate().is_ok());

        draft.charges = Some(-10.0);
        assert!(draft.validate().is_err());

        draft.charges = None;
        draft.vehicle_number = " ".into();
        assert_eq!(
            draft.validate(),
            Err(ValidationError::Required {
                field: "vehicleNumber".into()
            })
        );
    }

    #[test]
    fn test_unknown_invoice_status_is_unpaid() {
        let invoice: Invoice =
            serde_json::from_value(json!({"id": "inv-1", "status": "Refunded"})).unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Unpaid);
        assert!(invoice.grand_total.is_zero());

        let partial: InvoiceStatus = serde_json::from_value(json!("Partial")).unwrap();
        assert_eq!(partial, InvoiceStatus::Partial);
        assert_eq!(serde_json::to_value(InvoiceStatus::Unpaid).unwrap(), json!("Unpaid"));
    }

    #[test]
    fn test_inventory_defaults() {
        let item: InventoryItem =
            serde_json::from_value(json!({"id": "oil", "name": "Engine Oil"})).unwrap();
        assert_eq!(item.unit, "pcs");
        assert_eq!(item.min_stock, 5.0);
        assert!(item.is_low_stock());

        let fresh = InventoryItem::new("Wiper Blade", "Accessories");
        assert_eq!(fresh.unit, "pcs");
        assert!(!fresh.id.is_empty());
    }

    #[test]
    fn test_shop_display_name_fallback() {
        let mut config = ShopConfig::default();
        assert_eq!(config.display_name(), crate::DEFAULT_SHOP_NAME);
        config.shop_name = "KM Automobiles".into();
        assert_eq!(config.display_name(), "KM Automobiles");
    }
}
