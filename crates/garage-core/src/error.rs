//! # Error Types
//!
//! Domain-specific error types for garage-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  garage-core errors (this file)                                        │
//! │  ├── CoreError        - Domain rule failures                           │
//! │  └── ValidationError  - Form input failures                            │
//! │                                                                         │
//! │  garage-db errors                                                      │
//! │  └── DbError          - Local cache failures                           │
//! │                                                                         │
//! │  garage-sync errors                                                    │
//! │  └── SyncError        - Remote store, config, cache-through failures   │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → SyncError → Dashboard             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validation is the caller's responsibility: the store never rejects a
//! record for a missing field. Forms call [`crate::JobDraft::validate`] (or
//! the helpers in [`crate::validation`]) before handing records over.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Domain rule failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No job with the given id.
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// No invoice with the given id.
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(String),

    /// A purchase line points at an inventory item that does not exist.
    ///
    /// ## When This Occurs
    /// - The item was deleted after the purchase form was opened
    /// - The purchase was imported from another branch's catalogue
    #[error("Inventory item not found for purchase line: {0}")]
    InventoryItemNotFound(String),

    /// A status string that is not one of the four job stages.
    #[error("Unknown job status: {0}")]
    UnknownStatus(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// A required field is missing or blank.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: f64, max: f64 },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (mobile number, date, ...).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
