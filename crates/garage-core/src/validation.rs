//! # Validation Module
//!
//! Field checks for the dashboard's forms.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Form (frontend)                                              │
//! │  └── THIS MODULE via JobDraft::validate and friends                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: GarageStore mutations                                        │
//! │  └── No checks: whatever the caller hands over is stored               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Remote tables                                                │
//! │  └── Column types and NOT NULL constraints                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use garage_core::validation::{validate_mobile, validate_percentage};
//!
//! assert!(validate_mobile("customerMobile", "+91 98450-12345").is_ok());
//! assert!(validate_percentage("tax", 5.5).is_ok());
//! ```

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest free-text field the remote tables accept.
pub const MAX_TEXT_LENGTH: usize = 500;

// =============================================================================
// String Validators
// =============================================================================

/// Rejects blank values and anything longer than [`MAX_TEXT_LENGTH`].
///
/// ## Example
/// ```rust
/// use garage_core::validation::validate_required;
///
/// assert!(validate_required("customerName", "Asha").is_ok());
/// assert!(validate_required("customerName", "   ").is_err());
/// ```
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > MAX_TEXT_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_TEXT_LENGTH,
        });
    }

    Ok(())
}

/// Validates a mobile number.
///
/// ## Rules
/// - Required
/// - Only digits, spaces, `+`, `-`, `(`, `)` allowed
/// - 10 to 13 digits once punctuation is stripped (bare local number up to
///   a number carrying its country code)
pub fn validate_mobile(field: &str, value: &str) -> ValidationResult<()> {
    validate_required(field, value)?;

    if !value
        .trim()
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')'))
    {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must contain only digits, spaces and + - ( )".to_string(),
        });
    }

    let digits = value.chars().filter(|c| c.is_ascii_digit()).count();
    if !(10..=13).contains(&digits) {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: format!("expected 10 to 13 digits, found {}", digits),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Rejects negative and non-finite amounts (charges, prices, quantities).
pub fn validate_non_negative(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a number".to_string(),
        });
    }
    if value < 0.0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a tax or discount rate in percent.
///
/// ## Example
/// ```rust
/// use garage_core::validation::validate_percentage;
///
/// assert!(validate_percentage("discount", 100.0).is_ok());
/// assert!(validate_percentage("discount", 120.0).is_err());
/// ```
pub fn validate_percentage(field: &str, value: f64) -> ValidationResult<()> {
    validate_non_negative(field, value)?;
    if value > 100.0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0.0,
            max: 100.0,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required() {
        assert!(validate_required("name", "Asha").is_ok());
        assert!(validate_required("name", "").is_err());
        assert!(matches!(
            validate_required("name", &"x".repeat(MAX_TEXT_LENGTH + 1)),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_mobile() {
        assert!(validate_mobile("mobile", "9845012345").is_ok());
        assert!(validate_mobile("mobile", "+91 (984) 501-2345").is_ok());
        assert!(validate_mobile("mobile", "98450").is_err());
        assert!(validate_mobile("mobile", "98450abcde").is_err());
    }

    #[test]
    fn test_numbers() {
        assert!(validate_non_negative("charges", 0.0).is_ok());
        assert!(validate_non_negative("charges", -0.01).is_err());
        assert!(validate_non_negative("charges", f64::NAN).is_err());
        assert!(validate_percentage("tax", 5.5).is_ok());
        assert!(validate_percentage("tax", 100.5).is_err());
    }
}
