//! # Invoice Totals
//!
//! ```text
//! taxAmount  = subtotal × tax% / 100
//! grandTotal = subtotal + taxAmount − subtotal × discount% / 100
//! ```
//!
//! Both percentages apply to the subtotal, not to each other. Totals are
//! recomputed whenever any input changes, and always on save.

use serde::Serialize;
use ts_rs::TS;

use crate::money::{Money, Percent};
use crate::types::{Invoice, InvoiceStatus};

/// Derived amounts for one invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InvoiceTotals {
    #[ts(type = "number")]
    pub tax_amount: Money,
    #[ts(type = "number")]
    pub discount_amount: Money,
    #[ts(type = "number")]
    pub grand_total: Money,
}

/// Computes tax and grand total from a subtotal and two percentages.
///
/// ## Example
/// ```rust
/// use garage_core::invoice::compute_totals;
/// use garage_core::money::Money;
///
/// let totals = compute_totals(Money::from_major(1000.0), 0.0, 20.0);
/// assert_eq!(totals.grand_total, Money::from_major(800.0));
/// ```
pub fn compute_totals(subtotal: Money, tax_pct: f64, discount_pct: f64) -> InvoiceTotals {
    let tax_amount = subtotal.percentage(Percent::from_percentage(tax_pct));
    let discount_amount = subtotal.percentage(Percent::from_percentage(discount_pct));

    InvoiceTotals {
        tax_amount,
        discount_amount,
        grand_total: subtotal + tax_amount - discount_amount,
    }
}

impl Invoice {
    /// Totals for the invoice's current subtotal, tax and discount.
    pub fn totals(&self) -> InvoiceTotals {
        compute_totals(
            self.total_amount,
            self.tax.unwrap_or(0.0),
            self.discount.unwrap_or(0.0),
        )
    }

    /// Overwrites `grandTotal` from the other inputs.
    pub fn recompute_totals(&mut self) {
        self.grand_total = self.totals().grand_total;
    }

    /// Marks the invoice as fully paid.
    pub fn mark_paid(&mut self) {
        self.status = InvoiceStatus::Paid;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_only() {
        let totals = compute_totals(Money::from_major(1000.0), 10.0, 0.0);
        assert_eq!(totals.tax_amount, Money::from_major(100.0));
        assert_eq!(totals.grand_total, Money::from_major(1100.0));
    }

    #[test]
    fn test_discount_only() {
        let totals = compute_totals(Money::from_major(1000.0), 0.0, 20.0);
        assert!(totals.tax_amount.is_zero());
        assert_eq!(totals.discount_amount, Money::from_major(200.0));
        assert_eq!(totals.grand_total, Money::from_major(800.0));
    }

    #[test]
    fn test_both_apply_to_subtotal() {
        // 2000 + 5.5% (110) - 10% (200) = 1910
        let totals = compute_totals(Money::from_major(2000.0), 5.5, 10.0);
        assert_eq!(totals.tax_amount, Money::from_major(110.0));
        assert_eq!(totals.grand_total, Money::from_major(1910.0));
    }

    #[test]
    fn test_recompute_on_invoice() {
        let mut invoice = Invoice {
            id: "inv-1".into(),
            total_amount: Money::from_major(1000.0),
            tax: Some(10.0),
            grand_total: Money::from_major(1.0),
            ..Default::default()
        };

        invoice.recompute_totals();
        assert_eq!(invoice.grand_total, Money::from_major(1100.0));

        invoice.mark_paid();
        assert_eq!(invoice.status, InvoiceStatus::Paid);
    }
}
