//! # Money Module
//!
//! Charges, prices and invoice totals are held as integer minor units
//! (paise/cents). The remote store and the dashboard both speak plain JSON
//! numbers in major units, so `Money` serializes as `1100` or `1100.5` and
//! accepts numbers, numeric strings and `null` on the way in.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Invoice: subtotal 999.99, tax 5.5%, discount 3%                        │
//! │                                                                         │
//! │  f64:   999.99 * 5.5 / 100 = 54.99944999999999  ❌ drifts              │
//! │  cents: 99999 * 550 bps    = 5500 cents         ✅ exact, rounded once  │
//! │                                                                         │
//! │  Percentages are basis points (5.5% = 550 bps) for the same reason.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Arithmetic saturates at the `i64` bounds instead of overflowing, so a
//! garbage amount in one row can't panic a revenue total.
//!
//! ## Usage
//! ```rust
//! use garage_core::money::{Money, Percent};
//!
//! let charges = Money::from_major(1500.0);
//! let tax = charges.percentage(Percent::from_percentage(5.5));
//! assert_eq!(tax.cents(), 8250);
//! ```

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in minor units.
///
/// ## Where Money is Used
/// ```text
/// Job.charges ──► dashboard revenue, customer total spend
/// Invoice.totalAmount ──► compute_totals ──► Invoice.grandTotal
/// PurchaseLine.price × quantity ──► PurchaseLine.amount ──► Purchase.totalAmount
/// ```
///
/// Record fields holding `Money` are exported to TypeScript as `number`
/// via `#[ts(type = "number")]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from a major-unit amount as sent by the
    /// dashboard (`1499.5` → 149950 cents). Rounds to the nearest cent;
    /// non-finite input becomes zero.
    ///
    /// ## Example
    /// ```rust
    /// use garage_core::money::Money;
    ///
    /// assert_eq!(Money::from_major(10.99).cents(), 1099);
    /// assert_eq!(Money::from_major(f64::NAN), Money::zero());
    /// ```
    pub fn from_major(major: f64) -> Self {
        if !major.is_finite() {
            return Money::zero();
        }
        Money((major * 100.0).round() as i64)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the value in major units (for JSON and display only).
    #[inline]
    pub fn to_major(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns `rate` of this amount, rounded half away from zero to the
    /// nearest cent.
    ///
    /// ## Example
    /// ```rust
    /// use garage_core::money::{Money, Percent};
    ///
    /// let subtotal = Money::from_major(1000.0);
    /// assert_eq!(subtotal.percentage(Percent::from_percentage(10.0)), Money::from_major(100.0));
    /// ```
    pub fn percentage(&self, rate: Percent) -> Money {
        // i128 keeps large invoices from overflowing during the multiply
        let scaled = self.0 as i128 * rate.bps() as i128;
        let half = if scaled < 0 { -5000 } else { 5000 };
        Money(((scaled + half) / 10000).clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }

    /// Multiplies a unit price by a (possibly fractional) quantity.
    ///
    /// Inventory is tracked in litres and metres as well as pieces, so
    /// quantities are `f64`. The product is rounded to the nearest cent.
    ///
    /// ## Example
    /// ```rust
    /// use garage_core::money::Money;
    ///
    /// let per_litre = Money::from_major(450.0);
    /// assert_eq!(per_litre.multiply_quantity(3.5), Money::from_major(1575.0));
    /// ```
    pub fn multiply_quantity(&self, qty: f64) -> Money {
        if !qty.is_finite() {
            return Money::zero();
        }
        Money((self.0 as f64 * qty).round() as i64)
    }
}

/// Shows the amount the way the dashboard does: whole amounts without
/// decimals, everything else with two.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        if abs % 100 == 0 {
            write!(f, "{}{}", sign, abs / 100)
        } else {
            write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
        }
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(self.0.saturating_neg())
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Serde (major units on the wire)
// =============================================================================

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % 100 == 0 {
            serializer.serialize_i64(self.0 / 100)
        } else {
            serializer.serialize_f64(self.to_major())
        }
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

/// Accepts whatever the remote store hands back for a numeric column.
///
/// Rows written by older dashboard builds carry `"1500"` strings and
/// `null` for jobs that were never priced.
struct MoneyVisitor;

impl<'de> Visitor<'de> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an amount as a number, numeric string or null")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
        v.checked_mul(100)
            .map(Money)
            .ok_or_else(|| E::custom(format!("amount {} is out of range", v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
        i64::try_from(v)
            .map_err(|_| E::custom(format!("amount {} is out of range", v)))
            .and_then(|v| self.visit_i64(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
        Ok(Money::from_major(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            return Ok(Money::zero());
        }
        trimmed
            .parse::<f64>()
            .map(Money::from_major)
            .map_err(|_| E::custom(format!("invalid amount '{}'", v)))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Money, E> {
        Ok(Money::zero())
    }

    fn visit_none<E: de::Error>(self) -> Result<Money, E> {
        Ok(Money::zero())
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Money, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

// =============================================================================
// Percent
// =============================================================================

/// A percentage in basis points (1 bps = 0.01%).
///
/// Invoice forms offer rates like 5.5%, which are exact in basis points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Percent(u32);

impl Percent {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Percent(bps)
    }

    /// Creates a rate from a percentage as typed into the form.
    ///
    /// Negative and non-finite input clamps to zero.
    pub fn from_percentage(pct: f64) -> Self {
        if !pct.is_finite() || pct <= 0.0 {
            return Percent(0);
        }
        Percent((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn as_percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
