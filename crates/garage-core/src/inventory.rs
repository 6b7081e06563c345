//! # Inventory & Purchases
//!
//! Purchase line math and the stock movements a purchase causes.
//!
//! ## Stock Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  save Purchase P (lines: oil ×5, filter ×2)                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  recompute(): amount = price × qty, totalAmount = Σ amount             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  stock_deltas(previous P?, P)                                          │
//! │       │   first save:  oil +5, filter +2                               │
//! │       │   re-save with oil ×7: oil +2 (only the difference)            │
//! │       ▼                                                                 │
//! │  apply_stock_deltas(): quantity += delta, lastUpdated = now            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Deleting a purchase does not give the stock back.

use uuid::Uuid;

use crate::money::Money;
use crate::types::{InventoryItem, Purchase};

/// Net quantity change for one inventory item.
#[derive(Debug, Clone, PartialEq)]
pub struct StockDelta {
    pub product_id: String,
    pub delta: f64,
}

/// Result of applying deltas to the inventory list.
#[derive(Debug, Clone, Default)]
pub struct StockApplication {
    /// Items whose quantity changed, after the change.
    pub touched: Vec<InventoryItem>,
    /// Product ids referenced by a delta but absent from the inventory.
    pub missing: Vec<String>,
}

impl Purchase {
    /// Recomputes each line's amount and the purchase total.
    pub fn recompute(&mut self) {
        for line in &mut self.items {
            line.amount = line.price.multiply_quantity(line.quantity);
        }
        self.total_amount = self.items.iter().map(|line| line.amount).sum::<Money>();
    }
}

/// A fresh human-facing purchase number, `PUR-` plus four digits.
pub fn generate_purchase_no() -> String {
    format!("PUR-{:04}", Uuid::new_v4().as_u128() % 10_000)
}

/// Quantity changes needed to move inventory from `previous` (the stored
/// version of this purchase, if any) to `next`.
///
/// Lines for the same product are summed. Products appear in the order
/// they are first mentioned; zero deltas are dropped.
pub fn stock_deltas(previous: Option<&Purchase>, next: &Purchase) -> Vec<StockDelta> {
    let mut deltas: Vec<StockDelta> = Vec::new();

    let mut add = |product_id: &str, delta: f64| {
        match deltas.iter_mut().find(|d| d.product_id == product_id) {
            Some(existing) => existing.delta += delta,
            None => deltas.push(StockDelta {
                product_id: product_id.to_string(),
                delta,
            }),
        }
    };

    if let Some(previous) = previous {
        for line in &previous.items {
            add(&line.product_id, -line.quantity);
        }
    }
    for line in &next.items {
        add(&line.product_id, line.quantity);
    }

    deltas.retain(|d| d.delta != 0.0 && d.delta.is_finite());
    deltas
}

/// Applies deltas in place, stamping `timestamp` on every touched item.
pub fn apply_stock_deltas(
    items: &mut [InventoryItem],
    deltas: &[StockDelta],
    timestamp: &str,
) -> StockApplication {
    let mut result = StockApplication::default();

    for delta in deltas {
        match items.iter_mut().find(|item| item.id == delta.product_id) {
            Some(item) => {
                item.quantity += delta.delta;
                item.last_updated = timestamp.to_string();
                result.touched.push(item.clone());
            }
            None => result.missing.push(delta.product_id.clone()),
        }
    }

    result
}

/// Items at or below their reorder level, lowest stock first.
pub fn low_stock(items: &[InventoryItem]) -> Vec<InventoryItem> {
    let mut low: Vec<InventoryItem> = items
        .iter()
        .filter(|item| item.is_low_stock())
        .cloned()
        .collect();
    low.sort_by(|a, b| a.quantity.total_cmp(&b.quantity));
    low
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PurchaseLine;

    fn line(product_id: &str, quantity: f64, price: f64) -> PurchaseLine {
        PurchaseLine {
            product_id: product_id.into(),
            quantity,
            price: Money::from_major(price),
            amount: Money::zero(),
        }
    }

    fn item(id: &str, quantity: f64) -> InventoryItem {
        InventoryItem {
            id: id.into(),
            quantity,
            ..InventoryItem::new(id, "Parts")
        }
    }

    #[test]
    fn test_recompute_amounts() {
        let mut purchase = Purchase {
            items: vec![line("p1", 5.0, 10.0), line("p2", 2.0, 7.5)],
            ..Default::default()
        };
        purchase.recompute();

        assert_eq!(purchase.items[0].amount, Money::from_major(50.0));
        assert_eq!(purchase.items[1].amount, Money::from_major(15.0));
        assert_eq!(purchase.total_amount, Money::from_major(65.0));
    }

    #[test]
    fn test_first_save_adds_full_quantities() {
        let purchase = Purchase {
            items: vec![line("p1", 5.0, 10.0), line("p2", 1.0, 3.0), line("p1", 2.0, 10.0)],
            ..Default::default()
        };

        let deltas = stock_deltas(None, &purchase);
        assert_eq!(
            deltas,
            vec![
                StockDelta { product_id: "p1".into(), delta: 7.0 },
                StockDelta { product_id: "p2".into(), delta: 1.0 },
            ]
        );
    }

    #[test]
    fn test_resave_applies_only_the_difference() {
        let before = Purchase {
            items: vec![line("p1", 5.0, 10.0), line("p2", 4.0, 3.0)],
            ..Default::default()
        };
        let after = Purchase {
            items: vec![line("p1", 7.0, 10.0), line("p3", 1.0, 3.0)],
            ..Default::default()
        };

        let deltas = stock_deltas(Some(&before), &after);
        assert_eq!(
            deltas,
            vec![
                StockDelta { product_id: "p1".into(), delta: 2.0 },
                StockDelta { product_id: "p2".into(), delta: -4.0 },
                StockDelta { product_id: "p3".into(), delta: 1.0 },
            ]
        );

        assert!(stock_deltas(Some(&after), &after).is_empty());
    }

    #[test]
    fn test_apply_reports_missing_items() {
        let mut items = vec![item("p1", 3.0)];
        let deltas = vec![
            StockDelta { product_id: "p1".into(), delta: 5.0 },
            StockDelta { product_id: "ghost".into(), delta: 1.0 },
        ];

        let applied = apply_stock_deltas(&mut items, &deltas, "2025-06-15T10:00:00Z");
        assert_eq!(items[0].quantity, 8.0);
        assert_eq!(items[0].last_updated, "2025-06-15T10:00:00Z");
        assert_eq!(applied.touched.len(), 1);
        assert_eq!(applied.missing, vec!["ghost".to_string()]);
    }

    #[test]
    fn test_low_stock_sorted() {
        let items = vec![item("a", 4.0), item("b", 50.0), item("c", 0.0), item("d", 5.0)];
        let low: Vec<String> = low_stock(&items).into_iter().map(|i| i.id).collect();
        assert_eq!(low, vec!["c", "a", "d"]);
    }

    #[test]
    fn test_purchase_number_shape() {
        let no = generate_purchase_no();
        assert!(no.starts_with("PUR-"));
        assert_eq!(no.len(), 8);
    }
}
