//! # Inventory Aggregation
//!
//! Collapses a user's raw stock rows into a single base-unit map. Duplicate
//! ingredient names under different casings or spellings of the same unit
//! dimension are summed together. The map is derived on demand and never
//! cached, so it cannot go stale against the store.

use crate::model::{normalize_name, InventoryItem, UserId};
use crate::store::Store;
use crate::units::to_base;
use anyhow::Result;
use log::{debug, info, warn};
use std::collections::HashMap;

/// Aggregated stock, keyed by (normalized ingredient name, base unit).
///
/// Values are total quantities in the key's base unit. Summation is
/// commutative, so input row order never changes the result beyond
/// floating-point noise well under the evaluator's comparison epsilon.
pub type StockMap = HashMap<(String, &'static str), f64>;

/// Aggregate raw inventory rows into a [`StockMap`].
pub fn aggregate(rows: &[InventoryItem]) -> StockMap {
    let mut agg = StockMap::new();
    for row in rows {
        let (base_qty, base_unit) = to_base(row.quantity, &row.unit);
        let key = (normalize_name(&row.name), base_unit);
        debug!(
            "aggregate: {} -> {} {} (key: {:?})",
            row.name, base_qty, base_unit, key
        );
        *agg.entry(key).or_insert(0.0) += base_qty;
    }
    agg
}

/// Load and aggregate a user's inventory in base units.
///
/// A missing owner id is a caller precondition violation, not a data error:
/// it yields an empty map and a warning rather than failing.
pub fn inventory_as_base(store: &impl Store, owner: Option<UserId>) -> Result<StockMap> {
    let Some(owner) = owner else {
        warn!("inventory_as_base: no owner id provided");
        return Ok(StockMap::new());
    };
    let rows = store.list_inventory(owner)?;
    info!(
        "inventory_as_base: retrieved {} inventory rows for owner {}",
        rows.len(),
        owner
    );
    Ok(aggregate(&rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, quantity: f64, unit: &str) -> InventoryItem {
        InventoryItem {
            id: 0,
            name: name.to_string(),
            quantity,
            unit: unit.to_string(),
        }
    }

    #[test]
    fn test_aggregate_merges_name_casings_and_units() {
        let rows = vec![
            item("Chicken", 1.0, "kg"),
            item(" chicken ", 500.0, "g"),
            item("chicken", 2.0, "lạng"),
        ];
        let agg = aggregate(&rows);
        assert_eq!(agg.len(), 1);
        let total = agg[&("chicken".to_string(), "g")];
        assert!((total - 1700.0).abs() < 1e-9);
    }

    #[test]
    fn test_aggregate_keeps_dimensions_apart() {
        let rows = vec![item("egg", 6.0, "pieces"), item("egg", 120.0, "g")];
        let agg = aggregate(&rows);
        assert_eq!(agg.len(), 2);
        assert!((agg[&("egg".to_string(), "piece")] - 6.0).abs() < 1e-9);
        assert!((agg[&("egg".to_string(), "g")] - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_aggregate_is_order_independent() {
        let rows = vec![
            item("milk", 1.0, "l"),
            item("Milk", 250.0, "ml"),
            item("milk", 1.0, "cup"),
        ];
        let mut reversed = rows.clone();
        reversed.reverse();

        let a = aggregate(&rows);
        let b = aggregate(&reversed);
        assert_eq!(a.len(), b.len());
        for (key, value) in &a {
            assert!((value - b[key]).abs() < 1e-9, "key {:?}", key);
        }
    }

    #[test]
    fn test_aggregate_empty() {
        assert!(aggregate(&[]).is_empty());
    }
}
