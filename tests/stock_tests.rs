//! Inventory aggregation behavior at the public API.

use anyhow::Result;
use pantry::model::{InventoryItem, Recipe, UserId};
use pantry::stock::{aggregate, inventory_as_base};
use pantry::store::Store;

struct FixedStore {
    inventory: Vec<InventoryItem>,
}

impl Store for FixedStore {
    fn list_inventory(&self, _owner: UserId) -> Result<Vec<InventoryItem>> {
        Ok(self.inventory.clone())
    }

    fn list_recipes(&self, _owner: UserId) -> Result<Vec<Recipe>> {
        Ok(Vec::new())
    }

    fn adjust_inventory(&self, _owner: UserId, _name: &str, _delta: f64, _unit: &str) -> Result<bool> {
        Ok(false)
    }
}

fn item(name: &str, quantity: f64, unit: &str) -> InventoryItem {
    InventoryItem {
        id: 0,
        name: name.to_string(),
        quantity,
        unit: unit.to_string(),
    }
}

#[test]
fn test_duplicate_rows_sum_into_one_key() {
    let agg = aggregate(&[
        item("Nước mắm", 100.0, "ml"),
        item("  nước mắm", 2.0, "tbsp"),
        item("NƯỚC MẮM ", 1.0, "chén"),
    ]);
    assert_eq!(agg.len(), 1);
    let total = agg[&("nước mắm".to_string(), "ml")];
    assert!((total - 230.0).abs() < 1e-9);
}

#[test]
fn test_unknown_units_aggregate_as_pieces() {
    // Permissive fallback: a malformed unit contributes count stock.
    let agg = aggregate(&[item("egg", 2.0, "XYZ"), item("egg", 3.0, "pieces")]);
    assert_eq!(agg.len(), 1);
    assert!((agg[&("egg".to_string(), "piece")] - 5.0).abs() < 1e-9);
}

#[test]
fn test_shuffled_input_gives_same_map() {
    let rows = vec![
        item("flour", 0.25, "kg"),
        item("flour", 333.0, "g"),
        item("milk", 1.0, "l"),
        item("flour", 1.0, "lạng"),
        item("milk", 3.0, "cup"),
    ];
    let mut rotated = rows.clone();
    rotated.rotate_left(2);

    let a = aggregate(&rows);
    let b = aggregate(&rotated);
    assert_eq!(a.len(), b.len());
    for (key, value) in &a {
        assert!((value - b[key]).abs() < 1e-9, "key {:?}", key);
    }
}

#[test]
fn test_inventory_as_base_requires_owner() -> Result<()> {
    let store = FixedStore {
        inventory: vec![item("rice", 5.0, "kg")],
    };

    let with_owner = inventory_as_base(&store, Some(1))?;
    assert!((with_owner[&("rice".to_string(), "g")] - 5000.0).abs() < 1e-9);

    // Absent owner id: empty map, not an error.
    let without_owner = inventory_as_base(&store, None)?;
    assert!(without_owner.is_empty());
    Ok(())
}
