//! # Recipe Feasibility
//!
//! Compares a recipe's ingredient requirements against aggregated stock and
//! produces a verdict plus a precise shortfall list, expressed back in the
//! recipe's own display units. Also hosts the derived operations built on
//! top of evaluation: multi-recipe ranking, shopping-list derivation, and
//! stock consumption.

use crate::model::{normalize_name, Recipe, ShoppingItem, UserId};
use crate::stock::{inventory_as_base, StockMap};
use crate::store::Store;
use crate::units::{from_base, to_base};
use anyhow::{bail, Result};
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashMap;

/// Comparison epsilon guarding floating-point summation noise. It never
/// masks a real shortfall, which is orders of magnitude larger.
pub const EPSILON: f64 = 1e-9;

/// The computed deficit for one ingredient requirement, in both base units
/// and the requirement's display unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shortfall {
    pub name: String,
    pub needed_qty: f64,
    pub needed_unit: String,
    pub have_qty: f64,
    pub have_unit: String,
    pub missing_base: f64,
    pub base_unit: String,
    pub missing_qty_disp: f64,
    pub missing_unit_disp: String,
}

/// One recipe's evaluation result, carrying enough to rank it against
/// others without re-reading the stock.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeFeasibility {
    pub recipe: Recipe,
    pub feasible: bool,
    pub shortfalls: Vec<Shortfall>,
    /// Requirements fully covered by stock.
    pub satisfied: usize,
}

/// Evaluate one recipe against an aggregated stock map.
///
/// Returns the verdict and the shortfall list in the recipe's declared
/// ingredient order. The recipe is feasible iff the list is empty.
pub fn evaluate(recipe: &Recipe, stock: &StockMap) -> (bool, Vec<Shortfall>) {
    let mut shortfalls = Vec::new();
    for req in &recipe.ingredients {
        let name = normalize_name(&req.name);
        let (needed_base, base_unit) = to_base(req.quantity, &req.unit);
        let have_base = stock
            .get(&(name.clone(), base_unit))
            .copied()
            .unwrap_or(0.0);
        debug!(
            "evaluate: {} (normalized: {}) need {} {} have {} {}",
            req.name, name, needed_base, base_unit, have_base, base_unit
        );
        if have_base + EPSILON < needed_base {
            let missing = needed_base - have_base;
            shortfalls.push(Shortfall {
                name: req.name.clone(),
                needed_qty: req.quantity,
                needed_unit: req.unit.clone(),
                have_qty: from_base(have_base, base_unit, &req.unit),
                have_unit: req.unit.clone(),
                missing_base: missing,
                base_unit: base_unit.to_string(),
                missing_qty_disp: from_base(missing, base_unit, &req.unit),
                missing_unit_disp: req.unit.clone(),
            });
        }
    }
    let feasible = shortfalls.is_empty();
    info!(
        "evaluate: recipe '{}' feasible: {}, missing ingredients: {}",
        recipe.title,
        feasible,
        shortfalls.len()
    );
    (feasible, shortfalls)
}

/// Evaluate one recipe against a user's stored inventory.
///
/// A missing owner id yields `(false, [])` rather than an error; storage
/// failures propagate.
pub fn recipe_feasibility(
    store: &impl Store,
    recipe: &Recipe,
    owner: Option<UserId>,
) -> Result<(bool, Vec<Shortfall>)> {
    if owner.is_none() {
        error!("recipe_feasibility: no valid owner id");
        return Ok((false, Vec::new()));
    }
    let stock = inventory_as_base(store, owner)?;
    info!(
        "recipe_feasibility: checking '{}' (id={})",
        recipe.title, recipe.id
    );
    Ok(evaluate(recipe, &stock))
}

/// Evaluate every recipe a user owns against one stock snapshot, ranked
/// least-missing first.
pub fn evaluate_all(store: &impl Store, owner: Option<UserId>) -> Result<Vec<RecipeFeasibility>> {
    let Some(owner_id) = owner else {
        error!("evaluate_all: no valid owner id");
        return Ok(Vec::new());
    };
    let stock = inventory_as_base(store, owner)?;
    let mut results = Vec::new();
    for recipe in store.list_recipes(owner_id)? {
        let (feasible, shortfalls) = evaluate(&recipe, &stock);
        let satisfied = recipe.ingredients.len() - shortfalls.len();
        results.push(RecipeFeasibility {
            recipe,
            feasible,
            shortfalls,
            satisfied,
        });
    }
    rank_recipes(&mut results);
    Ok(results)
}

/// Order evaluation results by (missing ingredients ascending, satisfied
/// ingredients descending). Pure over the results; the sort is stable, so
/// ties keep their incoming order.
pub fn rank_recipes(results: &mut [RecipeFeasibility]) {
    results.sort_by_key(|r| (r.shortfalls.len(), Reverse(r.satisfied)));
}

/// Merge the shortfalls of the selected recipes into one shopping list.
///
/// Lines with the same (normalized name, unit) are summed; first-seen order
/// is preserved.
pub fn shopping_list(selected: &[&RecipeFeasibility]) -> Vec<ShoppingItem> {
    let mut items: Vec<ShoppingItem> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    for result in selected {
        for short in &result.shortfalls {
            let key = (
                normalize_name(&short.name),
                short.missing_unit_disp.clone(),
            );
            match index.get(&key) {
                Some(&i) => items[i].quantity += short.missing_qty_disp,
                None => {
                    index.insert(key, items.len());
                    items.push(ShoppingItem {
                        name: short.name.clone(),
                        quantity: short.missing_qty_disp,
                        unit: short.missing_unit_disp.clone(),
                    });
                }
            }
        }
    }
    items
}

/// Consume a recipe's ingredients from the owner's stock.
///
/// Re-evaluates feasibility first; an infeasible recipe changes nothing and
/// reports `Ok(false)`. When feasible, each requirement is applied as one
/// negative adjustment in the requirement's own declared unit. An adjustment
/// the store cannot apply, or a storage error, aborts the sequence with an
/// error; writes already applied are not rolled back, the failure is
/// surfaced to the caller.
pub fn consume_for_recipe(
    store: &impl Store,
    recipe: &Recipe,
    owner: Option<UserId>,
) -> Result<bool> {
    let (feasible, _) = recipe_feasibility(store, recipe, owner)?;
    if !feasible {
        return Ok(false);
    }
    let Some(owner) = owner else {
        error!("consume_for_recipe: no valid owner id");
        return Ok(false);
    };
    for req in &recipe.ingredients {
        let applied = store.adjust_inventory(owner, &req.name, -req.quantity.abs(), &req.unit)?;
        if !applied {
            bail!(
                "consume: adjustment for '{}' could not be applied; stock may be partially consumed",
                req.name
            );
        }
    }
    info!(
        "consume: recipe '{}' consumed for owner {}",
        recipe.title, owner
    );
    Ok(true)
}
