//! # Persistence Collaborator Contract
//!
//! The engine consumes storage through this trait, so evaluation and
//! consumption logic stays independent of the concrete backend. The crate
//! ships a sqlite implementation in [`crate::db`]; tests substitute
//! recording doubles.

use crate::model::{InventoryItem, Recipe, UserId};
use anyhow::Result;

/// Storage operations the feasibility engine depends on.
pub trait Store {
    /// All inventory rows owned by `owner`. Order is irrelevant to
    /// correctness; aggregation is commutative.
    fn list_inventory(&self, owner: UserId) -> Result<Vec<InventoryItem>>;

    /// All recipes owned by `owner`, each with its ingredient list in
    /// declared order.
    fn list_recipes(&self, owner: UserId) -> Result<Vec<Recipe>>;

    /// Apply a signed quantity adjustment to the owner's stock of `name`,
    /// matched by normalized name. Returns `Ok(false)` when the adjustment
    /// could not be applied (no write happened), `Err` on storage failure.
    fn adjust_inventory(&self, owner: UserId, name: &str, delta: f64, unit: &str) -> Result<bool>;
}
