//! # Pantry Data Model
//!
//! Data structures shared by the store and the feasibility engine: inventory
//! rows, recipes and their ingredient requirements, and the name
//! normalization used as the identity key when matching inventory against
//! recipes.

use crate::units::fmt_qty;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque owner identifier. Every inventory row and recipe belongs to
/// exactly one user id.
pub type UserId = i64;

/// One raw inventory row as stored for a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: i64,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
}

/// One ingredient line of a recipe: name, quantity and declared unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientRequirement {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
}

impl IngredientRequirement {
    pub fn new(name: &str, quantity: f64, unit: &str) -> Self {
        Self {
            name: name.to_string(),
            quantity,
            unit: unit.to_string(),
        }
    }
}

impl fmt::Display for IngredientRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", fmt_qty(self.quantity), self.unit, self.name)
    }
}

/// A stored recipe. `ingredients` preserves the declared order, which the
/// evaluator keeps for its shortfall list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub instructions: String,
    pub ingredients: Vec<IngredientRequirement>,
}

/// One line of a derived shopping list: what to buy, in display units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingItem {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
}

lazy_static! {
    static ref NAME_PATTERN: Regex =
        Regex::new(r"^[\p{Alphabetic}\p{Nd}\s]+$").expect("name pattern should be valid");
}

/// Normalize an ingredient or recipe name for comparison.
///
/// Trims whitespace and lowercases. Idempotent; an empty or all-whitespace
/// name normalizes to the empty string.
///
/// # Examples
///
/// ```rust
/// use pantry::model::normalize_name;
///
/// assert_eq!(normalize_name("  Chicken Breast "), "chicken breast");
/// assert_eq!(normalize_name(normalize_name("EGGS").as_str()), "eggs");
/// ```
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Validate a user-supplied name: non-empty, letters, digits and spaces only.
pub fn validate_name(name: &str) -> bool {
    !name.trim().is_empty() && NAME_PATTERN.is_match(name)
}
