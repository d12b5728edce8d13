//! # Sqlite Store
//!
//! Rusqlite-backed implementation of the persistence collaborator: owner
//! identities, inventory rows, and recipes with their ingredient lists.
//! Recipe titles are unique per owner under normalized comparison, and
//! negative inventory adjustments are all-or-nothing within a single call.

use anyhow::{bail, Context, Result};
use log::{info, warn};
use rusqlite::{params, Connection};
use std::path::Path;

use crate::feasibility::EPSILON;
use crate::model::{normalize_name, IngredientRequirement, InventoryItem, Recipe, UserId};
use crate::store::Store;
use crate::units::{from_base, same_dimension, to_base};

/// Sqlite-backed store for users, inventory and recipes.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) a database file and initialize its schema.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path).context("Failed to open database")?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        info!("Initializing database schema...");

        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    username TEXT UNIQUE NOT NULL
                )",
                [],
            )
            .context("Failed to create users table")?;

        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS inventory (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL,
                    name TEXT NOT NULL,
                    quantity REAL NOT NULL,
                    unit TEXT NOT NULL,
                    FOREIGN KEY (user_id) REFERENCES users(id)
                )",
                [],
            )
            .context("Failed to create inventory table")?;

        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS recipes (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL,
                    title TEXT NOT NULL,
                    category TEXT,
                    instructions TEXT,
                    FOREIGN KEY (user_id) REFERENCES users(id)
                )",
                [],
            )
            .context("Failed to create recipes table")?;

        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS ingredients (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    recipe_id INTEGER NOT NULL,
                    name TEXT NOT NULL,
                    quantity REAL NOT NULL,
                    unit TEXT NOT NULL,
                    FOREIGN KEY (recipe_id) REFERENCES recipes(id)
                )",
                [],
            )
            .context("Failed to create ingredients table")?;

        info!("Database schema initialized successfully");
        Ok(())
    }

    /// Create a new owner identity. Usernames are unique.
    pub fn create_user(&self, username: &str) -> Result<UserId> {
        match self.conn.execute(
            "INSERT INTO users (username) VALUES (?1)",
            params![username],
        ) {
            Ok(_) => {
                let user_id = self.conn.last_insert_rowid();
                info!("User created with ID: {}", user_id);
                Ok(user_id)
            }
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                bail!("username '{}' already exists", username)
            }
            Err(e) => Err(e).context("Failed to create user"),
        }
    }

    /// Report whether an owner id exists.
    pub fn user_exists(&self, user_id: UserId) -> Result<bool> {
        let found = self.conn.query_row(
            "SELECT id FROM users WHERE id = ?1",
            params![user_id],
            |_| Ok(()),
        );
        match found {
            Ok(()) => Ok(true),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(false),
            Err(e) => Err(e).context("Failed to look up user"),
        }
    }

    /// Insert a stock row, or replace the quantity of the row matching the
    /// same raw name and unit.
    pub fn upsert_inventory(
        &self,
        owner: UserId,
        name: &str,
        quantity: f64,
        unit: &str,
    ) -> Result<()> {
        let existing = self.conn.query_row(
            "SELECT id FROM inventory WHERE user_id = ?1 AND name = ?2 AND unit = ?3",
            params![owner, name, unit],
            |row| row.get::<_, i64>(0),
        );
        match existing {
            Ok(item_id) => {
                self.conn
                    .execute(
                        "UPDATE inventory SET quantity = ?1 WHERE id = ?2",
                        params![quantity, item_id],
                    )
                    .context("Failed to update inventory row")?;
                info!("Inventory row {} updated for owner {}", item_id, owner);
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                self.conn
                    .execute(
                        "INSERT INTO inventory (user_id, name, quantity, unit) VALUES (?1, ?2, ?3, ?4)",
                        params![owner, name, quantity, unit],
                    )
                    .context("Failed to insert inventory row")?;
                info!(
                    "Inventory row {} created for owner {}",
                    self.conn.last_insert_rowid(),
                    owner
                );
            }
            Err(e) => return Err(e).context("Failed to query inventory"),
        }
        Ok(())
    }

    /// Rewrite one stock row by id. Returns false when the row is gone.
    pub fn update_inventory_item(
        &self,
        item_id: i64,
        name: &str,
        quantity: f64,
        unit: &str,
    ) -> Result<bool> {
        let rows_affected = self
            .conn
            .execute(
                "UPDATE inventory SET name = ?1, quantity = ?2, unit = ?3 WHERE id = ?4",
                params![name, quantity, unit, item_id],
            )
            .context("Failed to update inventory item")?;
        Ok(rows_affected > 0)
    }

    /// Delete one stock row by id. Returns false when the row is gone.
    pub fn delete_inventory(&self, item_id: i64) -> Result<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM inventory WHERE id = ?1", params![item_id])
            .context("Failed to delete inventory item")?;
        Ok(rows_affected > 0)
    }

    /// Store a new recipe with its ingredient list.
    ///
    /// Titles are unique per owner under normalized comparison.
    pub fn create_recipe(
        &self,
        owner: UserId,
        title: &str,
        category: &str,
        instructions: &str,
        ingredients: &[IngredientRequirement],
    ) -> Result<i64> {
        self.check_title_free(owner, title, None)?;
        self.conn
            .execute(
                "INSERT INTO recipes (user_id, title, category, instructions) VALUES (?1, ?2, ?3, ?4)",
                params![owner, title, category, instructions],
            )
            .context("Failed to insert recipe")?;
        let recipe_id = self.conn.last_insert_rowid();
        self.insert_ingredients(recipe_id, ingredients)?;
        info!("Recipe created with ID: {}", recipe_id);
        Ok(recipe_id)
    }

    /// Rewrite an existing recipe, replacing its ingredient list wholesale.
    /// Returns false when no recipe matches (id, owner).
    pub fn update_recipe(
        &self,
        owner: UserId,
        recipe_id: i64,
        title: &str,
        category: &str,
        instructions: &str,
        ingredients: &[IngredientRequirement],
    ) -> Result<bool> {
        self.check_title_free(owner, title, Some(recipe_id))?;
        let rows_affected = self
            .conn
            .execute(
                "UPDATE recipes SET title = ?1, category = ?2, instructions = ?3
                 WHERE id = ?4 AND user_id = ?5",
                params![title, category, instructions, recipe_id, owner],
            )
            .context("Failed to update recipe")?;
        if rows_affected == 0 {
            return Ok(false);
        }
        self.conn
            .execute(
                "DELETE FROM ingredients WHERE recipe_id = ?1",
                params![recipe_id],
            )
            .context("Failed to clear recipe ingredients")?;
        self.insert_ingredients(recipe_id, ingredients)?;
        info!("Recipe {} updated", recipe_id);
        Ok(true)
    }

    /// Delete a recipe and its ingredient list. Returns false when the
    /// recipe is gone.
    pub fn delete_recipe(&self, recipe_id: i64) -> Result<bool> {
        self.conn
            .execute(
                "DELETE FROM ingredients WHERE recipe_id = ?1",
                params![recipe_id],
            )
            .context("Failed to delete recipe ingredients")?;
        let rows_affected = self
            .conn
            .execute("DELETE FROM recipes WHERE id = ?1", params![recipe_id])
            .context("Failed to delete recipe")?;
        Ok(rows_affected > 0)
    }

    /// Find a recipe by title under normalized comparison.
    pub fn get_recipe_by_title(&self, owner: UserId, title: &str) -> Result<Option<Recipe>> {
        let wanted = normalize_name(title);
        let recipes = self.list_recipes(owner)?;
        Ok(recipes
            .into_iter()
            .find(|r| normalize_name(&r.title) == wanted))
    }

    fn check_title_free(&self, owner: UserId, title: &str, exclude: Option<i64>) -> Result<()> {
        let wanted = normalize_name(title);
        let mut stmt = self
            .conn
            .prepare("SELECT id, title FROM recipes WHERE user_id = ?1")
            .context("Failed to prepare title query")?;
        let rows = stmt
            .query_map(params![owner], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })
            .context("Failed to query recipe titles")?;
        for row in rows {
            let (id, existing) = row.context("Failed to read recipe title")?;
            if Some(id) != exclude && normalize_name(&existing) == wanted {
                bail!("recipe title '{}' already exists", title);
            }
        }
        Ok(())
    }

    fn insert_ingredients(
        &self,
        recipe_id: i64,
        ingredients: &[IngredientRequirement],
    ) -> Result<()> {
        for ing in ingredients {
            self.conn
                .execute(
                    "INSERT INTO ingredients (recipe_id, name, quantity, unit) VALUES (?1, ?2, ?3, ?4)",
                    params![recipe_id, ing.name, ing.quantity, ing.unit],
                )
                .context("Failed to insert ingredient")?;
        }
        Ok(())
    }

    fn list_ingredients(&self, recipe_id: i64) -> Result<Vec<IngredientRequirement>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, quantity, unit FROM ingredients WHERE recipe_id = ?1 ORDER BY id")
            .context("Failed to prepare ingredient query")?;
        let rows = stmt
            .query_map(params![recipe_id], |row| {
                Ok(IngredientRequirement {
                    name: row.get(0)?,
                    quantity: row.get(1)?,
                    unit: row.get(2)?,
                })
            })
            .context("Failed to query ingredients")?;
        let mut ingredients = Vec::new();
        for row in rows {
            ingredients.push(row.context("Failed to read ingredient row")?);
        }
        Ok(ingredients)
    }
}

impl Store for Database {
    fn list_inventory(&self, owner: UserId) -> Result<Vec<InventoryItem>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, quantity, unit FROM inventory WHERE user_id = ?1 ORDER BY id")
            .context("Failed to prepare inventory query")?;
        let rows = stmt
            .query_map(params![owner], |row| {
                Ok(InventoryItem {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    quantity: row.get(2)?,
                    unit: row.get(3)?,
                })
            })
            .context("Failed to query inventory")?;
        let mut items = Vec::new();
        for row in rows {
            items.push(row.context("Failed to read inventory row")?);
        }
        Ok(items)
    }

    fn list_recipes(&self, owner: UserId) -> Result<Vec<Recipe>> {
        let mut recipes = {
            let mut stmt = self
                .conn
                .prepare(
                    "SELECT id, title, category, instructions FROM recipes
                     WHERE user_id = ?1 ORDER BY id",
                )
                .context("Failed to prepare recipe query")?;
            let rows = stmt
                .query_map(params![owner], |row| {
                    Ok(Recipe {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        category: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                        instructions: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                        ingredients: Vec::new(),
                    })
                })
                .context("Failed to query recipes")?;
            let mut recipes = Vec::new();
            for row in rows {
                recipes.push(row.context("Failed to read recipe row")?);
            }
            recipes
        };
        for recipe in &mut recipes {
            recipe.ingredients = self.list_ingredients(recipe.id)?;
        }
        Ok(recipes)
    }

    fn adjust_inventory(&self, owner: UserId, name: &str, delta: f64, unit: &str) -> Result<bool> {
        let wanted = normalize_name(name);
        let matching: Vec<InventoryItem> = self
            .list_inventory(owner)?
            .into_iter()
            .filter(|row| normalize_name(&row.name) == wanted && same_dimension(&row.unit, unit))
            .collect();

        if delta >= 0.0 {
            // Top up the row carrying the same unit spelling, or start a new one.
            let unit_key = normalize_name(unit);
            if let Some(row) = matching.iter().find(|r| normalize_name(&r.unit) == unit_key) {
                self.conn
                    .execute(
                        "UPDATE inventory SET quantity = ?1 WHERE id = ?2",
                        params![row.quantity + delta, row.id],
                    )
                    .context("Failed to top up inventory row")?;
            } else {
                self.conn
                    .execute(
                        "INSERT INTO inventory (user_id, name, quantity, unit) VALUES (?1, ?2, ?3, ?4)",
                        params![owner, name, delta, unit],
                    )
                    .context("Failed to insert inventory row")?;
            }
            info!(
                "adjust_inventory: +{} {} of '{}' for owner {}",
                delta, unit, name, owner
            );
            return Ok(true);
        }

        // Draw-down: verify coverage before writing anything, so a single
        // adjustment is all-or-nothing.
        let (delta_base, _) = to_base(delta, unit);
        let mut needed = -delta_base;
        let available: f64 = matching
            .iter()
            .map(|row| to_base(row.quantity, &row.unit).0)
            .sum();
        if available + EPSILON < needed {
            warn!(
                "adjust_inventory: insufficient '{}' for owner {} (have {}, need {})",
                name, owner, available, needed
            );
            return Ok(false);
        }
        for row in &matching {
            if needed <= EPSILON {
                break;
            }
            let (row_base, base_unit) = to_base(row.quantity, &row.unit);
            let take = row_base.min(needed);
            let remaining = from_base(row_base - take, base_unit, &row.unit);
            self.conn
                .execute(
                    "UPDATE inventory SET quantity = ?1 WHERE id = ?2",
                    params![remaining, row.id],
                )
                .context("Failed to draw down inventory row")?;
            needed -= take;
        }
        info!(
            "adjust_inventory: {} {} of '{}' for owner {}",
            delta, unit, name, owner
        );
        Ok(true)
    }
}
