//! # Catalog Repository
//!
//! Products, ingredients and the recipes linking them.
//!
//! ## Costing Data
//! ```text
//! ┌──────────────┐   recipe_items    ┌───────────────┐
//! │   products   │ ─────────────────►│  ingredients  │
//! │  price       │  quantity (TEXT)  │  unit_cost    │  ← latest purchase
//! └──────────────┘                   └───────────────┘
//! ```
//! Recipe quantities are decimals ("18.5" grams) and are stored as text so no
//! precision is lost going through SQLite's REAL affinity.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use cafe_core::{Ingredient, Money, Product, Recipe, RecipeLine};

/// Repository for catalog database operations.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Inserts a product.
    pub async fn insert_product(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO products (id, name, category, price, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.price.minor())
        .bind(product.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a product by ID, including inactive ones.
    pub async fn get_product(&self, id: &str) -> DbResult<Option<Product>> {
        let record = sqlx::query_as::<_, ProductRecord>(
            "SELECT id, name, category, price, is_active FROM products WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Product::from))
    }

    /// Lists products by name. `active_only` hides products taken off the menu.
    pub async fn list_products(&self, active_only: bool) -> DbResult<Vec<Product>> {
        let records = sqlx::query_as::<_, ProductRecord>(
            r#"
            SELECT id, name, category, price, is_active
            FROM products
            WHERE is_active = 1 OR ?1 = 0
            ORDER BY name, id
            "#,
        )
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(Product::from).collect())
    }

    // =========================================================================
    // Ingredients
    // =========================================================================

    /// Inserts an ingredient.
    pub async fn insert_ingredient(&self, ingredient: &Ingredient) -> DbResult<()> {
        debug!(id = %ingredient.id, name = %ingredient.name, "Inserting ingredient");

        sqlx::query(
            r#"
            INSERT INTO ingredients (id, name, unit, unit_cost, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&ingredient.id)
        .bind(&ingredient.name)
        .bind(&ingredient.unit)
        .bind(ingredient.unit_cost.minor())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Records a new purchase cost; reports use the latest one.
    pub async fn update_ingredient_cost(&self, id: &str, unit_cost: Money) -> DbResult<()> {
        info!(id = %id, unit_cost = unit_cost.minor(), "Updating ingredient cost");

        let result = sqlx::query(
            "UPDATE ingredients SET unit_cost = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(unit_cost.minor())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Ingredient", id));
        }

        Ok(())
    }

    /// Lists all ingredients by name.
    pub async fn list_ingredients(&self) -> DbResult<Vec<Ingredient>> {
        let records = sqlx::query_as::<_, IngredientRecord>(
            "SELECT id, name, unit, unit_cost FROM ingredients ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(Ingredient::from).collect())
    }

    // =========================================================================
    // Recipes
    // =========================================================================

    /// Replaces the recipe of a product.
    pub async fn set_recipe(&self, recipe: &Recipe) -> DbResult<()> {
        debug!(product_id = %recipe.product_id, lines = recipe.lines.len(), "Setting recipe");

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM recipe_items WHERE product_id = ?1")
            .bind(&recipe.product_id)
            .execute(&mut *tx)
            .await?;

        for line in &recipe.lines {
            sqlx::query(
                r#"
                INSERT INTO recipe_items (id, product_id, ingredient_id, quantity)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )
            .bind(uuid::Uuid::new_v4().to_string())
            .bind(&recipe.product_id)
            .bind(&line.ingredient_id)
            .bind(line.quantity.to_string())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Recipe of a product, `None` when it has no recipe lines.
    pub async fn get_recipe(&self, product_id: &str) -> DbResult<Option<Recipe>> {
        let records = sqlx::query_as::<_, RecipeItemRecord>(
            r#"
            SELECT product_id, ingredient_id, quantity
            FROM recipe_items
            WHERE product_id = ?1
            ORDER BY ingredient_id
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(group_recipes(records)?.into_iter().next())
    }

    /// All recipes, one per product that has recipe lines.
    pub async fn list_recipes(&self) -> DbResult<Vec<Recipe>> {
        let records = sqlx::query_as::<_, RecipeItemRecord>(
            r#"
            SELECT product_id, ingredient_id, quantity
            FROM recipe_items
            ORDER BY product_id, ingredient_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        group_recipes(records)
    }
}

// =============================================================================
// Records
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductRecord {
    id: String,
    name: String,
    category: Option<String>,
    price: i64,
    is_active: bool,
}

impl From<ProductRecord> for Product {
    fn from(r: ProductRecord) -> Self {
        Product {
            id: r.id,
            name: r.name,
            category: r.category,
            price: Money::from_minor(r.price),
            is_active: r.is_active,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct IngredientRecord {
    id: String,
    name: String,
    unit: String,
    unit_cost: i64,
}

impl From<IngredientRecord> for Ingredient {
    fn from(r: IngredientRecord) -> Self {
        Ingredient {
            id: r.id,
            name: r.name,
            unit: r.unit,
            unit_cost: Money::from_minor(r.unit_cost),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RecipeItemRecord {
    product_id: String,
    ingredient_id: String,
    quantity: String,
}

fn group_recipes(records: Vec<RecipeItemRecord>) -> DbResult<Vec<Recipe>> {
    let mut by_product: BTreeMap<String, Vec<RecipeLine>> = BTreeMap::new();

    for r in records {
        let quantity = Decimal::from_str(&r.quantity).map_err(|e| {
            DbError::invalid_data(
                "recipe_items",
                format!("quantity '{}' for {}: {}", r.quantity, r.product_id, e),
            )
        })?;
        by_product.entry(r.product_id).or_default().push(RecipeLine {
            ingredient_id: r.ingredient_id,
            quantity,
        });
    }

    Ok(by_product
        .into_iter()
        .map(|(product_id, lines)| Recipe { product_id, lines })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    async fn repo() -> CatalogRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().catalog()
    }

    fn product(id: &str, name: &str, active: bool) -> Product {
        Product {
            id: id.to_string(),
            name: name.to_string(),
            category: Some("Coffee".to_string()),
            price: Money::from_minor(25_000),
            is_active: active,
        }
    }

    #[tokio::test]
    async fn test_products_active_filter() {
        let repo = repo().await;
        repo.insert_product(&product("p1", "Latte", true)).await.unwrap();
        repo.insert_product(&product("p2", "Americano", false)).await.unwrap();

        assert_eq!(repo.list_products(true).await.unwrap().len(), 1);
        let all = repo.list_products(false).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "Americano");

        assert_eq!(repo.get_product("p2").await.unwrap(), Some(product("p2", "Americano", false)));
    }

    #[tokio::test]
    async fn test_recipe_roundtrip_keeps_decimals() {
        let repo = repo().await;
        repo.insert_product(&product("latte", "Latte", true)).await.unwrap();

        let recipe = Recipe {
            product_id: "latte".to_string(),
            lines: vec![
                RecipeLine {
                    ingredient_id: "beans".to_string(),
                    quantity: Decimal::new(185, 1),
                },
                RecipeLine {
                    ingredient_id: "milk".to_string(),
                    quantity: Decimal::from(120),
                },
            ],
        };
        repo.set_recipe(&recipe).await.unwrap();
        assert_eq!(repo.get_recipe("latte").await.unwrap(), Some(recipe.clone()));

        // Replacing drops old lines
        let smaller = Recipe {
            product_id: "latte".to_string(),
            lines: vec![recipe.lines[0].clone()],
        };
        repo.set_recipe(&smaller).await.unwrap();
        assert_eq!(repo.list_recipes().await.unwrap(), vec![smaller]);

        assert!(repo.get_recipe("unknown").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_ingredient_cost() {
        let repo = repo().await;
        repo.insert_ingredient(&Ingredient {
            id: "beans".to_string(),
            name: "Robusta beans".to_string(),
            unit: "g".to_string(),
            unit_cost: Money::from_minor(400),
        })
        .await
        .unwrap();

        repo.update_ingredient_cost("beans", Money::from_minor(450)).await.unwrap();
        let ingredients = repo.list_ingredients().await.unwrap();
        assert_eq!(ingredients[0].unit_cost.minor(), 450);

        let err = repo
            .update_ingredient_cost("missing", Money::from_minor(1))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
