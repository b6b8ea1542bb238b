//! # Product Repository
//!
//! Database operations for the per-franchise product catalog.
//!
//! ## Deletion Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              What happens when a product is deleted                     │
//! │                                                                         │
//! │  products row ──► DELETE                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  sales.product_id ──► NULL (ON DELETE SET NULL)                        │
//! │                                                                         │
//! │  sales.product_name / product_code / price_per_unit / hpp_per_unit     │
//! │       └── UNTOUCHED: these are snapshots taken at sale time            │
//! │                                                                         │
//! │  Historical reports keep working; only the catalog entry is gone.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::notify::{ChangeHub, ChangedTable};
use laba_core::Product;

const PRODUCT_COLUMNS: &str = "id, franchise_id, code, name, hpp, price, created_at, updated_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
    hub: ChangeHub,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool, hub: ChangeHub) -> Self {
        ProductRepository { pool, hub }
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - code already exists in this franchise
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(code = %product.code, franchise_id = %product.franchise_id, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, franchise_id, code, name, hpp, price, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&product.id)
        .bind(&product.franchise_id)
        .bind(&product.code)
        .bind(&product.name)
        .bind(product.hpp)
        .bind(product.price)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        self.hub
            .publish(ChangedTable::Products, &product.franchise_id);
        Ok(())
    }

    /// Gets a product by ID, scoped to a franchise.
    pub async fn get(&self, franchise_id: &str, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE franchise_id = ?1 AND id = ?2"
        ))
        .bind(franchise_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its business code.
    pub async fn get_by_code(&self, franchise_id: &str, code: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE franchise_id = ?1 AND code = ?2"
        ))
        .bind(franchise_id)
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists a page of the franchise's catalog, ordered by name.
    pub async fn list(&self, franchise_id: &str, limit: u32, offset: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE franchise_id = ?1
            ORDER BY name
            LIMIT ?2 OFFSET ?3
            "#
        ))
        .bind(franchise_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Updates a product's code, name, and prices.
    ///
    /// Historical sales are unaffected: they carry their own snapshots.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                code = ?3,
                name = ?4,
                hpp = ?5,
                price = ?6,
                updated_at = ?7
            WHERE franchise_id = ?1 AND id = ?2
            "#,
        )
        .bind(&product.franchise_id)
        .bind(&product.id)
        .bind(&product.code)
        .bind(&product.name)
        .bind(product.hpp)
        .bind(product.price)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        self.hub
            .publish(ChangedTable::Products, &product.franchise_id);
        Ok(())
    }

    /// Deletes a product.
    ///
    /// Sales referencing it keep their snapshot columns; the FK sets their
    /// `product_id` to NULL.
    pub async fn delete(&self, franchise_id: &str, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE franchise_id = ?1 AND id = ?2")
            .bind(franchise_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.hub.publish(ChangedTable::Products, franchise_id);
        Ok(())
    }

    /// Counts the franchise's products (for pagination).
    pub async fn count(&self, franchise_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE franchise_id = ?1")
                .bind(franchise_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use laba_core::{Franchise, Product};

    async fn db_with_franchise() -> (Database, Franchise) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let franchise = Franchise::new("Cabang Test", "user-1", 1_000);
        db.franchises().insert(&franchise).await.unwrap();
        (db, franchise)
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let (db, franchise) = db_with_franchise().await;
        let repo = db.products();

        let product = Product::new(&franchise.id, "KPI-001", "Kopi Susu Literan", 18_000, 30_000);
        repo.insert(&product).await.unwrap();

        let by_code = repo
            .get_by_code(&franchise.id, "KPI-001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_code.id, product.id);
        assert_eq!(by_code.hpp, 18_000);

        assert_eq!(repo.count(&franchise.id).await.unwrap(), 1);

        // Scoped to the wrong franchise, the product is invisible.
        assert!(repo.get("other", &product.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_code_rejected() {
        let (db, franchise) = db_with_franchise().await;
        let repo = db.products();

        let first = Product::new(&franchise.id, "KPI-001", "Kopi Susu", 18_000, 30_000);
        repo.insert(&first).await.unwrap();

        let dup = Product::new(&franchise.id, "KPI-001", "Kopi Hitam", 10_000, 20_000);
        let err = repo.insert(&dup).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (db, franchise) = db_with_franchise().await;
        let repo = db.products();

        let mut product = Product::new(&franchise.id, "TEH-001", "Teh Botol", 2_500, 4_000);
        repo.insert(&product).await.unwrap();

        product.price = 4_500;
        repo.update(&product).await.unwrap();
        let loaded = repo.get(&franchise.id, &product.id).await.unwrap().unwrap();
        assert_eq!(loaded.price, 4_500);

        repo.delete(&franchise.id, &product.id).await.unwrap();
        assert!(repo.get(&franchise.id, &product.id).await.unwrap().is_none());
    }
}
