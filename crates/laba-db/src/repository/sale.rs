//! # Sale Repository
//!
//! Database operations for sale records.
//!
//! ## What Is (and Is Not) Stored
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Sale Row Contents                                   │
//! │                                                                         │
//! │  STORED (raw, frozen at sale time)     NEVER STORED (derived)          │
//! │  ─────────────────────────────────     ───────────────────────         │
//! │  quantity, price_per_unit,             discount amount                 │
//! │  hpp_per_unit, total_sales,            sales after discount            │
//! │  total_hpp, discount fields,           admin fee                       │
//! │  business date                         net profit                      │
//! │                                                                         │
//! │  Derived figures come from laba_core::engine::derive_sale at read      │
//! │  time, against the CURRENT admin settings. That is what makes a        │
//! │  settings edit retroactive across every report.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Concurrent edits to the same sale from two sessions are last-write-wins;
//! there are no merge semantics.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::notify::{ChangeHub, ChangedTable};
use laba_core::SaleRecord;

const SALE_COLUMNS: &str = "id, franchise_id, product_id, product_name, product_code, \
     quantity, price_per_unit, hpp_per_unit, total_sales, total_hpp, \
     discount_type, discount_value, created_at, updated_at";

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
    hub: ChangeHub,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool, hub: ChangeHub) -> Self {
        SaleRepository { pool, hub }
    }

    /// Inserts a sale record.
    pub async fn insert(&self, sale: &SaleRecord) -> DbResult<()> {
        debug!(
            id = %sale.id,
            franchise_id = %sale.franchise_id,
            product_code = %sale.product_code,
            "Inserting sale"
        );

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, franchise_id, product_id, product_name, product_code,
                quantity, price_per_unit, hpp_per_unit, total_sales, total_hpp,
                discount_type, discount_value, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8, ?9, ?10,
                ?11, ?12, ?13, ?14
            )
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.franchise_id)
        .bind(sale.product_id.as_deref())
        .bind(&sale.product_name)
        .bind(&sale.product_code)
        .bind(sale.quantity)
        .bind(sale.price_per_unit)
        .bind(sale.hpp_per_unit)
        .bind(sale.total_sales)
        .bind(sale.total_hpp)
        .bind(sale.discount_type)
        .bind(sale.discount_value)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .execute(&self.pool)
        .await?;

        self.hub.publish(ChangedTable::Sales, &sale.franchise_id);
        Ok(())
    }

    /// Gets a sale by ID, scoped to a franchise.
    pub async fn get(&self, franchise_id: &str, id: &str) -> DbResult<Option<SaleRecord>> {
        let sale = sqlx::query_as::<_, SaleRecord>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE franchise_id = ?1 AND id = ?2"
        ))
        .bind(franchise_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Rewrites an edited sale (explicit edit path).
    ///
    /// The whole raw row is replaced; whichever session writes last wins.
    pub async fn update(&self, sale: &SaleRecord) -> DbResult<()> {
        debug!(id = %sale.id, "Updating sale");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE sales SET
                product_id = ?3,
                product_name = ?4,
                product_code = ?5,
                quantity = ?6,
                price_per_unit = ?7,
                hpp_per_unit = ?8,
                total_sales = ?9,
                total_hpp = ?10,
                discount_type = ?11,
                discount_value = ?12,
                created_at = ?13,
                updated_at = ?14
            WHERE franchise_id = ?1 AND id = ?2
            "#,
        )
        .bind(&sale.franchise_id)
        .bind(&sale.id)
        .bind(sale.product_id.as_deref())
        .bind(&sale.product_name)
        .bind(&sale.product_code)
        .bind(sale.quantity)
        .bind(sale.price_per_unit)
        .bind(sale.hpp_per_unit)
        .bind(sale.total_sales)
        .bind(sale.total_hpp)
        .bind(sale.discount_type)
        .bind(sale.discount_value)
        .bind(sale.created_at)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", &sale.id));
        }

        self.hub.publish(ChangedTable::Sales, &sale.franchise_id);
        Ok(())
    }

    /// Deletes a sale.
    pub async fn delete(&self, franchise_id: &str, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting sale");

        let result = sqlx::query("DELETE FROM sales WHERE franchise_id = ?1 AND id = ?2")
            .bind(franchise_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", id));
        }

        self.hub.publish(ChangedTable::Sales, franchise_id);
        Ok(())
    }

    /// Lists sales whose business date falls in `[from, to)`, oldest first.
    ///
    /// This is the query behind every period report: callers compute the
    /// UTC bounds from a [`laba_core::Period`] in the display timezone.
    pub async fn list_between(
        &self,
        franchise_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<Vec<SaleRecord>> {
        let sales = sqlx::query_as::<_, SaleRecord>(&format!(
            r#"
            SELECT {SALE_COLUMNS} FROM sales
            WHERE franchise_id = ?1 AND created_at >= ?2 AND created_at < ?3
            ORDER BY created_at
            "#
        ))
        .bind(franchise_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Lists a page of sales, newest business date first (the ledger view).
    pub async fn list_page(
        &self,
        franchise_id: &str,
        limit: u32,
        offset: u32,
    ) -> DbResult<Vec<SaleRecord>> {
        let sales = sqlx::query_as::<_, SaleRecord>(&format!(
            r#"
            SELECT {SALE_COLUMNS} FROM sales
            WHERE franchise_id = ?1
            ORDER BY created_at DESC
            LIMIT ?2 OFFSET ?3
            "#
        ))
        .bind(franchise_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Counts the franchise's sales (for pagination).
    pub async fn count(&self, franchise_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE franchise_id = ?1")
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
    use chrono::{Duration, Utc};

    use crate::pool::{Database, DbConfig};
    use laba_core::{Discount, Franchise, Product, SaleRecord};

    async fn setup() -> (Database, Franchise, Product) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let franchise = Franchise::new("Cabang Test", "user-1", 1_000);
        db.franchises().insert(&franchise).await.unwrap();

        let product = Product::new(&franchise.id, "KPI-001", "Kopi Susu Literan", 18_000, 30_000);
        db.products().insert(&product).await.unwrap();

        (db, franchise, product)
    }

    #[tokio::test]
    async fn test_insert_and_range_query() {
        let (db, franchise, product) = setup().await;
        let repo = db.sales();

        let now = Utc::now();
        let recent = SaleRecord::from_product(&product, 2, Discount::None, now);
        let old =
            SaleRecord::from_product(&product, 1, Discount::None, now - Duration::days(40));
        repo.insert(&recent).await.unwrap();
        repo.insert(&old).await.unwrap();

        let window = repo
            .list_between(&franchise.id, now - Duration::days(7), now + Duration::days(1))
            .await
            .unwrap();
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].id, recent.id);

        assert_eq!(repo.count(&franchise.id).await.unwrap(), 2);
        assert_eq!(repo.count("other-franchise").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_pagination_newest_first() {
        let (db, franchise, product) = setup().await;
        let repo = db.sales();

        let now = Utc::now();
        for day in 0..5 {
            let sale = SaleRecord::from_product(
                &product,
                1,
                Discount::None,
                now - Duration::days(day),
            );
            repo.insert(&sale).await.unwrap();
        }

        let first_page = repo.list_page(&franchise.id, 2, 0).await.unwrap();
        let second_page = repo.list_page(&franchise.id, 2, 2).await.unwrap();
        assert_eq!(first_page.len(), 2);
        assert!(first_page[0].created_at > second_page[0].created_at);
    }

    #[tokio::test]
    async fn test_edit_rewrites_raw_row() {
        let (db, franchise, product) = setup().await;
        let repo = db.sales();

        let mut sale = SaleRecord::from_product(&product, 2, Discount::None, Utc::now());
        repo.insert(&sale).await.unwrap();

        sale.quantity = 3;
        sale.total_sales = sale.price_per_unit * 3;
        sale.total_hpp = sale.hpp_per_unit * 3;
        repo.update(&sale).await.unwrap();

        let loaded = repo.get(&franchise.id, &sale.id).await.unwrap().unwrap();
        assert_eq!(loaded.quantity, 3);
        assert_eq!(loaded.total_sales, 90_000);
    }

    #[tokio::test]
    async fn test_product_delete_preserves_sale_snapshot() {
        let (db, franchise, product) = setup().await;

        let sale = SaleRecord::from_product(&product, 2, Discount::None, Utc::now());
        db.sales().insert(&sale).await.unwrap();

        db.products().delete(&franchise.id, &product.id).await.unwrap();

        let loaded = db
            .sales()
            .get(&franchise.id, &sale.id)
            .await
            .unwrap()
            .unwrap();
        assert!(loaded.product_id.is_none(), "reference nulled by FK");
        assert_eq!(loaded.product_name, "Kopi Susu Literan");
        assert_eq!(loaded.total_sales, 60_000, "snapshot figures untouched");
    }

    #[tokio::test]
    async fn test_insert_publishes_change_signal() {
        let (db, franchise, product) = setup().await;

        let mut watcher = db
            .changes()
            .watch(crate::notify::ChangedTable::Sales, Some(&franchise.id));

        let sale = SaleRecord::from_product(&product, 1, Discount::None, Utc::now());
        db.sales().insert(&sale).await.unwrap();

        let event = watcher.changed().await.expect("signal delivered");
        assert_eq!(event.franchise_id, franchise.id);
    }
}
