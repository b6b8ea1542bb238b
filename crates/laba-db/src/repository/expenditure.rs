//! # Expenditure Repository
//!
//! Database operations for operating costs. Expenditures are independent of
//! sales; they only meet in the real-profit formula, where the period's
//! summed expenditures are one of the deduction terms.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::notify::{ChangeHub, ChangedTable};
use laba_core::{Expenditure, Money};

const EXPENDITURE_COLUMNS: &str =
    "id, franchise_id, amount, description, expenditure_date, created_at, updated_at";

/// Repository for expenditure database operations.
#[derive(Debug, Clone)]
pub struct ExpenditureRepository {
    pool: SqlitePool,
    hub: ChangeHub,
}

impl ExpenditureRepository {
    /// Creates a new ExpenditureRepository.
    pub fn new(pool: SqlitePool, hub: ChangeHub) -> Self {
        ExpenditureRepository { pool, hub }
    }

    /// Inserts an expenditure.
    pub async fn insert(&self, expenditure: &Expenditure) -> DbResult<()> {
        debug!(
            id = %expenditure.id,
            franchise_id = %expenditure.franchise_id,
            amount = %expenditure.amount,
            "Inserting expenditure"
        );

        sqlx::query(
            r#"
            INSERT INTO expenditures (
                id, franchise_id, amount, description, expenditure_date,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&expenditure.id)
        .bind(&expenditure.franchise_id)
        .bind(expenditure.amount)
        .bind(&expenditure.description)
        .bind(expenditure.expenditure_date)
        .bind(expenditure.created_at)
        .bind(expenditure.updated_at)
        .execute(&self.pool)
        .await?;

        self.hub
            .publish(ChangedTable::Expenditures, &expenditure.franchise_id);
        Ok(())
    }

    /// Gets an expenditure by ID, scoped to a franchise.
    pub async fn get(&self, franchise_id: &str, id: &str) -> DbResult<Option<Expenditure>> {
        let expenditure = sqlx::query_as::<_, Expenditure>(&format!(
            "SELECT {EXPENDITURE_COLUMNS} FROM expenditures WHERE franchise_id = ?1 AND id = ?2"
        ))
        .bind(franchise_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(expenditure)
    }

    /// Rewrites an edited expenditure.
    pub async fn update(&self, expenditure: &Expenditure) -> DbResult<()> {
        debug!(id = %expenditure.id, "Updating expenditure");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE expenditures SET
                amount = ?3,
                description = ?4,
                expenditure_date = ?5,
                updated_at = ?6
            WHERE franchise_id = ?1 AND id = ?2
            "#,
        )
        .bind(&expenditure.franchise_id)
        .bind(&expenditure.id)
        .bind(expenditure.amount)
        .bind(&expenditure.description)
        .bind(expenditure.expenditure_date)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Expenditure", &expenditure.id));
        }

        self.hub
            .publish(ChangedTable::Expenditures, &expenditure.franchise_id);
        Ok(())
    }

    /// Deletes an expenditure.
    pub async fn delete(&self, franchise_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM expenditures WHERE franchise_id = ?1 AND id = ?2")
            .bind(franchise_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Expenditure", id));
        }

        self.hub.publish(ChangedTable::Expenditures, franchise_id);
        Ok(())
    }

    /// Lists expenditures dated in `[from, to)`, oldest first.
    pub async fn list_between(
        &self,
        franchise_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<Vec<Expenditure>> {
        let expenditures = sqlx::query_as::<_, Expenditure>(&format!(
            r#"
            SELECT {EXPENDITURE_COLUMNS} FROM expenditures
            WHERE franchise_id = ?1 AND expenditure_date >= ?2 AND expenditure_date < ?3
            ORDER BY expenditure_date
            "#
        ))
        .bind(franchise_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(expenditures)
    }

    /// Sums expenditures dated in `[from, to)`.
    ///
    /// A plain SQL sum: expenditures have no derived component, so unlike
    /// sale figures this aggregate is safe to compute in the database.
    pub async fn total_between(
        &self,
        franchise_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<Money> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(amount), 0) FROM expenditures
            WHERE franchise_id = ?1 AND expenditure_date >= ?2 AND expenditure_date < ?3
            "#,
        )
        .bind(franchise_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(Money::new(total))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use crate::pool::{Database, DbConfig};
    use laba_core::{Expenditure, Franchise, Money};

    #[tokio::test]
    async fn test_insert_list_and_total() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let franchise = Franchise::new("Cabang Test", "user-1", 1_000);
        db.franchises().insert(&franchise).await.unwrap();

        let repo = db.expenditures();
        let now = Utc::now();

        repo.insert(&Expenditure::new(&franchise.id, 150_000, "Sewa etalase", now))
            .await
            .unwrap();
        repo.insert(&Expenditure::new(&franchise.id, 45_000, "Plastik kemasan", now))
            .await
            .unwrap();
        repo.insert(&Expenditure::new(
            &franchise.id,
            500_000,
            "Servis freezer",
            now - Duration::days(60),
        ))
        .await
        .unwrap();

        let window_start = now - Duration::days(7);
        let window_end = now + Duration::days(1);

        let listed = repo
            .list_between(&franchise.id, window_start, window_end)
            .await
            .unwrap();
        assert_eq!(listed.len(), 2);

        let total = repo
            .total_between(&franchise.id, window_start, window_end)
            .await
            .unwrap();
        assert_eq!(total, Money::new(195_000));

        // Empty window sums to zero, not an error.
        let empty = repo
            .total_between(&franchise.id, now + Duration::days(2), now + Duration::days(3))
            .await
            .unwrap();
        assert_eq!(empty, Money::zero());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let franchise = Franchise::new("Cabang Test", "user-1", 1_000);
        db.franchises().insert(&franchise).await.unwrap();

        let repo = db.expenditures();
        let mut expenditure =
            Expenditure::new(&franchise.id, 150_000, "Sewa etalase", Utc::now());
        repo.insert(&expenditure).await.unwrap();

        expenditure.amount = 175_000;
        repo.update(&expenditure).await.unwrap();

        let loaded = repo
            .get(&franchise.id, &expenditure.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.amount, 175_000);

        repo.delete(&franchise.id, &expenditure.id).await.unwrap();
        assert!(repo
            .get(&franchise.id, &expenditure.id)
            .await
            .unwrap()
            .is_none());
    }
}
