//! # Franchise Repository
//!
//! Database operations for franchises (tenants). Used almost entirely by the
//! platform owner: operators never see franchises other than their own, and
//! creation goes through [`crate::provisioning`] so the default settings row
//! always exists.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::notify::{ChangeHub, ChangedTable};
use laba_core::Franchise;

/// Repository for franchise database operations.
#[derive(Debug, Clone)]
pub struct FranchiseRepository {
    pool: SqlitePool,
    hub: ChangeHub,
}

impl FranchiseRepository {
    /// Creates a new FranchiseRepository.
    pub fn new(pool: SqlitePool, hub: ChangeHub) -> Self {
        FranchiseRepository { pool, hub }
    }

    /// Inserts a franchise row.
    ///
    /// Prefer [`crate::provisioning::create_franchise`], which also creates
    /// the default settings row in the same transaction.
    pub async fn insert(&self, franchise: &Franchise) -> DbResult<()> {
        debug!(id = %franchise.id, name = %franchise.name, "Inserting franchise");

        sqlx::query(
            r#"
            INSERT INTO franchises (
                id, name, user_id, profit_sharing_bps, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&franchise.id)
        .bind(&franchise.name)
        .bind(&franchise.user_id)
        .bind(franchise.profit_sharing_bps)
        .bind(franchise.is_active)
        .bind(franchise.created_at)
        .bind(franchise.updated_at)
        .execute(&self.pool)
        .await?;

        self.hub.publish(ChangedTable::Franchises, &franchise.id);
        Ok(())
    }

    /// Gets a franchise by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<Franchise>> {
        let franchise = sqlx::query_as::<_, Franchise>(
            r#"
            SELECT id, name, user_id, profit_sharing_bps, is_active,
                   created_at, updated_at
            FROM franchises
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(franchise)
    }

    /// Gets the franchise owned by a user account.
    ///
    /// The external auth layer resolves a session to a `user_id`; this is
    /// how that id becomes a tenant scope.
    pub async fn get_by_user(&self, user_id: &str) -> DbResult<Option<Franchise>> {
        let franchise = sqlx::query_as::<_, Franchise>(
            r#"
            SELECT id, name, user_id, profit_sharing_bps, is_active,
                   created_at, updated_at
            FROM franchises
            WHERE user_id = ?1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(franchise)
    }

    /// Lists all franchises, active or not, for the owner overview.
    pub async fn list_all(&self) -> DbResult<Vec<Franchise>> {
        let franchises = sqlx::query_as::<_, Franchise>(
            r#"
            SELECT id, name, user_id, profit_sharing_bps, is_active,
                   created_at, updated_at
            FROM franchises
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(franchises)
    }

    /// Renames a franchise.
    pub async fn rename(&self, id: &str, name: &str) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE franchises SET name = ?2, updated_at = ?3 WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Franchise", id));
        }

        self.hub.publish(ChangedTable::Franchises, id);
        Ok(())
    }

    /// Activates or deactivates a franchise (the login gate).
    pub async fn set_active(&self, id: &str, is_active: bool) -> DbResult<()> {
        debug!(id = %id, is_active = %is_active, "Setting franchise active flag");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE franchises SET is_active = ?2, updated_at = ?3 WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Franchise", id));
        }

        self.hub.publish(ChangedTable::Franchises, id);
        Ok(())
    }

    /// Sets the revenue-share rate for a franchise.
    ///
    /// Stored payment snapshots keep their copied rate until
    /// [`crate::reports::recompute_all_periods`] is run for the franchise.
    pub async fn set_profit_sharing(&self, id: &str, bps: u32) -> DbResult<()> {
        debug!(id = %id, bps = %bps, "Setting profit sharing rate");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE franchises SET profit_sharing_bps = ?2, updated_at = ?3 WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(bps)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Franchise", id));
        }

        self.hub.publish(ChangedTable::Franchises, id);
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use laba_core::Franchise;

    #[tokio::test]
    async fn test_insert_get_and_flags() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.franchises();

        let franchise = Franchise::new("Cabang Bandung", "user-1", 1_000);
        repo.insert(&franchise).await.unwrap();

        let loaded = repo.get(&franchise.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Cabang Bandung");
        assert_eq!(loaded.profit_sharing_bps, 1_000);
        assert!(loaded.is_active);

        repo.set_active(&franchise.id, false).await.unwrap();
        repo.set_profit_sharing(&franchise.id, 1_500).await.unwrap();

        let loaded = repo.get(&franchise.id).await.unwrap().unwrap();
        assert!(!loaded.is_active);
        assert_eq!(loaded.profit_sharing_bps, 1_500);

        let by_user = repo.get_by_user("user-1").await.unwrap().unwrap();
        assert_eq!(by_user.id, franchise.id);
    }

    #[tokio::test]
    async fn test_update_missing_franchise_is_not_found() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db.franchises().set_active("missing", true).await;
        assert!(err.is_err());
    }
}
