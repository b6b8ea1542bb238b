//! # Franchise Provisioning
//!
//! Creating a franchise is a multi-entity write: the franchise row and its
//! default settings row must both exist, or neither. The hosted-store
//! predecessor of this system issued the writes independently and could
//! leave an orphaned franchise behind a partial failure; here the whole
//! sequence sits behind one SQLite transaction instead.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Provisioning Transaction                             │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    INSERT INTO franchises (...)         ← tenant row                   │
//! │    INSERT INTO admin_settings (...)     ← 5% + Rp1.000 defaults        │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any failure before COMMIT rolls the whole thing back; there is no     │
//! │  cleanup path because there is nothing partial to clean up.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The user account itself lives in the external auth system and is only
//! referenced by id here.

use tracing::info;

use crate::error::DbResult;
use crate::notify::ChangedTable;
use crate::pool::Database;
use laba_core::validation::{validate_franchise_name, validate_rate_bps};
use laba_core::{AdminSettings, CoreError, Franchise};

/// Creates a franchise together with its default admin settings, atomically.
///
/// ## Arguments
/// * `name` - Display name of the franchise
/// * `user_id` - Owning account in the external auth system
/// * `profit_sharing_bps` - Revenue-share rate set by the platform owner
///
/// ## Returns
/// The created franchise. Its settings row exists and holds the defaults
/// (5% admin fee, Rp1.000 fixed deduction).
pub async fn create_franchise(
    db: &Database,
    name: &str,
    user_id: &str,
    profit_sharing_bps: u32,
) -> DbResult<Franchise> {
    validate_franchise_name(name).map_err(CoreError::from)?;
    validate_rate_bps("profit_sharing", profit_sharing_bps).map_err(CoreError::from)?;

    let franchise = Franchise::new(name, user_id, profit_sharing_bps);
    let settings = AdminSettings::default_for(&franchise.id);

    let mut tx = db.pool().begin().await?;

    sqlx::query(
        r#"
        INSERT INTO franchises (
            id, name, user_id, profit_sharing_bps, is_active, created_at, updated_at
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
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO admin_settings (franchise_id, admin_fee_bps, fixed_deduction, updated_at)
        VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(&settings.franchise_id)
    .bind(settings.admin_fee_bps)
    .bind(settings.fixed_deduction)
    .bind(settings.updated_at)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(id = %franchise.id, name = %franchise.name, "Franchise provisioned");

    db.changes().publish(ChangedTable::Franchises, &franchise.id);
    db.changes()
        .publish(ChangedTable::AdminSettings, &franchise.id);

    Ok(franchise)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_provisioning_creates_both_rows() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let franchise = create_franchise(&db, "Cabang Bandung", "user-1", 1_000)
            .await
            .unwrap();

        let loaded = db.franchises().get(&franchise.id).await.unwrap().unwrap();
        assert!(loaded.is_active);
        assert_eq!(loaded.profit_sharing_bps, 1_000);

        let settings = db.settings().get(&franchise.id).await.unwrap().unwrap();
        assert_eq!(settings.admin_fee_bps, 500);
        assert_eq!(settings.fixed_deduction, 1_000);
    }

    #[tokio::test]
    async fn test_validation_rejects_before_any_write() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        assert!(create_franchise(&db, "", "user-1", 1_000).await.is_err());
        assert!(create_franchise(&db, "Cabang", "user-1", 20_000)
            .await
            .is_err());

        assert!(db.franchises().list_all().await.unwrap().is_empty());
    }
}
