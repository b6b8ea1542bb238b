//! # Settings Repository
//!
//! Database operations for per-franchise marketplace fee settings.
//!
//! Editing this row is the retroactive lever of the whole system: no sale
//! row changes, but every report recomputes its derived figures against the
//! new values on the next read.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use crate::notify::{ChangeHub, ChangedTable};
use laba_core::AdminSettings;

/// Repository for admin-settings database operations.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
    hub: ChangeHub,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool, hub: ChangeHub) -> Self {
        SettingsRepository { pool, hub }
    }

    /// Gets the settings row for a franchise.
    pub async fn get(&self, franchise_id: &str) -> DbResult<Option<AdminSettings>> {
        let settings = sqlx::query_as::<_, AdminSettings>(
            r#"
            SELECT franchise_id, admin_fee_bps, fixed_deduction, updated_at
            FROM admin_settings
            WHERE franchise_id = ?1
            "#,
        )
        .bind(franchise_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(settings)
    }

    /// Gets the settings for a franchise, falling back to the defaults.
    ///
    /// Provisioning always creates the row, so the fallback only matters for
    /// data imported from elsewhere. Reports must never fail for lack of a
    /// settings row.
    pub async fn get_or_default(&self, franchise_id: &str) -> DbResult<AdminSettings> {
        Ok(self
            .get(franchise_id)
            .await?
            .unwrap_or_else(|| AdminSettings::default_for(franchise_id)))
    }

    /// Creates or replaces the settings row for a franchise.
    pub async fn upsert(&self, settings: &AdminSettings) -> DbResult<()> {
        debug!(
            franchise_id = %settings.franchise_id,
            admin_fee_bps = %settings.admin_fee_bps,
            fixed_deduction = %settings.fixed_deduction,
            "Upserting admin settings"
        );

        sqlx::query(
            r#"
            INSERT INTO admin_settings (franchise_id, admin_fee_bps, fixed_deduction, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (franchise_id) DO UPDATE SET
                admin_fee_bps = excluded.admin_fee_bps,
                fixed_deduction = excluded.fixed_deduction,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&settings.franchise_id)
        .bind(settings.admin_fee_bps)
        .bind(settings.fixed_deduction)
        .bind(settings.updated_at)
        .execute(&self.pool)
        .await?;

        self.hub
            .publish(ChangedTable::AdminSettings, &settings.franchise_id);
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
