//! # Profit Sharing Repository
//!
//! Database operations for revenue-share period snapshots.
//!
//! ## Snapshot Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  Revenue-Share Period Lifecycle                         │
//! │                                                                         │
//! │  1. RECOMPUTE (idempotent, any number of times)                        │
//! │     └── recompute(franchise, period, gross_revenue)                    │
//! │         └── amount = engine::revenue_share(gross, rate)                │
//! │         └── upsert keyed (franchise, year, month)                      │
//! │         └── existing status/notes/paid_at survive                      │
//! │                                                                         │
//! │  2. SETTLE (manual, by the platform owner)                             │
//! │     └── set_status(franchise, period, Paid, notes)                     │
//! │                                                                         │
//! │  The amount is a COPY: a later change to the franchise's rate does     │
//! │  nothing until someone recomputes the period.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`ProfitSharingRepository::recompute`] is the only place in this crate
//! that turns gross revenue into an owed amount; both recalculation paths
//! (period report, rate change) go through it.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::notify::{ChangeHub, ChangedTable};
use laba_core::{engine, Franchise, Money, PaymentStatus, Period, ProfitSharingPayment};

const PAYMENT_COLUMNS: &str = "id, franchise_id, period_year, period_month, total_revenue, \
     profit_sharing_bps, profit_sharing_amount, payment_status, paid_at, notes, \
     created_at, updated_at";

/// Repository for revenue-share payment operations.
#[derive(Debug, Clone)]
pub struct ProfitSharingRepository {
    pool: SqlitePool,
    hub: ChangeHub,
}

impl ProfitSharingRepository {
    /// Creates a new ProfitSharingRepository.
    pub fn new(pool: SqlitePool, hub: ChangeHub) -> Self {
        ProfitSharingRepository { pool, hub }
    }

    /// Recomputes the snapshot for a (franchise, period) from gross revenue.
    ///
    /// The owed amount always comes from [`engine::revenue_share`] - gross
    /// revenue times the franchise's current rate, never net profit.
    ///
    /// Idempotent: the upsert is keyed on (franchise, year, month). On an
    /// existing row the revenue, rate, and amount are replaced while the
    /// settlement fields (status, paid_at, notes) and identity survive.
    pub async fn recompute(
        &self,
        franchise: &Franchise,
        period: Period,
        total_revenue: Money,
    ) -> DbResult<ProfitSharingPayment> {
        let amount = engine::revenue_share(total_revenue, franchise.profit_share_rate());

        debug!(
            franchise_id = %franchise.id,
            period = %period,
            total_revenue = %total_revenue,
            amount = %amount,
            "Recomputing profit sharing"
        );

        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO profit_sharing_payments (
                id, franchise_id, period_year, period_month,
                total_revenue, profit_sharing_bps, profit_sharing_amount,
                payment_status, paid_at, notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'unpaid', NULL, NULL, ?8, ?8)
            ON CONFLICT (franchise_id, period_year, period_month) DO UPDATE SET
                total_revenue = excluded.total_revenue,
                profit_sharing_bps = excluded.profit_sharing_bps,
                profit_sharing_amount = excluded.profit_sharing_amount,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&franchise.id)
        .bind(period.year)
        .bind(period.month)
        .bind(total_revenue.amount())
        .bind(franchise.profit_sharing_bps)
        .bind(amount.amount())
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.hub
            .publish(ChangedTable::ProfitSharingPayments, &franchise.id);

        self.get(&franchise.id, period)
            .await?
            .ok_or_else(|| DbError::not_found("ProfitSharingPayment", period.to_string()))
    }

    /// Gets the snapshot for a (franchise, period).
    pub async fn get(
        &self,
        franchise_id: &str,
        period: Period,
    ) -> DbResult<Option<ProfitSharingPayment>> {
        let payment = sqlx::query_as::<_, ProfitSharingPayment>(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS} FROM profit_sharing_payments
            WHERE franchise_id = ?1 AND period_year = ?2 AND period_month = ?3
            "#
        ))
        .bind(franchise_id)
        .bind(period.year)
        .bind(period.month)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    /// Lists a franchise's snapshots, newest period first.
    pub async fn list_for_franchise(
        &self,
        franchise_id: &str,
    ) -> DbResult<Vec<ProfitSharingPayment>> {
        let payments = sqlx::query_as::<_, ProfitSharingPayment>(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS} FROM profit_sharing_payments
            WHERE franchise_id = ?1
            ORDER BY period_year DESC, period_month DESC
            "#
        ))
        .bind(franchise_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Lists every franchise's snapshot for one period (owner overview).
    pub async fn list_for_period(&self, period: Period) -> DbResult<Vec<ProfitSharingPayment>> {
        let payments = sqlx::query_as::<_, ProfitSharingPayment>(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS} FROM profit_sharing_payments
            WHERE period_year = ?1 AND period_month = ?2
            ORDER BY franchise_id
            "#
        ))
        .bind(period.year)
        .bind(period.month)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Manually updates the settlement state of a period.
    ///
    /// `paid_at` is stamped when the status moves to Paid and cleared when
    /// it moves back to Unpaid.
    pub async fn set_status(
        &self,
        franchise_id: &str,
        period: Period,
        status: PaymentStatus,
        notes: Option<&str>,
    ) -> DbResult<()> {
        debug!(
            franchise_id = %franchise_id,
            period = %period,
            status = ?status,
            "Setting payment status"
        );

        let now = Utc::now();
        let paid_at = match status {
            PaymentStatus::Paid => Some(now),
            PaymentStatus::Unpaid => None,
        };

        let result = sqlx::query(
            r#"
            UPDATE profit_sharing_payments SET
                payment_status = ?4,
                paid_at = ?5,
                notes = ?6,
                updated_at = ?7
            WHERE franchise_id = ?1 AND period_year = ?2 AND period_month = ?3
            "#,
        )
        .bind(franchise_id)
        .bind(period.year)
        .bind(period.month)
        .bind(status)
        .bind(paid_at)
        .bind(notes)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(
                "ProfitSharingPayment",
                format!("{franchise_id}/{period}"),
            ));
        }

        self.hub
            .publish(ChangedTable::ProfitSharingPayments, franchise_id);
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use laba_core::{Franchise, Money, PaymentStatus, Period};

    async fn setup() -> (Database, Franchise) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        // 10% revenue share
        let franchise = Franchise::new("Cabang Test", "user-1", 1_000);
        db.franchises().insert(&franchise).await.unwrap();
        (db, franchise)
    }

    #[tokio::test]
    async fn test_recompute_from_gross_revenue() {
        let (db, franchise) = setup().await;
        let period = Period { year: 2026, month: 7 };

        let payment = db
            .profit_sharing()
            .recompute(&franchise, period, Money::new(10_000_000))
            .await
            .unwrap();

        assert_eq!(payment.total_revenue, 10_000_000);
        assert_eq!(payment.profit_sharing_bps, 1_000);
        assert_eq!(payment.profit_sharing_amount, 1_000_000);
        assert_eq!(payment.payment_status, PaymentStatus::Unpaid);
        assert!(payment.paid_at.is_none());
    }

    #[tokio::test]
    async fn test_recompute_is_idempotent_and_preserves_settlement() {
        let (db, franchise) = setup().await;
        let repo = db.profit_sharing();
        let period = Period { year: 2026, month: 7 };

        let first = repo
            .recompute(&franchise, period, Money::new(10_000_000))
            .await
            .unwrap();

        repo.set_status(&franchise.id, period, PaymentStatus::Paid, Some("Transfer BCA"))
            .await
            .unwrap();

        // New back-dated sale arrived; the period is recomputed.
        let second = repo
            .recompute(&franchise, period, Money::new(12_000_000))
            .await
            .unwrap();

        assert_eq!(second.id, first.id, "row identity survives the upsert");
        assert_eq!(second.profit_sharing_amount, 1_200_000);
        assert_eq!(second.payment_status, PaymentStatus::Paid);
        assert!(second.paid_at.is_some());
        assert_eq!(second.notes.as_deref(), Some("Transfer BCA"));

        assert_eq!(repo.list_for_franchise(&franchise.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_set_status_on_missing_period_fails() {
        let (db, franchise) = setup().await;

        let missing = Period { year: 2020, month: 1 };
        let err = db
            .profit_sharing()
            .set_status(&franchise.id, missing, PaymentStatus::Paid, None)
            .await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_owner_period_overview() {
        let (db, first) = setup().await;
        let second = Franchise::new("Cabang Dua", "user-2", 500);
        db.franchises().insert(&second).await.unwrap();

        let period = Period { year: 2026, month: 7 };
        let repo = db.profit_sharing();
        repo.recompute(&first, period, Money::new(4_000_000))
            .await
            .unwrap();
        repo.recompute(&second, period, Money::new(2_000_000))
            .await
            .unwrap();
        repo.recompute(&first, Period { year: 2026, month: 8 }, Money::new(1_000_000))
            .await
            .unwrap();

        let overview = repo.list_for_period(period).await.unwrap();
        assert_eq!(overview.len(), 2);
    }
}
