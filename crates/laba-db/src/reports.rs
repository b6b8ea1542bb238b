//! # Period Report Assembly
//!
//! Glue between the repositories and the pure engine: fetch a period's raw
//! rows, derive and aggregate through `laba_core`, and produce the monthly
//! report with its bottom-line real profit.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      monthly_report()                                   │
//! │                                                                         │
//! │  Period + display tz ──► UTC range                                     │
//! │       │                                                                 │
//! │       ├── sales.list_between()        (raw rows)                       │
//! │       ├── settings.get_or_default()   (current fee settings)           │
//! │       │         │                                                       │
//! │       │         ▼                                                       │
//! │       │   PeriodTotals::from_sales()  ← engine derives EVERY figure    │
//! │       │                                                                 │
//! │       ├── expenditures.total_between()                                 │
//! │       │                                                                 │
//! │       ├── profit_sharing.recompute(gross revenue)                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  real_profit = Σafter_discount − Σhpp − Σfee − expenses − share        │
//! │                                                                         │
//! │  Derived figures are NEVER read back from SQL; they exist only as      │
//! │  engine output, so current settings always win.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::TimeZone;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::DbResult;
use crate::pool::Database;
use laba_core::{engine, Franchise, Money, Period, PeriodTotals};

/// A franchise's complete report for one calendar month.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyReport {
    pub franchise_id: String,
    pub period: Period,

    /// Engine-derived totals over the period's sales.
    pub totals: PeriodTotals,

    /// Operating costs dated in the period.
    pub expenditure_total: Money,

    /// Revenue share owed for the period (snapshot just recomputed).
    pub revenue_share: Money,

    /// The bottom line: net profit minus expenditures minus revenue share.
    pub real_profit: Money,
}

/// Builds the monthly report for a franchise, recomputing the period's
/// revenue-share snapshot along the way.
///
/// `tz` is the operator's display timezone; the period's day boundaries are
/// taken there, not in UTC.
pub async fn monthly_report<Tz: TimeZone>(
    db: &Database,
    franchise: &Franchise,
    period: Period,
    tz: &Tz,
) -> DbResult<MonthlyReport> {
    let (from, to) = period.utc_range(tz);

    let sales = db.sales().list_between(&franchise.id, from, to).await?;
    let settings = db.settings().get_or_default(&franchise.id).await?;
    let totals = PeriodTotals::from_sales(&sales, &settings);

    let expenditure_total = db
        .expenditures()
        .total_between(&franchise.id, from, to)
        .await?;

    // Revenue share works on gross (pre-discount) sales.
    let payment = db
        .profit_sharing()
        .recompute(franchise, period, totals.total_sales)
        .await?;
    let revenue_share = Money::new(payment.profit_sharing_amount);

    let real_profit = engine::real_profit(&totals, expenditure_total, revenue_share);

    info!(
        franchise_id = %franchise.id,
        period = %period,
        net_profit = %totals.net_profit,
        real_profit = %real_profit,
        "Monthly report assembled"
    );

    Ok(MonthlyReport {
        franchise_id: franchise.id.clone(),
        period,
        totals,
        expenditure_total,
        revenue_share,
        real_profit,
    })
}

/// Recomputes every stored revenue-share snapshot for a franchise.
///
/// Run after the platform owner changes the franchise's rate: stored
/// snapshots keep their copied rate until this re-derives them. Each period
/// re-aggregates its sales through the same engine path as
/// [`monthly_report`], then goes back through
/// [`crate::repository::profit_sharing::ProfitSharingRepository::recompute`].
///
/// Returns the number of periods recomputed.
pub async fn recompute_all_periods<Tz: TimeZone>(
    db: &Database,
    franchise: &Franchise,
    tz: &Tz,
) -> DbResult<usize> {
    let payments = db.profit_sharing().list_for_franchise(&franchise.id).await?;
    let settings = db.settings().get_or_default(&franchise.id).await?;

    for payment in &payments {
        let period = payment.period();
        let (from, to) = period.utc_range(tz);

        let sales = db.sales().list_between(&franchise.id, from, to).await?;
        let totals = PeriodTotals::from_sales(&sales, &settings);

        db.profit_sharing()
            .recompute(franchise, period, totals.total_sales)
            .await?;
    }

    info!(
        franchise_id = %franchise.id,
        periods = payments.len(),
        "Recomputed all revenue-share periods"
    );

    Ok(payments.len())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone as _, Utc};
    use chrono_tz::Asia::Jakarta;

    use crate::pool::{Database, DbConfig};
    use crate::provisioning::create_franchise;
    use laba_core::{AdminSettings, Discount, Expenditure, Money, Product, Rate, SaleRecord};

    const JULY: Period = Period { year: 2026, month: 7 };

    async fn seeded_july() -> (Database, Franchise) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let franchise = create_franchise(&db, "Cabang Bandung", "user-1", 1_000)
            .await
            .unwrap();

        let product = Product::new(&franchise.id, "PKT-001", "Paket Reseller", 300_000, 500_000);
        db.products().insert(&product).await.unwrap();

        let mid_july = Jakarta
            .with_ymd_and_hms(2026, 7, 15, 10, 0, 0)
            .single()
            .expect("valid instant")
            .with_timezone(&Utc);

        db.sales()
            .insert(&SaleRecord::from_product(&product, 1, Discount::None, mid_july))
            .await
            .unwrap();
        db.sales()
            .insert(&SaleRecord::from_product(
                &product,
                1,
                Discount::Percentage(Rate::from_bps(1_000)),
                mid_july,
            ))
            .await
            .unwrap();

        db.expenditures()
            .insert(&Expenditure::new(&franchise.id, 50_000, "Ongkir retur", mid_july))
            .await
            .unwrap();
        // Outside the period; must not appear in July's report.
        let june = Jakarta
            .with_ymd_and_hms(2026, 6, 20, 10, 0, 0)
            .single()
            .expect("valid instant")
            .with_timezone(&Utc);
        db.expenditures()
            .insert(&Expenditure::new(&franchise.id, 999_000, "Renovasi", june))
            .await
            .unwrap();

        (db, franchise)
    }

    #[tokio::test]
    async fn test_monthly_report_end_to_end() {
        let (db, franchise) = seeded_july().await;

        let report = monthly_report(&db, &franchise, JULY, &Jakarta).await.unwrap();

        // Two Rp500.000 sales at default settings (5% + Rp1.000), one with
        // a 10% discount.
        assert_eq!(report.totals.total_sales, Money::new(1_000_000));
        assert_eq!(report.totals.sales_after_discount, Money::new(950_000));
        assert_eq!(report.totals.total_hpp, Money::new(600_000));
        assert_eq!(report.totals.admin_fee, Money::new(49_500));
        assert_eq!(report.totals.net_profit, Money::new(300_500));

        assert_eq!(report.expenditure_total, Money::new(50_000));

        // 10% of gross Rp1.000.000, independent of fees and HPP.
        assert_eq!(report.revenue_share, Money::new(100_000));

        assert_eq!(report.real_profit, Money::new(150_500));

        // The snapshot row was upserted along the way.
        let stored = db
            .profit_sharing()
            .get(&franchise.id, JULY)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.profit_sharing_amount, 100_000);
    }

    #[tokio::test]
    async fn test_settings_change_is_retroactive_for_fees_only() {
        let (db, franchise) = seeded_july().await;

        let before = monthly_report(&db, &franchise, JULY, &Jakarta).await.unwrap();

        // Marketplace waives all fees.
        db.settings()
            .upsert(&AdminSettings {
                franchise_id: franchise.id.clone(),
                admin_fee_bps: 0,
                fixed_deduction: 0,
                updated_at: Utc::now(),
            })
            .await
            .unwrap();

        let after = monthly_report(&db, &franchise, JULY, &Jakarta).await.unwrap();

        assert_eq!(after.totals.admin_fee, Money::zero());
        assert_eq!(
            after.totals.net_profit,
            before.totals.net_profit + before.totals.admin_fee,
        );
        // Share is on gross revenue, so the settings change cannot move it.
        assert_eq!(after.revenue_share, before.revenue_share);
    }

    #[tokio::test]
    async fn test_rate_change_then_recompute_all() {
        let (db, franchise) = seeded_july().await;

        monthly_report(&db, &franchise, JULY, &Jakarta).await.unwrap();

        db.franchises()
            .set_profit_sharing(&franchise.id, 500)
            .await
            .unwrap();

        // Snapshot still carries the old rate until recomputed.
        let stale = db
            .profit_sharing()
            .get(&franchise.id, JULY)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stale.profit_sharing_bps, 1_000);

        let franchise = db.franchises().get(&franchise.id).await.unwrap().unwrap();
        let recomputed = recompute_all_periods(&db, &franchise, &Jakarta).await.unwrap();
        assert_eq!(recomputed, 1);

        let fresh = db
            .profit_sharing()
            .get(&franchise.id, JULY)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fresh.profit_sharing_bps, 500);
        assert_eq!(fresh.profit_sharing_amount, 50_000);
    }
}
