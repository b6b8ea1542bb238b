//! # Calculation Engine
//!
//! The deterministic pipeline from raw sale figures plus current settings to
//! every derived monetary figure shown in reports.
//!
//! ## The Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              derive_sale(raw, settings) - exact order                   │
//! │                                                                         │
//! │  total_sales ──► 1. discount amount (clamped to total_sales)           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  2. sales_after_discount = total_sales − discount                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  3. admin_fee = after_discount × fee% + fixed deduction                │
//! │       │          (fixed deduction applies even at zero sales)          │
//! │       ▼                                                                 │
//! │  4. net_profit = after_discount − total_hpp − admin_fee                │
//! │                                                                         │
//! │  Later steps depend on earlier ones; the order is not negotiable.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Totality
//! These functions have no error path and no I/O. They are safe to call once
//! per rendered row on every report pass; a settings change re-values all of
//! history purely by being passed in on the next call. Inputs that slipped
//! past the form boundary (a negative quantity, a rate above 100%) propagate
//! arithmetically instead of panicking - a negative net profit is a business
//! outcome here, not an error.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Money, Rate};
use crate::report::PeriodTotals;
use crate::types::{AdminSettings, Discount, SaleRecord};

// =============================================================================
// Derived Figures
// =============================================================================

/// Every derived monetary figure for one sale.
///
/// Never persisted. Reports recompute this from the raw row and the current
/// [`AdminSettings`] on every pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DerivedSale {
    /// Rupiah taken off by the discount, clamped to the sale total.
    pub discount_amount: Money,

    /// `total_sales − discount_amount`. Never negative for in-domain input.
    pub sales_after_discount: Money,

    /// Marketplace commission plus the unconditional fixed deduction.
    /// Can exceed post-discount sales, driving net profit negative.
    pub admin_fee: Money,

    /// `sales_after_discount − total_hpp − admin_fee`.
    pub net_profit: Money,
}

/// Computes the derived figures for one sale row.
///
/// Thin wrapper over [`derive_figures`] that unpacks the stored columns.
pub fn derive_sale(sale: &SaleRecord, settings: &AdminSettings) -> DerivedSale {
    derive_figures(
        Money::new(sale.total_sales),
        Money::new(sale.total_hpp),
        sale.discount(),
        settings,
    )
}

/// Computes the derived figures from raw totals.
///
/// ## Algorithm
/// 1. Discount amount: percentage → `total_sales × rate`, fixed → the stored
///    amount, none → zero; then clamp to `total_sales` so a discount can
///    never push post-discount sales negative.
/// 2. `sales_after_discount = total_sales − discount_amount`.
/// 3. `admin_fee = sales_after_discount × fee_rate + fixed_deduction`. The
///    fixed deduction applies unconditionally, even at zero sales.
/// 4. `net_profit = sales_after_discount − total_hpp − admin_fee`.
///
/// ## Example
/// ```rust
/// use laba_core::engine::derive_figures;
/// use laba_core::money::{Money, Rate};
/// use laba_core::types::{AdminSettings, Discount};
///
/// let settings = AdminSettings::default_for("f1");
/// let derived = derive_figures(
///     Money::new(500_000),
///     Money::new(300_000),
///     Discount::Percentage(Rate::from_bps(1_000)),
///     &settings,
/// );
///
/// assert_eq!(derived.discount_amount, Money::new(50_000));
/// assert_eq!(derived.sales_after_discount, Money::new(450_000));
/// assert_eq!(derived.admin_fee, Money::new(23_500));
/// assert_eq!(derived.net_profit, Money::new(126_500));
/// ```
pub fn derive_figures(
    total_sales: Money,
    total_hpp: Money,
    discount: Discount,
    settings: &AdminSettings,
) -> DerivedSale {
    let raw_discount = match discount {
        Discount::None => Money::zero(),
        Discount::Percentage(rate) => total_sales.apply_rate(rate),
        Discount::Fixed(amount) => amount,
    };
    let discount_amount = raw_discount.min(total_sales);

    let sales_after_discount = total_sales - discount_amount;

    let admin_fee =
        sales_after_discount.apply_rate(settings.fee_rate()) + Money::new(settings.fixed_deduction);

    let net_profit = sales_after_discount - total_hpp - admin_fee;

    DerivedSale {
        discount_amount,
        sales_after_discount,
        admin_fee,
        net_profit,
    }
}

// =============================================================================
// Revenue Share
// =============================================================================

/// Computes the revenue share owed to the platform owner for a period.
///
/// Deliberately computed from **gross** period revenue, not net profit. This
/// is a business decision, restated here because it is easy to mistakenly
/// wire to the per-sale net figure. Every caller that materializes a
/// [`crate::types::ProfitSharingPayment`] must route through this function
/// so the formula exists exactly once.
///
/// ## Example
/// ```rust
/// use laba_core::engine::revenue_share;
/// use laba_core::money::{Money, Rate};
///
/// // Rp10.000.000 gross at 10% owes Rp1.000.000, whatever the costs were.
/// assert_eq!(
///     revenue_share(Money::new(10_000_000), Rate::from_bps(1_000)),
///     Money::new(1_000_000),
/// );
/// ```
pub fn revenue_share(total_revenue: Money, rate: Rate) -> Money {
    total_revenue.apply_rate(rate)
}

// =============================================================================
// Real Profit
// =============================================================================

/// Computes the bottom-line figure for a period:
///
/// `Σ sales_after_discount − Σ hpp − Σ admin_fee − expenditures − share`
///
/// The first three terms come from [`PeriodTotals`], i.e. from the summed
/// output of the per-sale engine - the aggregate is never re-derived by a
/// different path. The formula is period-agnostic; reports apply it per
/// calendar month.
pub fn real_profit(
    totals: &PeriodTotals,
    expenditure_total: Money,
    revenue_share: Money,
) -> Money {
    totals.sales_after_discount - totals.total_hpp - totals.admin_fee - expenditure_total
        - revenue_share
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::types::{DiscountType, Product};

    fn settings(fee_bps: u32, fixed: i64) -> AdminSettings {
        AdminSettings {
            franchise_id: "franchise-1".to_string(),
            admin_fee_bps: fee_bps,
            fixed_deduction: fixed,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_no_discount_passthrough() {
        let derived = derive_figures(
            Money::new(500_000),
            Money::zero(),
            Discount::None,
            &settings(0, 0),
        );
        assert_eq!(derived.discount_amount, Money::zero());
        assert_eq!(derived.sales_after_discount, Money::new(500_000));
    }

    #[test]
    fn test_spec_scenario_no_discount() {
        // Rp500.000 sales, Rp300.000 HPP, 5% + Rp1.000
        let derived = derive_figures(
            Money::new(500_000),
            Money::new(300_000),
            Discount::None,
            &settings(500, 1_000),
        );
        assert_eq!(derived.admin_fee, Money::new(26_000));
        assert_eq!(derived.net_profit, Money::new(174_000));
    }

    #[test]
    fn test_spec_scenario_percentage_discount() {
        let derived = derive_figures(
            Money::new(500_000),
            Money::new(300_000),
            Discount::Percentage(Rate::from_bps(1_000)),
            &settings(500, 1_000),
        );
        assert_eq!(derived.discount_amount, Money::new(50_000));
        assert_eq!(derived.sales_after_discount, Money::new(450_000));
        assert_eq!(derived.admin_fee, Money::new(23_500));
        assert_eq!(derived.net_profit, Money::new(126_500));
    }

    #[test]
    fn test_percentage_discount_above_100_clamps() {
        let derived = derive_figures(
            Money::new(100_000),
            Money::zero(),
            Discount::Percentage(Rate::from_bps(15_000)), // 150%
            &settings(0, 0),
        );
        assert_eq!(derived.discount_amount, Money::new(100_000));
        assert_eq!(derived.sales_after_discount, Money::zero());
    }

    #[test]
    fn test_fixed_discount_above_total_clamps() {
        let derived = derive_figures(
            Money::new(40_000),
            Money::zero(),
            Discount::Fixed(Money::new(60_000)),
            &settings(0, 0),
        );
        assert_eq!(derived.discount_amount, Money::new(40_000));
        assert_eq!(derived.sales_after_discount, Money::zero());
    }

    #[test]
    fn test_fixed_deduction_applies_at_zero_sales() {
        // Zero sales still owe the flat deduction; net profit goes negative.
        let derived = derive_figures(
            Money::zero(),
            Money::zero(),
            Discount::None,
            &settings(500, 1_000),
        );
        assert_eq!(derived.admin_fee, Money::new(1_000));
        assert_eq!(derived.net_profit, Money::new(-1_000));
    }

    #[test]
    fn test_net_profit_identity() {
        let derived = derive_figures(
            Money::new(275_000),
            Money::new(190_000),
            Discount::Fixed(Money::new(12_500)),
            &settings(750, 2_000),
        );
        assert_eq!(
            derived.net_profit,
            derived.sales_after_discount - Money::new(190_000) - derived.admin_fee,
        );
    }

    #[test]
    fn test_idempotent() {
        let product = Product::new("franchise-1", "TEH-01", "Teh Botol", 2_500, 4_000);
        let sale = SaleRecord::from_product(
            &product,
            7,
            Discount::Percentage(Rate::from_bps(500)),
            Utc::now(),
        );
        let s = settings(500, 1_000);

        assert_eq!(derive_sale(&sale, &s), derive_sale(&sale, &s));
    }

    #[test]
    fn test_derive_sale_reads_stored_totals() {
        // Stored totals win over price × quantity: the product may have
        // been repriced since the sale.
        let product = Product::new("franchise-1", "TEH-01", "Teh Botol", 2_500, 4_000);
        let mut sale = SaleRecord::from_product(&product, 2, Discount::None, Utc::now());
        sale.total_sales = 9_999;
        sale.discount_type = DiscountType::None;

        let derived = derive_sale(&sale, &settings(0, 0));
        assert_eq!(derived.sales_after_discount, Money::new(9_999));
    }

    #[test]
    fn test_revenue_share_uses_gross() {
        // Independent of HPP and admin fee by construction.
        assert_eq!(
            revenue_share(Money::new(10_000_000), Rate::from_bps(1_000)),
            Money::new(1_000_000),
        );
    }

    #[test]
    fn test_real_profit_combines_all_deductions() {
        let totals = PeriodTotals {
            sales_after_discount: Money::new(450_000),
            total_hpp: Money::new(300_000),
            admin_fee: Money::new(23_500),
            ..PeriodTotals::default()
        };
        let profit = real_profit(&totals, Money::new(50_000), Money::new(45_000));
        assert_eq!(profit, Money::new(31_500));
    }
}
