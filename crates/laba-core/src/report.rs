//! # Report Aggregation
//!
//! Pure reducers that roll per-sale derived figures up to the totals shown
//! on the report screens: daily/monthly/yearly groupings, period-over-period
//! percent change, and best-seller ranking.
//!
//! Grouping uses the sale's business date in a **caller-supplied display
//! timezone**, never raw UTC - "today's sales" has to mean the operator's
//! today. Summation always runs through [`crate::engine::derive_sale`], so a
//! settings change re-values every bucket on the next pass.

use chrono::{NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::engine::{derive_sale, DerivedSale};
use crate::money::Money;
use crate::types::{AdminSettings, Period, SaleRecord};

// =============================================================================
// Period Totals
// =============================================================================

/// Summed raw and derived figures for one group of sales.
///
/// The net-profit formula is linear, so summing per-sale figures and
/// computing aggregates from summed components give identical results; this
/// struct is the single representation both paths share.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PeriodTotals {
    /// Gross sales before any discount.
    pub total_sales: Money,
    pub discount_amount: Money,
    pub sales_after_discount: Money,
    pub total_hpp: Money,
    pub admin_fee: Money,
    pub net_profit: Money,
    /// Number of sale records in the group.
    pub sale_count: u64,
}

impl PeriodTotals {
    /// Folds one sale and its derived figures into the totals.
    pub fn add_sale(&mut self, sale: &SaleRecord, derived: &DerivedSale) {
        self.total_sales += Money::new(sale.total_sales);
        self.discount_amount += derived.discount_amount;
        self.sales_after_discount += derived.sales_after_discount;
        self.total_hpp += Money::new(sale.total_hpp);
        self.admin_fee += derived.admin_fee;
        self.net_profit += derived.net_profit;
        self.sale_count += 1;
    }

    /// Derives and sums a whole slice of sales under the given settings.
    pub fn from_sales(sales: &[SaleRecord], settings: &AdminSettings) -> Self {
        let mut totals = PeriodTotals::default();
        for sale in sales {
            let derived = derive_sale(sale, settings);
            totals.add_sale(sale, &derived);
        }
        totals
    }
}

// =============================================================================
// Calendar Grouping
// =============================================================================

/// Groups sales by calendar day of their business date.
pub fn totals_by_day<Tz: TimeZone>(
    sales: &[SaleRecord],
    settings: &AdminSettings,
    tz: &Tz,
) -> BTreeMap<NaiveDate, PeriodTotals> {
    let mut groups: BTreeMap<NaiveDate, PeriodTotals> = BTreeMap::new();
    for sale in sales {
        let day = sale.created_at.with_timezone(tz).date_naive();
        let derived = derive_sale(sale, settings);
        groups.entry(day).or_default().add_sale(sale, &derived);
    }
    groups
}

/// Groups sales by calendar month of their business date.
pub fn totals_by_month<Tz: TimeZone>(
    sales: &[SaleRecord],
    settings: &AdminSettings,
    tz: &Tz,
) -> BTreeMap<Period, PeriodTotals> {
    let mut groups: BTreeMap<Period, PeriodTotals> = BTreeMap::new();
    for sale in sales {
        let period = Period::containing(sale.created_at, tz);
        let derived = derive_sale(sale, settings);
        groups.entry(period).or_default().add_sale(sale, &derived);
    }
    groups
}

/// Groups sales by calendar year of their business date.
pub fn totals_by_year<Tz: TimeZone>(
    sales: &[SaleRecord],
    settings: &AdminSettings,
    tz: &Tz,
) -> BTreeMap<i32, PeriodTotals> {
    let mut groups: BTreeMap<i32, PeriodTotals> = BTreeMap::new();
    for sale in sales {
        let year = Period::containing(sale.created_at, tz).year;
        let derived = derive_sale(sale, settings);
        groups.entry(year).or_default().add_sale(sale, &derived);
    }
    groups
}

// =============================================================================
// Percent Change
// =============================================================================

/// Period-over-period change of a metric, in percent.
///
/// ## Convention
/// `previous = 0` would divide by zero; instead of fabricating an infinite
/// or negative swing the dashboard shows 100% growth when anything appeared,
/// 0% when both periods are empty:
///
/// ```rust
/// use laba_core::money::Money;
/// use laba_core::report::percent_change;
///
/// assert_eq!(percent_change(Money::zero(), Money::new(500_000)), 100.0);
/// assert_eq!(percent_change(Money::zero(), Money::zero()), 0.0);
/// assert_eq!(percent_change(Money::new(100), Money::new(150)), 50.0);
/// ```
pub fn percent_change(previous: Money, current: Money) -> f64 {
    if previous.is_zero() {
        return if current.is_positive() { 100.0 } else { 0.0 };
    }
    (current.amount() - previous.amount()) as f64 / previous.amount().abs() as f64 * 100.0
}

// =============================================================================
// Product Ranking
// =============================================================================

/// One row of the best-seller ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductRank {
    pub product_code: String,
    pub product_name: String,
    pub quantity_sold: i64,
    /// Gross sales attributed to the product.
    pub total_sales: Money,
    /// `quantity_sold / Σ quantity × 100`, 0 when nothing was sold.
    pub contribution_percent: f64,
}

/// Ranks products by units sold, descending.
///
/// Ties keep the order in which the products first appear in `sales`
/// (stable sort). Contribution is each product's share of the summed
/// quantity.
pub fn rank_products_by_quantity(sales: &[SaleRecord]) -> Vec<ProductRank> {
    let mut ranks: Vec<ProductRank> = Vec::new();

    for sale in sales {
        match ranks
            .iter_mut()
            .find(|r| r.product_code == sale.product_code)
        {
            Some(rank) => {
                rank.quantity_sold += sale.quantity;
                rank.total_sales += Money::new(sale.total_sales);
            }
            None => ranks.push(ProductRank {
                product_code: sale.product_code.clone(),
                product_name: sale.product_name.clone(),
                quantity_sold: sale.quantity,
                total_sales: Money::new(sale.total_sales),
                contribution_percent: 0.0,
            }),
        }
    }

    ranks.sort_by(|a, b| b.quantity_sold.cmp(&a.quantity_sold));

    let grand_total: i64 = ranks.iter().map(|r| r.quantity_sold).sum();
    if grand_total != 0 {
        for rank in &mut ranks {
            rank.contribution_percent = rank.quantity_sold as f64 / grand_total as f64 * 100.0;
        }
    }

    ranks
}

// =============================================================================
// Unit Tests
// =============================================================================
