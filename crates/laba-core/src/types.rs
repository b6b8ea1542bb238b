//! # Domain Types
//!
//! Core domain types used throughout Laba.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   Franchise     │   │   SaleRecord    │   │    Product      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  profit_share   │   │  snapshots      │   │  code (biz id)  │       │
//! │  │  is_active      │   │  raw figures    │   │  hpp / price    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  AdminSettings  │   │  Expenditure    │   │ ProfitSharing   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │    Payment      │       │
//! │  │  fee bps        │   │  amount         │   │  ─────────────  │       │
//! │  │  fixed deduct.  │   │  date           │   │  one per period │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A sale row freezes the product's name, code, price, and HPP at sale time.
//! Editing or deleting the product later never changes historical rows; only
//! the **derived** figures (fee, net profit) move, because those are computed
//! from current [`AdminSettings`] on every read.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{Money, Rate};
use crate::{DEFAULT_ADMIN_FEE_BPS, DEFAULT_FIXED_DEDUCTION};

// =============================================================================
// Discount
// =============================================================================

/// Storage tag for the discount applied to a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// No discount on this sale.
    None,
    /// `discount_value` is a rate in basis points.
    Percentage,
    /// `discount_value` is a rupiah amount.
    Fixed,
}

impl Default for DiscountType {
    fn default() -> Self {
        DiscountType::None
    }
}

/// Typed view of a sale's discount, decoded from the stored pair
/// (`discount_type`, `discount_value`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discount {
    None,
    Percentage(Rate),
    Fixed(Money),
}

impl Discount {
    /// Encodes the typed discount into its stored representation.
    pub fn encode(&self) -> (DiscountType, i64) {
        match self {
            Discount::None => (DiscountType::None, 0),
            Discount::Percentage(rate) => (DiscountType::Percentage, rate.bps() as i64),
            Discount::Fixed(amount) => (DiscountType::Fixed, amount.amount()),
        }
    }
}

// =============================================================================
// Sale Record
// =============================================================================

/// A recorded marketplace sale.
///
/// Raw figures only: quantity, unit price, unit cost, and the stored totals.
/// Derived figures (discount amount, admin fee, net profit) are **never**
/// stored here - see [`crate::engine::derive_sale`].
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleRecord {
    pub id: String,

    /// Owning tenant. Every computation and query is scoped to one franchise.
    pub franchise_id: String,

    /// Product reference. NULL once the product is deleted; the snapshots
    /// below keep the historical row intact.
    pub product_id: Option<String>,

    /// Product name at time of sale (frozen).
    pub product_name: String,

    /// Product code at time of sale (frozen).
    pub product_code: String,

    /// Units sold. Positive.
    pub quantity: i64,

    /// Unit sale price in rupiah at time of sale (frozen).
    pub price_per_unit: i64,

    /// Unit cost (HPP) in rupiah at time of sale (frozen).
    pub hpp_per_unit: i64,

    /// `price_per_unit × quantity`, stored at creation. Not recomputed from
    /// the product, whose price may change later.
    pub total_sales: i64,

    /// `hpp_per_unit × quantity`, stored at creation.
    pub total_hpp: i64,

    /// How to interpret `discount_value`.
    pub discount_type: DiscountType,

    /// Basis points for a percentage discount, rupiah for a fixed one.
    pub discount_value: i64,

    /// The sale's business date. Separately settable from record-creation
    /// time so operators can back-date entries.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl SaleRecord {
    /// Creates a sale from a product, freezing the product's identity and
    /// prices into the row.
    ///
    /// ## Price Freezing
    /// The price and HPP are captured at this moment. If the product changes
    /// in the catalog afterwards, this sale retains the original figures.
    pub fn from_product(
        product: &Product,
        quantity: i64,
        discount: Discount,
        business_date: DateTime<Utc>,
    ) -> Self {
        let (discount_type, discount_value) = discount.encode();
        let now = Utc::now();

        SaleRecord {
            id: Uuid::new_v4().to_string(),
            franchise_id: product.franchise_id.clone(),
            product_id: Some(product.id.clone()),
            product_name: product.name.clone(),
            product_code: product.code.clone(),
            quantity,
            price_per_unit: product.price,
            hpp_per_unit: product.hpp,
            total_sales: product.price * quantity,
            total_hpp: product.hpp * quantity,
            discount_type,
            discount_value,
            created_at: business_date,
            updated_at: now,
        }
    }

    /// Returns the typed discount for this sale.
    pub fn discount(&self) -> Discount {
        match self.discount_type {
            DiscountType::None => Discount::None,
            DiscountType::Percentage => Discount::Percentage(Rate::from_bps(
                u32::try_from(self.discount_value).unwrap_or(0),
            )),
            DiscountType::Fixed => Discount::Fixed(Money::new(self.discount_value)),
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product owned by one franchise.
///
/// Deleting a product does not alter historical sales: sale rows carry their
/// own snapshots and the `product_id` reference simply goes NULL.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub franchise_id: String,

    /// Business identifier, unique per franchise. Free-form.
    pub code: String,

    pub name: String,

    /// Unit cost (Harga Pokok Penjualan) in rupiah.
    pub hpp: i64,

    /// Unit sale price in rupiah.
    pub price: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates a new product for a franchise.
    pub fn new(
        franchise_id: impl Into<String>,
        code: impl Into<String>,
        name: impl Into<String>,
        hpp: i64,
        price: i64,
    ) -> Self {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4().to_string(),
            franchise_id: franchise_id.into(),
            code: code.into(),
            name: name.into(),
            hpp,
            price,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// Admin Settings
// =============================================================================

/// Marketplace fee settings, one row per franchise.
///
/// Mutable. Because derived sale figures are computed at read time, editing
/// these values retroactively re-values every historical sale in every
/// report - by design, not as a caching artifact.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct AdminSettings {
    pub franchise_id: String,

    /// Percentage-of-sales commission, in basis points (500 = 5%).
    pub admin_fee_bps: u32,

    /// Flat per-transaction deduction in rupiah. Applies unconditionally,
    /// even when post-discount sales are zero.
    pub fixed_deduction: i64,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl AdminSettings {
    /// Returns the defaults for a newly created franchise: 5% + Rp1.000.
    pub fn default_for(franchise_id: impl Into<String>) -> Self {
        AdminSettings {
            franchise_id: franchise_id.into(),
            admin_fee_bps: DEFAULT_ADMIN_FEE_BPS,
            fixed_deduction: DEFAULT_FIXED_DEDUCTION,
            updated_at: Utc::now(),
        }
    }

    /// Returns the admin fee as a typed rate.
    #[inline]
    pub fn fee_rate(&self) -> Rate {
        Rate::from_bps(self.admin_fee_bps)
    }
}

// =============================================================================
// Franchise
// =============================================================================

/// A tenant operating its own catalog, sales, and expenditures.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Franchise {
    pub id: String,
    pub name: String,

    /// Owning account in the external auth system.
    pub user_id: String,

    /// Share of gross revenue owed to the platform owner, in basis points.
    /// Set by the platform owner, not the franchise.
    pub profit_sharing_bps: u32,

    /// Gate on login access. Inactive franchises keep their data.
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Franchise {
    /// Creates a new active franchise.
    pub fn new(
        name: impl Into<String>,
        user_id: impl Into<String>,
        profit_sharing_bps: u32,
    ) -> Self {
        let now = Utc::now();
        Franchise {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            user_id: user_id.into(),
            profit_sharing_bps,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the revenue-share rate as a typed rate.
    #[inline]
    pub fn profit_share_rate(&self) -> Rate {
        Rate::from_bps(self.profit_sharing_bps)
    }

    /// Errors when the franchise has been deactivated.
    ///
    /// The login/session layer is external; this is the gate it consults.
    pub fn ensure_active(&self) -> CoreResult<()> {
        if self.is_active {
            Ok(())
        } else {
            Err(CoreError::FranchiseInactive(self.id.clone()))
        }
    }
}

// =============================================================================
// Expenditure
// =============================================================================

/// An operating cost not tied to a specific sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Expenditure {
    pub id: String,
    pub franchise_id: String,

    /// Rupiah amount. Positive.
    pub amount: i64,

    pub description: String,

    /// Business date of the cost. Back-datable like sales.
    #[ts(as = "String")]
    pub expenditure_date: DateTime<Utc>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Expenditure {
    /// Creates a new expenditure for a franchise.
    pub fn new(
        franchise_id: impl Into<String>,
        amount: i64,
        description: impl Into<String>,
        expenditure_date: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Expenditure {
            id: Uuid::new_v4().to_string(),
            franchise_id: franchise_id.into(),
            amount,
            description: description.into(),
            expenditure_date,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// Payment Status
// =============================================================================

/// Settlement state of a revenue-share period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Computed but not yet settled with the platform owner.
    Unpaid,
    /// Settled.
    Paid,
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Unpaid
    }
}

// =============================================================================
// Profit Sharing Payment
// =============================================================================

/// Revenue share owed for one (franchise, month) period.
///
/// A snapshot, not a live join: `total_revenue` and `profit_sharing_bps` are
/// copied at computation time so the owed amount stays stable after it is
/// recorded, until the period is explicitly recomputed.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProfitSharingPayment {
    pub id: String,
    pub franchise_id: String,

    pub period_year: i32,
    /// Calendar month, 1-12.
    pub period_month: u32,

    /// Gross sales for the period at computation time, in rupiah.
    pub total_revenue: i64,

    /// Rate copied from the franchise at computation time.
    pub profit_sharing_bps: u32,

    /// `total_revenue × rate`, computed from **gross** revenue.
    pub profit_sharing_amount: i64,

    pub payment_status: PaymentStatus,

    #[ts(as = "Option<String>")]
    pub paid_at: Option<DateTime<Utc>>,

    pub notes: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl ProfitSharingPayment {
    /// Returns the period this payment covers.
    #[inline]
    pub fn period(&self) -> Period {
        Period {
            year: self.period_year,
            month: self.period_month,
        }
    }
}

// =============================================================================
// Period
// =============================================================================

/// A calendar month, the reporting granularity for revenue share.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Period {
    pub year: i32,
    /// 1-12.
    pub month: u32,
}

impl Period {
    /// Creates a validated period.
    pub fn new(year: i32, month: u32) -> Result<Self, ValidationError> {
        if !(1..=12).contains(&month) {
            return Err(ValidationError::OutOfRange {
                field: "month".to_string(),
                min: 1,
                max: 12,
            });
        }
        Ok(Period { year, month })
    }

    /// The period for a given instant, in the supplied display timezone.
    pub fn containing<Tz: TimeZone>(instant: DateTime<Utc>, tz: &Tz) -> Self {
        let local = instant.with_timezone(tz).date_naive();
        Period {
            year: chrono::Datelike::year(&local),
            month: chrono::Datelike::month(&local),
        }
    }

    /// The following calendar month.
    pub fn next(&self) -> Self {
        if self.month == 12 {
            Period {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Period {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Half-open UTC range `[start, end)` covering this period in the given
    /// display timezone. Day and month boundaries must match the operator's
    /// wall clock, so the timezone is always an explicit parameter.
    pub fn utc_range<Tz: TimeZone>(&self, tz: &Tz) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            month_start_utc(self.year, self.month, tz),
            month_start_utc(self.next().year, self.next().month, tz),
        )
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// UTC instant of local midnight on the first day of a month.
fn month_start_utc<Tz: TimeZone>(year: i32, month: u32, tz: &Tz) -> DateTime<Utc> {
    // Validated periods always name a real first-of-month.
    let date = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN);
    let mut local = date.and_time(NaiveTime::MIN);

    // A DST jump can skip local midnight entirely; probe forward.
    for _ in 0..3 {
        match tz.from_local_datetime(&local) {
            LocalResult::Single(dt) => return dt.with_timezone(&Utc),
            LocalResult::Ambiguous(dt, _) => return dt.with_timezone(&Utc),
            LocalResult::None => local += Duration::hours(1),
        }
    }

    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Asia::Jakarta;

    fn demo_product() -> Product {
        Product::new("franchise-1", "KPI-001", "Kopi Susu Literan", 18_000, 30_000)
    }

    #[test]
    fn test_sale_snapshot_totals() {
        let product = demo_product();
        let sale = SaleRecord::from_product(&product, 4, Discount::None, Utc::now());

        assert_eq!(sale.franchise_id, "franchise-1");
        assert_eq!(sale.product_id.as_deref(), Some(product.id.as_str()));
        assert_eq!(sale.product_code, "KPI-001");
        assert_eq!(sale.total_sales, 120_000);
        assert_eq!(sale.total_hpp, 72_000);
    }

    #[test]
    fn test_discount_round_trip() {
        let product = demo_product();

        let pct = SaleRecord::from_product(
            &product,
            1,
            Discount::Percentage(Rate::from_bps(1_000)),
            Utc::now(),
        );
        assert_eq!(pct.discount_type, DiscountType::Percentage);
        assert_eq!(pct.discount(), Discount::Percentage(Rate::from_bps(1_000)));

        let fixed =
            SaleRecord::from_product(&product, 1, Discount::Fixed(Money::new(5_000)), Utc::now());
        assert_eq!(fixed.discount_value, 5_000);
        assert_eq!(fixed.discount(), Discount::Fixed(Money::new(5_000)));
    }

    #[test]
    fn test_default_settings() {
        let settings = AdminSettings::default_for("franchise-1");
        assert_eq!(settings.admin_fee_bps, 500);
        assert_eq!(settings.fixed_deduction, 1_000);
        assert_eq!(settings.fee_rate(), Rate::from_bps(500));
    }

    #[test]
    fn test_inactive_franchise_gate() {
        let mut franchise = Franchise::new("Cabang Bandung", "user-1", 1_000);
        assert!(franchise.ensure_active().is_ok());

        franchise.is_active = false;
        assert!(franchise.ensure_active().is_err());
    }

    #[test]
    fn test_period_validation() {
        assert!(Period::new(2026, 1).is_ok());
        assert!(Period::new(2026, 12).is_ok());
        assert!(Period::new(2026, 0).is_err());
        assert!(Period::new(2026, 13).is_err());
    }

    #[test]
    fn test_period_next_rolls_over() {
        let dec = Period { year: 2025, month: 12 };
        assert_eq!(dec.next(), Period { year: 2026, month: 1 });
    }

    #[test]
    fn test_period_display() {
        assert_eq!(Period { year: 2026, month: 8 }.to_string(), "2026-08");
    }

    #[test]
    fn test_period_utc_range_jakarta() {
        // Jakarta is UTC+7, so the local month starts at 17:00 UTC the day before.
        let (start, end) = Period { year: 2026, month: 8 }.utc_range(&Jakarta);
        assert_eq!(start.to_rfc3339(), "2026-07-31T17:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2026-08-31T17:00:00+00:00");
    }

    #[test]
    fn test_period_containing() {
        // 2026-08-01 02:00 Jakarta is still 2026-07-31 in UTC.
        let instant = Utc
            .with_ymd_and_hms(2026, 7, 31, 19, 0, 0)
            .single()
            .expect("valid instant");
        assert_eq!(
            Period::containing(instant, &Jakarta),
            Period { year: 2026, month: 8 }
        );
        assert_eq!(
            Period::containing(instant, &Utc),
            Period { year: 2026, month: 7 }
        );
    }
}
