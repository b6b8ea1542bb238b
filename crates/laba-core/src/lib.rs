//! # laba-core: Pure Business Logic for Laba
//!
//! This crate is the **heart** of Laba, a multi-tenant bookkeeping system for
//! franchise operators selling on marketplaces. It contains all business
//! logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Laba Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   Dashboard Frontend                            │   │
//! │  │    Sales forms ──► Report screens ──► Owner overview            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                ★ laba-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  engine   │  │  report   │  │   │
//! │  │   │SaleRecord │  │   Money   │  │ derive_   │  │ grouping  │  │   │
//! │  │   │ Franchise │  │   Rate    │  │   sale    │  │ ranking   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    laba-db (Database Layer)                     │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (SaleRecord, Product, Franchise, etc.)
//! - [`money`] - Money and Rate types with integer arithmetic (no floats!)
//! - [`engine`] - The derived-figure pipeline and the profit formulas
//! - [`report`] - Period grouping, percent change, product ranking
//! - [`error`] - Domain error types
//! - [`validation`] - Input-boundary validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are whole rupiah (i64), rates are
//!    basis points (u32) - no floating point in any stored or derived amount
//! 4. **Derive At Read Time**: Derived monetary figures are never persisted.
//!    Changing admin settings instantly re-values every historical sale
//!    because reports recompute through [`engine`] on every pass.
//!
//! ## Example Usage
//!
//! ```rust
//! use laba_core::engine::derive_figures;
//! use laba_core::money::{Money, Rate};
//! use laba_core::types::{AdminSettings, Discount};
//!
//! let settings = AdminSettings::default_for("franchise-1");
//!
//! // Rp500.000 sale, Rp300.000 cost, no discount, 5% fee + Rp1.000 deduction
//! let derived = derive_figures(
//!     Money::new(500_000),
//!     Money::new(300_000),
//!     Discount::None,
//!     &settings,
//! );
//!
//! assert_eq!(derived.admin_fee, Money::new(26_000));
//! assert_eq!(derived.net_profit, Money::new(174_000));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod engine;
pub mod error;
pub mod money;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use laba_core::Money` instead of
// `use laba_core::money::Money`

pub use engine::{derive_figures, derive_sale, real_profit, revenue_share, DerivedSale};
pub use error::{CoreError, ValidationError};
pub use money::{Money, Rate};
pub use report::PeriodTotals;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default marketplace admin fee for a newly created franchise: 5%.
pub const DEFAULT_ADMIN_FEE_BPS: u32 = 500;

/// Default fixed per-transaction deduction for a new franchise: Rp1.000.
pub const DEFAULT_FIXED_DEDUCTION: i64 = 1_000;

/// Maximum quantity accepted for a single sale record.
///
/// ## Business Reason
/// Prevents accidental over-entry (e.g., typing 10000 instead of 10) on the
/// sale form. Marketplace orders above this are split by the operator.
pub const MAX_SALE_QUANTITY: i64 = 9_999;
