//! # laba-db: Database Layer for Laba
//!
//! This crate provides database access for the Laba bookkeeping system.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Laba Data Flow                                 │
//! │                                                                         │
//! │  Application request (record sale, open report)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                      laba-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (sale.rs, …)  │    │  (embedded)  │  │   │
//! │  │   └───────┬───────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │           │                    │                               │   │
//! │  │   ┌───────▼───────┐    ┌───────▼───────┐                      │   │
//! │  │   │   ChangeHub   │    │   reports /   │ ← aggregates through │   │
//! │  │   │  (notify.rs)  │    │ provisioning  │   laba-core's engine │   │
//! │  │   └───────────────┘    └───────────────┘                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (WAL mode, foreign keys on)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (sale, product, etc.)
//! - [`notify`] - Table-change broadcast hub (re-fetch signals)
//! - [`provisioning`] - Atomic franchise onboarding
//! - [`reports`] - Monthly report assembly through the engine
//!
//! ## Usage
//!
//! ```rust,ignore
//! use laba_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/laba.db")).await?;
//!
//! // Record a sale (scoped to its franchise) and build the month's report
//! db.sales().insert(&sale).await?;
//! let report = laba_db::reports::monthly_report(&db, &franchise, period, &tz).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod notify;
pub mod pool;
pub mod provisioning;
pub mod reports;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::DbError;
pub use notify::{ChangeEvent, ChangeHub, ChangedTable, TableWatcher};
pub use pool::{Database, DbConfig};
pub use reports::MonthlyReport;

// Repository re-exports for convenience
pub use repository::expenditure::ExpenditureRepository;
pub use repository::franchise::FranchiseRepository;
pub use repository::product::ProductRepository;
pub use repository::profit_sharing::ProfitSharingRepository;
pub use repository::sale::SaleRepository;
pub use repository::settings::SettingsRepository;
