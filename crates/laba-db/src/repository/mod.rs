//! # Repository Module
//!
//! Database repository implementations for Laba.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  Application code                                                      │
//! │       │                                                                 │
//! │       │  db.sales().list_between("franchise-1", from, to)              │
//! │       ▼                                                                 │
//! │  SaleRepository                                                        │
//! │  ├── insert(&self, sale)                                               │
//! │  ├── list_between(&self, franchise_id, from, to)                       │
//! │  └── ...                                                                │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • SQL is isolated in one place                                        │
//! │  • Writes publish change signals in one place                          │
//! │  • Tenant scoping is impossible to forget (see below)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Tenant Scoping
//! Every method that touches tenant data takes the franchise id as an
//! explicit, mandatory parameter (or reads it off the record being written).
//! There is no ambient "current franchise" anywhere in this crate; a query
//! that forgets the scope does not compile.
//!
//! ## Available Repositories
//!
//! - [`franchise::FranchiseRepository`] - Tenant management
//! - [`product::ProductRepository`] - Catalog CRUD
//! - [`sale::SaleRepository`] - Sale record CRUD and period queries
//! - [`settings::SettingsRepository`] - Marketplace fee settings
//! - [`expenditure::ExpenditureRepository`] - Operating costs
//! - [`profit_sharing::ProfitSharingRepository`] - Revenue-share snapshots

pub mod expenditure;
pub mod franchise;
pub mod product;
pub mod profit_sharing;
pub mod sale;
pub mod settings;
