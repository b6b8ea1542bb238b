//! # Seed Data Generator
//!
//! Populates a database with demo bookkeeping data for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./laba.db (or $LABA_DB) with the demo franchise
//! cargo run -p laba-db --bin seed
//!
//! # Specify database path and sales volume
//! cargo run -p laba-db --bin seed -- --db ./data/laba.db --sales 120
//! ```
//!
//! ## Generated Data
//! - One active franchise ("Cabang Bandung", 10% revenue share) with the
//!   default admin settings
//! - A small warung-style catalog
//! - Back-dated sales spread over the current and previous month, with a
//!   mix of no/percentage/fixed discounts
//! - A handful of expenditures
//! - Recomputed revenue-share snapshots and a logged monthly report

use chrono::{TimeZone, Utc};
use chrono_tz::Asia::Jakarta;
use std::env;
use tracing::{error, info};

use laba_core::{Discount, Expenditure, Money, Period, Product, Rate, SaleRecord};
use laba_db::{provisioning, reports, Database, DbConfig};

/// Demo catalog: (code, name, hpp, price).
const CATALOG: &[(&str, &str, i64, i64)] = &[
    ("KPI-001", "Kopi Susu Literan", 18_000, 30_000),
    ("KPI-002", "Kopi Hitam Literan", 12_000, 22_000),
    ("TEH-001", "Teh Botol 450ml", 2_500, 4_500),
    ("RTI-001", "Roti Bakar Coklat", 7_000, 15_000),
    ("PKT-001", "Paket Reseller 10pcs", 150_000, 250_000),
];

/// Expenditure descriptions cycled through the demo data.
const COSTS: &[(&str, i64)] = &[
    ("Sewa etalase", 150_000),
    ("Plastik kemasan", 45_000),
    ("Ongkir retur", 28_000),
    ("Listrik kios", 95_000),
];

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run().await {
        error!(error = %err, "Seeding failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (db_path, sales_per_month) = parse_args();

    info!(db = %db_path, sales_per_month, "Seeding demo data");

    let db = Database::new(DbConfig::new(&db_path)).await?;

    let franchise = provisioning::create_franchise(&db, "Cabang Bandung", "demo-user", 1_000).await?;

    let mut products = Vec::new();
    for (code, name, hpp, price) in CATALOG {
        let product = Product::new(&franchise.id, *code, *name, *hpp, *price);
        db.products().insert(&product).await?;
        products.push(product);
    }
    info!(count = products.len(), "Catalog seeded");

    let this_month = Period::containing(Utc::now(), &Jakarta);
    let last_month = previous(this_month);

    for period in [last_month, this_month] {
        seed_month(&db, &products, period, sales_per_month).await?;
    }

    for (i, (description, amount)) in COSTS.iter().enumerate() {
        let day = (i as u32 * 7 % 28) + 1;
        let date = business_date(last_month, day, 8);
        db.expenditures()
            .insert(&Expenditure::new(&franchise.id, *amount, *description, date))
            .await?;
    }

    let report = reports::monthly_report(&db, &franchise, last_month, &Jakarta).await?;
    info!(
        period = %report.period,
        gross = %report.totals.total_sales,
        net_profit = %report.totals.net_profit,
        expenditures = %report.expenditure_total,
        revenue_share = %report.revenue_share,
        real_profit = %report.real_profit,
        "Demo report for last month"
    );

    db.close().await;
    Ok(())
}

/// Inserts one month of back-dated sales with a deterministic discount mix.
async fn seed_month(
    db: &Database,
    products: &[Product],
    period: Period,
    count: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    for i in 0..count {
        let product = &products[i as usize % products.len()];
        let quantity = (i as i64 % 4) + 1;

        // Every third sale gets a percentage discount, every fifth a fixed one.
        let discount = if i % 3 == 0 {
            Discount::Percentage(Rate::from_bps(500 + (i % 3) as u32 * 500))
        } else if i % 5 == 0 {
            Discount::Fixed(Money::new(2_000))
        } else {
            Discount::None
        };

        let day = (i % 28) + 1;
        let date = business_date(period, day, 9 + i % 10);

        let sale = SaleRecord::from_product(product, quantity, discount, date);
        db.sales().insert(&sale).await?;
    }

    info!(period = %period, count, "Sales seeded");
    Ok(())
}

/// A Jakarta wall-clock instant inside the period, as UTC.
fn business_date(period: Period, day: u32, hour: u32) -> chrono::DateTime<Utc> {
    Jakarta
        .with_ymd_and_hms(period.year, period.month, day, hour, 0, 0)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now)
}

fn previous(period: Period) -> Period {
    if period.month == 1 {
        Period {
            year: period.year - 1,
            month: 12,
        }
    } else {
        Period {
            year: period.year,
            month: period.month - 1,
        }
    }
}

/// Parses `--db <path>` and `--sales <count>`; falls back to $LABA_DB and
/// sensible defaults.
fn parse_args() -> (String, u32) {
    let mut db_path = env::var("LABA_DB").unwrap_or_else(|_| "./laba.db".to_string());
    let mut sales = 60u32;

    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" if i + 1 < args.len() => {
                db_path = args[i + 1].clone();
                i += 2;
            }
            "--sales" if i + 1 < args.len() => {
                sales = args[i + 1].parse().unwrap_or(60);
                i += 2;
            }
            _ => i += 1,
        }
    }

    (db_path, sales)
}
