//! # Seed Catalog Generator
//!
//! Populates the database with a sample promotion catalog for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default workspace in ./tally_dev.db
//! cargo run -p tally-db --bin seed
//!
//! # Specify database path and workspace
//! cargo run -p tally-db --bin seed -- --db ./data/tally.db --workspace store-42
//! ```
//!
//! ## Generated Promotions
//! One of each campaign kind, so every discount strategy can be exercised
//! from the CLI:
//! - Bundle: cola buy 2 get 1 free
//! - Percent: 10% off everything over $50
//! - Fixed amount: 50¢ off each bag of chips
//! - Timed percent: 15% off bakery, weekday lunchtime
//! - Capped percent: 5% off, first 100 uses, inactive until switched on

use clap::Parser;
use tally_core::promotions::{
    BundleRules, FixedAmountRules, PercentRules, PromotionConditions, TimeOfDayRange,
};
use tally_core::{Promotion, PromotionRules, DEFAULT_WORKSPACE_ID};
use tally_db::migrations::migration_status;
use tally_db::{Database, DbConfig};

#[derive(Debug, Parser)]
#[command(name = "seed", about = "Tally POS sample promotion catalog", long_about = None)]
struct Args {
    /// Database file path
    #[arg(short, long, default_value = "./tally_dev.db")]
    db: String,

    /// Workspace (store) to seed
    #[arg(short, long, default_value = DEFAULT_WORKSPACE_ID)]
    workspace: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    println!("🌱 Tally POS Seed Catalog");
    println!("=========================");
    println!("Database:  {}", args.db);
    println!("Workspace: {}", args.workspace);
    println!();

    let db = Database::new(DbConfig::new(&args.db)).await?;
    let (total, applied) = migration_status(db.pool()).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied ({}/{})", applied, total);

    let repo = db.promotions();
    let existing = repo.count(&args.workspace).await?;
    if existing > 0 {
        println!("⚠ Workspace already has {} promotions", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Inserting promotions...");

    let mut inserted = 0;
    for promotion in sample_catalog() {
        let id = match repo.insert(&args.workspace, &promotion).await {
            Ok(id) => id,
            Err(e) => {
                eprintln!("Failed to insert {}: {}", promotion.name, e);
                continue;
            }
        };
        println!("  {:<14} {:<13} {}", id, promotion.kind(), promotion.name);
        inserted += 1;
    }

    let listed = repo.list_promotions(&args.workspace).await?;

    println!();
    println!("✓ Inserted {} promotions ({} readable)", inserted, listed.len());
    println!("✓ Seed complete!");

    Ok(())
}

/// One promotion per campaign kind.
fn sample_catalog() -> Vec<Promotion> {
    vec![
        Promotion::new(
            "b2g1-cola",
            "Cola: buy 2 get 1 free",
            PromotionRules::Bundle(BundleRules::new(2, 1, 100.0)),
        )
        .with_targets(["BEV-COC-330", "BEV-COC-500"])
        .with_priority(10),
        Promotion::new(
            "ten-over-50",
            "10% off orders over $50",
            PromotionRules::Percent(PercentRules {
                discount_percent: 10.0,
            }),
        )
        .with_min_purchase(50.0)
        .with_priority(1),
        Promotion::new(
            "chips-50c",
            "50¢ off chips",
            PromotionRules::FixedAmount(FixedAmountRules {
                amount_per_unit: 0.5,
            }),
        )
        .with_targets(["SNK-LAY-001", "SNK-DOR-002", "SNK-PRI-004"])
        .with_priority(5),
        Promotion::new(
            "lunch-bakery",
            "Weekday lunch: 15% off bakery",
            PromotionRules::TimedPercent(PercentRules {
                discount_percent: 15.0,
            }),
        )
        .with_targets(["BAK-CRO-001", "BAK-BAG-002"])
        .with_conditions(PromotionConditions {
            days_of_week: Some([1, 2, 3, 4, 5].into_iter().collect()),
            time_of_day_range: Some(TimeOfDayRange::new(11 * 60, 14 * 60)),
        })
        .with_priority(5),
        Promotion::new(
            "launch-5",
            "Launch week: 5% off",
            PromotionRules::Percent(PercentRules {
                discount_percent: 5.0,
            }),
        )
        .with_usage(100, 0)
        .with_active(false),
    ]
}
