//! # tally-promo
//!
//! Runs the promotion engine against a cart file from the command line.
//!
//! ## Usage
//! ```bash
//! # Price a cart against the configured store's catalog (SQLite)
//! tally-promo apply --cart cart.json
//!
//! # Price a cart against a JSON catalog at a pinned instant
//! tally-promo --at 2026-03-02T12:00:00+05:00 apply --cart cart.json --catalog promos.json
//!
//! # What is running right now?
//! tally-promo active
//! ```
//!
//! Results are printed to stdout as JSON; logs go to stderr.

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use clap::{Args, Parser, Subcommand};
use tally_core::{Clock, FixedClock};
use tally_db::Database;
use tally_engine::cart::read_cart_file;
use tally_engine::telemetry::init_tracing;
use tally_engine::{EngineConfig, EngineResult, PromotionEngine, PromotionSource, StaticCatalog};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "tally-promo", about = "Tally POS promotion engine", long_about = None)]
struct Cli {
    /// Config file (default: promotions.toml in the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Evaluate at this RFC 3339 instant instead of the system clock
    #[arg(long, global = true, value_parser = parse_instant)]
    at: Option<DateTime<FixedOffset>>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Recompute a cart's discounts and print the cart with totals
    Apply(ApplyArgs),
    /// List promotions eligible now (minimum purchase not evaluated)
    Active(ActiveArgs),
}

#[derive(Debug, Args)]
struct ApplyArgs {
    /// Cart JSON file
    #[arg(long)]
    cart: PathBuf,

    /// JSON catalog file; the configured database is used when omitted
    #[arg(long)]
    catalog: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ActiveArgs {
    /// JSON catalog file; the configured database is used when omitted
    #[arg(long)]
    catalog: Option<PathBuf>,
}

impl Commands {
    fn catalog(&self) -> Option<&Path> {
        match self {
            Commands::Apply(args) => args.catalog.as_deref(),
            Commands::Active(args) => args.catalog.as_deref(),
        }
    }
}

fn parse_instant(s: &str) -> Result<DateTime<FixedOffset>, String> {
    DateTime::parse_from_rfc3339(s).map_err(|e| format!("expected an RFC 3339 timestamp: {e}"))
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(error) = run(cli).await {
        eprintln!("error: {error}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> EngineResult<()> {
    let config = EngineConfig::load(cli.config.as_deref())?;
    init_tracing(config.log_filter());

    let clock: Arc<dyn Clock> = match cli.at {
        Some(at) => Arc::new(FixedClock::new(at)),
        None => Arc::new(config.clock()?),
    };

    match cli.command.catalog() {
        Some(path) => {
            let catalog = StaticCatalog::from_json_file(path)?;
            info!(path = %path.display(), promotions = catalog.len(), "Using JSON catalog");
            execute(catalog, clock, &config, &cli.command).await
        }
        None => {
            let db = Database::new(config.db_config()?).await?;
            let result = execute(db.promotions(), clock, &config, &cli.command).await;
            db.close().await;
            result
        }
    }
}

async fn execute<S: PromotionSource>(
    source: S,
    clock: Arc<dyn Clock>,
    config: &EngineConfig,
    command: &Commands,
) -> EngineResult<()> {
    let engine = PromotionEngine::new(source, clock, config.workspace_id());

    let json = match command {
        Commands::Apply(args) => {
            let items = read_cart_file(&args.cart)?;
            let outcome = engine.try_apply_promotions(&items).await?;
            serde_json::to_string_pretty(&outcome)?
        }
        Commands::Active(_) => {
            let active = engine.get_active_promotions().await?;
            serde_json::to_string_pretty(&active)?
        }
    };

    println!("{json}");
    Ok(())
}
