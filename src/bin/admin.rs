//! CLI administration tool for the allocation service.
//!
//! Sends the same events as the HTTP API through the same message bus, and
//! offers a few database diagnostics.
//!
//! # Usage
//!
//! ```bash
//! # Register a batch (eta optional, ISO date)
//! cargo run --bin admin -- add-batch batch-001 SMALL-TABLE 20 --eta 2011-01-02
//!
//! # Allocate an order line
//! cargo run --bin admin -- allocate order-1 SMALL-TABLE 3
//!
//! # Correct a batch's purchased quantity
//! cargo run --bin admin -- change-quantity batch-001 5
//!
//! # Show a product's batches and allocations
//! cargo run --bin admin -- show SMALL-TABLE
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! Same as the server (see `allocation::config`). Without a database the
//! commands run against an in-memory store that is discarded on exit.

use allocation::application::HandlerOutput;
use allocation::config::{self, Config};
use allocation::domain::events::Event;
use allocation::domain::repositories::ProductRepository;
use allocation::server;
use allocation::state::AppState;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use colored::*;

/// CLI tool for managing stock allocation.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level commands.
#[derive(Subcommand)]
enum Commands {
    /// Register a batch of stock
    AddBatch {
        /// Batch reference
        reference: String,
        sku: String,
        qty: i64,
        /// Estimated arrival (YYYY-MM-DD); omit for warehouse stock
        #[arg(long)]
        eta: Option<NaiveDate>,
    },

    /// Allocate an order line
    Allocate {
        order_id: String,
        sku: String,
        qty: i64,
    },

    /// Correct a batch's purchased quantity
    ChangeQuantity {
        /// Batch reference
        reference: String,
        qty: i64,
    },

    /// Show a product's batches and allocations
    Show { sku: String },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection and apply migrations
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = config::load_from_env().context("Invalid configuration")?;

    let command = match cli.command {
        Commands::Db { action } => return handle_db_action(action, &config).await,
        command => command,
    };

    if !config.is_database_enabled() {
        println!(
            "{}",
            "⚠️  No database configured, changes will not be persisted".yellow()
        );
        println!();
    }

    let state = server::build_state(&config).await?;

    match command {
        Commands::AddBatch {
            reference,
            sku,
            qty,
            eta,
        } => {
            dispatch(&state, Event::batch_created(&reference, &sku, qty, eta)).await?;
            println!("{}", "✅ Batch added".green().bold());
            println!("  Reference: {}", reference.cyan());
            println!("  SKU:       {}", sku.cyan());
            println!("  Quantity:  {}", qty.to_string().bright_white());
            match eta {
                Some(eta) => println!("  ETA:       {}", eta.to_string().bright_white()),
                None => println!("  ETA:       {}", "in stock".bright_black()),
            }
        }
        Commands::Allocate { order_id, sku, qty } => {
            let outputs = dispatch(&state, Event::allocation_required(&order_id, &sku, qty)).await?;
            print_allocation(outputs);
        }
        Commands::ChangeQuantity { reference, qty } => {
            let outputs = dispatch(&state, Event::batch_quantity_changed(&reference, qty)).await?;
            println!("{}", "✅ Batch quantity changed".green().bold());
            println!("  Reference: {}", reference.cyan());
            println!("  Quantity:  {}", qty.to_string().bright_white());
            if !outputs.is_empty() {
                println!();
                println!("{}", "Reallocated lines:".bright_white().bold());
                print_allocation(outputs);
            }
        }
        Commands::Show { sku } => show_product(&state, &sku).await?,
        Commands::Db { .. } => {}
    }

    println!();
    Ok(())
}

async fn dispatch(state: &AppState, event: Event) -> Result<Vec<HandlerOutput>> {
    let outputs = state.bus.handle(event, &state.unit_of_work()).await?;
    Ok(outputs)
}

fn print_allocation(outputs: Vec<HandlerOutput>) {
    for output in outputs {
        match output {
            HandlerOutput::Allocated {
                order_id,
                batch_ref,
            } => println!(
                "  {} {} → {}",
                "✔".green(),
                order_id.cyan(),
                batch_ref.bright_white().bold()
            ),
            HandlerOutput::OutOfStock { order_id, sku } => println!(
                "  {} {} → {}",
                "✘".red(),
                order_id.cyan(),
                format!("out of stock for {sku}").red()
            ),
        }
    }
}

/// Prints every batch of a product with its allocations.
async fn show_product(state: &AppState, sku: &str) -> Result<()> {
    let Some(product) = state.repository.find_by_sku(sku).await? else {
        println!("{}", format!("❌ Unknown sku {sku}").red());
        return Ok(());
    };

    println!("{}", format!("📦 {}", product.sku).bright_blue().bold());
    println!("  Version: {}", product.version().to_string().bright_black());
    println!();

    println!(
        "  {:<20} {:<12} {:>10} {:>10}",
        "Batch".bright_white().bold(),
        "ETA".bright_white().bold(),
        "Purchased".bright_white().bold(),
        "Available".bright_white().bold()
    );
    println!("  {}", "─".repeat(55).bright_black());

    for batch in product.batches() {
        let eta = batch
            .eta
            .map(|d| d.to_string())
            .unwrap_or_else(|| "in stock".to_string());
        println!(
            "  {:<20} {:<12} {:>10} {:>10}",
            batch.reference.cyan(),
            eta,
            batch.purchased_quantity(),
            batch.available_quantity()
        );
        for line in batch.allocations() {
            println!(
                "    {} {} x{}",
                "↳".bright_black(),
                line.order_id,
                line.qty
            );
        }
    }

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, config: &Config) -> Result<()> {
    match action {
        DbAction::Check => {
            let Some(ref url) = config.database_url else {
                println!("{}", "⚠️  No database configured".yellow());
                return Ok(());
            };

            println!("{}", "🔍 Checking database connection...".bright_blue());
            println!("  {}", config::mask_connection_string(url).bright_black());

            let pool = server::connect_database(config, url).await?;
            sqlx::query("SELECT 1").execute(&pool).await?;

            println!("{}", "✅ Database connection OK, migrations applied".green().bold());
        }
    }

    Ok(())
}
