//! # Seed Data Generator
//!
//! Loads the development catalog from [`stockroom_db::seed`] into a
//! database file. Opening stock goes through the movement ledger.
//!
//! ## Usage
//! ```bash
//! # Whole catalog into ./stockroom_dev.db
//! cargo run -p stockroom-db --bin seed
//!
//! # First 12 products only
//! cargo run -p stockroom-db --bin seed -- --limit 12
//!
//! # Specify database path
//! cargo run -p stockroom-db --bin seed -- --db ./data/stockroom.db
//! ```

use std::env;
use stockroom_core::Actor;
use stockroom_db::seed::seed_catalog;
use stockroom_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut limit = usize::MAX;
    let mut db_path = String::from("./stockroom_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--limit" | "-l" if i + 1 < args.len() => {
                limit = args[i + 1].parse()?;
                i += 1;
            }
            "--db" | "-d" if i + 1 < args.len() => {
                db_path = args[i + 1].clone();
                i += 1;
            }
            "--help" | "-h" => {
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -l, --limit <N>    Load at most N catalog products");
                println!("  -d, --db <PATH>    Database file path (default: ./stockroom_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => return Err(format!("unexpected argument `{other}`").into()),
        }
        i += 1;
    }

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let report = seed_catalog(&db, &Actor::new("seed")?, limit).await?;
    db.close().await;

    println!("Database:       {db_path}");
    println!("Products added: {}", report.products_added);
    println!("Already there:  {}", report.products_skipped);
    println!("Customers:      {}", report.customers_added);
    println!("Movements:      {}", report.movements);
    println!("Discrepancies:  {}", report.discrepancies);

    Ok(())
}
