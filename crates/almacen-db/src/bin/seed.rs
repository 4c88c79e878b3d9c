//! # Seed Data Generator
//!
//! Populates the database with a demo catalogue for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default database
//! cargo run -p almacen-db --bin seed
//!
//! # Specify database path
//! cargo run -p almacen-db --bin seed -- --db ./data/almacen.db
//! ```
//!
//! Every product starts at zero and receives its opening stock through an
//! `ENTRADA` movement, so the movement log adds up from day one.

use std::env;

use almacen_core::{Money, MovementKind, MovementRequest, NewProduct};
use almacen_db::{Database, DbConfig, StockAdjuster};

/// (name, price in cents, opening stock, minimum)
const CATALOGUE: &[(&str, i64, i64, i64)] = &[
    ("Yerba mate 1kg", 4_250, 40, 10),
    ("Azúcar 1kg", 1_390, 60, 15),
    ("Harina 000 1kg", 990, 50, 15),
    ("Arroz largo fino 1kg", 1_650, 45, 10),
    ("Fideos spaghetti 500g", 1_100, 80, 20),
    ("Aceite de girasol 1.5L", 3_980, 24, 6),
    ("Leche entera 1L", 1_250, 36, 12),
    ("Café molido 250g", 5_400, 18, 5),
    ("Galletitas de agua", 870, 70, 20),
    ("Dulce de leche 400g", 2_300, 20, 5),
    ("Lavandina 1L", 960, 30, 8),
    ("Jabón en polvo 800g", 3_150, 15, 5),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./data/almacen.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Almacén POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./data/almacen.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Almacén POS Seed Data Generator");
    println!("==================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let adjuster = StockAdjuster::new(db.ledger()).with_observer(None);
    let start = std::time::Instant::now();

    for &(name, price_cents, opening, minimum) in CATALOGUE {
        let product = db
            .products()
            .create(NewProduct {
                code: None,
                name: name.to_string(),
                description: None,
                price: Money::from_cents(price_cents),
                stock_on_hand: 0,
                stock_minimum: minimum,
            })
            .await?;

        adjuster
            .apply_movement(MovementRequest {
                product_id: product.id,
                kind: MovementKind::Entrada,
                quantity: opening,
                note: Some("Stock inicial".to_string()),
            })
            .await?;

        println!("  {} {:<28} {:>8}  stock {}", product.code, name, product.price(), opening);
    }

    println!();
    println!(
        "✓ Seeded {} products in {:?}",
        CATALOGUE.len(),
        start.elapsed()
    );

    db.close().await;
    Ok(())
}
