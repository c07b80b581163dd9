//! # Seed Data Generator
//!
//! Populates the database with a demo catalog for development.
//!
//! ## Usage
//! ```bash
//! # Catalog only
//! cargo run -p inventa-db --bin seed
//!
//! # Catalog plus 25 demo sales
//! cargo run -p inventa-db --bin seed -- --sales 25
//!
//! # Specify database path
//! cargo run -p inventa-db --bin seed -- --db ./data/inventa.db
//! ```
//!
//! Sales go through the ledger, so stock is decremented exactly as it would
//! be for a real sale.

use std::env;

use inventa_core::{NewCategory, NewProduct, NewSale, NewSaleLine, NewSupplier, PaymentMethod};
use inventa_db::logging::init_tracing;
use inventa_db::{Database, DbConfig};

/// Demo catalog: category, then (product, sale price in cents, stock).
const CATALOG: &[(&str, &[(&str, i64, i64)])] = &[
    (
        "Beverages",
        &[
            ("Agua Pura 600ml", 500, 120),
            ("Coca-Cola 355ml", 800, 96),
            ("Jugo de Naranja 1L", 1800, 24),
            ("Cafe Molido 400g", 4500, 12),
        ],
    ),
    (
        "Snacks",
        &[
            ("Papalinas Clasicas", 600, 60),
            ("Galletas Maria", 900, 40),
            ("Mani Salado", 700, 3),
        ],
    ),
    (
        "Cleaning",
        &[
            ("Detergente 1kg", 2200, 30),
            ("Cloro 1L", 1200, 18),
            ("Jabon de Trastos", 1500, 4),
        ],
    ),
    (
        "Grocery",
        &[
            ("Arroz 1lb", 650, 80),
            ("Frijol Negro 1lb", 900, 70),
            ("Azucar 2lb", 1400, 50),
            ("Aceite 900ml", 2600, 20),
        ],
    ),
];

const SUPPLIERS: &[(&str, &str, &str)] = &[
    ("Distribuidora Central", "Ana Lopez", "ventas@central.example"),
    ("Abarrotes del Norte", "Luis Perez", "pedidos@norte.example"),
];

const SEED_USER: &str = "seed";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut sales: usize = 0;
    let mut db_path = String::from("./inventa_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--sales" | "-s" => {
                if i + 1 < args.len() {
                    sales = args[i + 1].parse().unwrap_or(0);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Inventa Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -s, --sales <N>    Demo sales to record (default: 0)");
                println!("  -d, --db <PATH>    Database file path (default: ./inventa_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Inventa Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!("Sales:    {}", sales);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count_active().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Creating catalog...");

    let mut supplier_ids = Vec::new();
    for (name, contact, email) in SUPPLIERS {
        let supplier = db
            .suppliers()
            .create(NewSupplier {
                name: name.to_string(),
                contact: Some(contact.to_string()),
                email: Some(email.to_string()),
                created_by: Some(SEED_USER.to_string()),
                ..Default::default()
            })
            .await?;
        supplier_ids.push(supplier.id);
    }

    let mut product_ids = Vec::new();
    for (idx, (category_name, items)) in CATALOG.iter().enumerate() {
        let category = db
            .categories()
            .create(NewCategory {
                name: category_name.to_string(),
                created_by: Some(SEED_USER.to_string()),
                ..Default::default()
            })
            .await?;

        for (name, price_cents, stock) in items.iter() {
            let input = NewProduct {
                name: name.to_string(),
                // Cost at 70% of the sale price.
                purchase_price_cents: price_cents * 70 / 100,
                sale_price_cents: *price_cents,
                stock: *stock,
                category_id: category.id.clone(),
                supplier_id: supplier_ids.get(idx % supplier_ids.len().max(1)).cloned(),
                created_by: Some(SEED_USER.to_string()),
                ..Default::default()
            };

            match db.products().create(input).await {
                Ok(product) => product_ids.push(product.id),
                Err(e) => eprintln!("Failed to insert {}: {}", name, e),
            }
        }
    }

    println!(
        "✓ Created {} categories, {} suppliers, {} products",
        CATALOG.len(),
        supplier_ids.len(),
        product_ids.len()
    );

    if sales > 0 && !product_ids.is_empty() {
        println!();
        println!("Recording demo sales...");

        let mut recorded = 0;
        for n in 0..sales {
            let first = &product_ids[n % product_ids.len()];
            let second = &product_ids[(n * 7 + 3) % product_ids.len()];

            let mut lines = vec![NewSaleLine::new(first.clone(), 1 + (n % 3) as i64)];
            if second != first {
                lines.push(NewSaleLine::new(second.clone(), 1));
            }

            let mut input = NewSale::new(SEED_USER, lines);
            input.payment_method = PaymentMethod::ALL[n % PaymentMethod::ALL.len()];

            match db.ledger().create_sale(input).await {
                Ok(_) => recorded += 1,
                Err(e) => eprintln!("  Sale {} skipped: {}", n + 1, e.user_message()),
            }
        }

        println!("✓ Recorded {} of {} sales", recorded, sales);
    }

    let low_stock = db.products().count_low_stock().await?;
    println!();
    println!("  Low stock products: {}", low_stock);
    println!();
    println!("✓ Seed complete!");

    Ok(())
}
