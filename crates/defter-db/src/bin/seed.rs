//! # Seed Data Generator
//!
//! Populates the database with suppliers, products and customers for
//! development.
//!
//! ## Usage
//! ```bash
//! # Seed ./defter.db
//! cargo run -p defter-db --bin seed
//!
//! # Specify database path
//! cargo run -p defter-db --bin seed -- --db ./data/defter.db
//! ```
//!
//! ## Generated Data
//! - One supplier per category, coded `SUP-001`, `SUP-002`, ...
//! - Products under each supplier, SKUs `SUP-001-001`, ...
//! - A handful of customers without debt
//!
//! Values are derived from the row index so every run produces the same
//! catalogue.

use std::env;

use defter_core::{Currency, NewCustomer, NewProduct, NewSupplier};
use defter_db::{Database, DbConfig};

/// Suppliers and the products they deliver.
const CATALOGUE: &[(&str, &str, &[&str])] = &[
    (
        "Anadolu Gıda",
        "Gıda",
        &[
            "Çay 1kg",
            "Toz Şeker 5kg",
            "Ayçiçek Yağı 5L",
            "Pirinç 2.5kg",
            "Makarna 500g",
            "Kırmızı Mercimek 1kg",
            "Un 5kg",
            "Domates Salçası 830g",
        ],
    ),
    (
        "Ege Temizlik",
        "Temizlik",
        &[
            "Bulaşık Deterjanı 1.5L",
            "Çamaşır Suyu 4L",
            "Yüzey Temizleyici 1L",
            "Sıvı Sabun 1.5L",
            "Kağıt Havlu 12'li",
        ],
    ),
    (
        "Marmara Kırtasiye",
        "Kırtasiye",
        &[
            "A4 Fotokopi Kağıdı",
            "Tükenmez Kalem 50'li",
            "Zımba Teli",
            "Dosya Klasörü",
            "Koli Bandı",
        ],
    ),
];

/// Products priced in USD (imported goods).
const USD_EVERY: usize = 4;

const CUSTOMERS: &[(&str, &str, &str)] = &[
    ("Ayşe Yılmaz", "ayse@example.com", "0532 000 00 01"),
    ("Mehmet Demir", "mehmet@example.com", "0532 000 00 02"),
    ("Yıldız Market", "siparis@yildizmarket.example.com", "0212 000 00 03"),
    ("Kaya İnşaat", "muhasebe@kaya.example.com", "0216 000 00 04"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = env::var("DATABASE_PATH").unwrap_or_else(|_| String::from("./defter.db"));

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
                println!("Defter Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: $DATABASE_PATH or ./defter.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Defter Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await? + db.suppliers().count().await?;
    if existing > 0 {
        println!("⚠ Database already has data");
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating catalogue...");

    let start = std::time::Instant::now();
    let mut products = 0;

    for (supplier_idx, (supplier_name, category, names)) in CATALOGUE.iter().enumerate() {
        let supplier = db
            .suppliers()
            .create(NewSupplier {
                name: supplier_name.to_string(),
                contact_person: Some("Satış Birimi".to_string()),
                phone: Some(format!("0850 000 00 {:02}", supplier_idx + 1)),
                tax_number: Some(format!("{:010}", 1_000_000_000 + supplier_idx * 7_919)),
                payment_terms: Some("30 gün".to_string()),
                ..Default::default()
            })
            .await?;

        println!("  {} {}", supplier.supplier_code, supplier.name);

        for (product_idx, name) in names.iter().enumerate() {
            let seed = supplier_idx * 100 + product_idx;
            let product = generate_product(name, category, &supplier.id, seed);

            match db.products().create(product).await {
                Ok(created) => {
                    products += 1;
                    println!("    {} {}", created.sku, created.name);
                }
                Err(e) => eprintln!("Failed to insert {}: {}", name, e),
            }
        }
    }

    println!();
    println!("Generating customers...");

    for (name, email, phone) in CUSTOMERS {
        let customer = db
            .customers()
            .create(NewCustomer {
                name: name.to_string(),
                email: Some(email.to_string()),
                phone: Some(phone.to_string()),
                ..Default::default()
            })
            .await?;
        println!("  {}", customer.name);
    }

    println!();
    println!(
        "✓ Generated {} suppliers, {} products, {} customers in {:?}",
        CATALOGUE.len(),
        products,
        CUSTOMERS.len(),
        start.elapsed()
    );

    let low = db.products().low_stock().await?;
    println!("  Low stock: {} products", low.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds a product with deterministic price, cost and stock.
fn generate_product(name: &str, category: &str, supplier_id: &str, seed: usize) -> NewProduct {
    // Price: 19.90 - 499.90
    let price_cents = 1_990 + ((seed * 3_701) % 48_000) as i64;

    // Cost: 60-80% of price
    let cost_pct = 60 + (seed % 20) as i64;
    let cost_cents = price_cents * cost_pct / 100;

    // Stock: 0 - 40, some below the minimum
    let quantity = ((seed * 13) % 41) as i64;

    let currency = if seed % USD_EVERY == USD_EVERY - 1 {
        Currency::Usd
    } else {
        Currency::Try
    };

    NewProduct {
        name: name.to_string(),
        category: Some(category.to_string()),
        barcode: Some(format!("869{:010}", seed)),
        price_cents,
        cost_cents: Some(cost_cents),
        currency: Some(currency),
        supplier_id: Some(supplier_id.to_string()),
        quantity: Some(quantity),
        ..Default::default()
    }
}
