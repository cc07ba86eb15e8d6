//! # Seed Data Generator
//!
//! Populates the database with a demo organization for development:
//! a settlement policy plus a batch of products with starting stock.
//!
//! ## Usage
//! ```bash
//! # Seed the default database
//! cargo run -p tally-db --bin seed
//!
//! # Custom count / path
//! cargo run -p tally-db --bin seed -- --count 200 --db ./data/tally.db
//! ```

use chrono::Utc;
use std::env;
use tally_core::{
    DeliveryMethod, FreightChargeType, FreightMode, FreightPolicy, OrgPolicy, PaymentMethod,
    Product,
};
use tally_db::{Database, DbConfig};
use uuid::Uuid;

const DEMO_ORG: &str = "org-demo";

/// Product name stems for generated data.
const NAMES: &[&str] = &[
    "Espresso Blend 250g",
    "House Filter 500g",
    "Cold Brew Bottle",
    "Ceramic Mug",
    "Travel Tumbler",
    "Pour-over Kit",
    "Paper Filters 100ct",
    "Chocolate Bar 70%",
    "Granola Jar",
    "Gift Box Small",
    "Gift Box Large",
    "Tea Sampler",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 60;
    let mut db_path = String::from("./tally_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(60);
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
                println!("Tally Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 60)");
                println!("  -d, --db <PATH>    Database file path (default: ./tally_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Tally Seed Data Generator");
    println!("=========================");
    println!("Database: {db_path}");
    println!("Products: {count}");
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected, migrations applied");

    let existing = db.products().count(DEMO_ORG).await?;
    if existing > 0 {
        println!("⚠ Database already has {existing} products for {DEMO_ORG}");
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    // Settlement policy: charges 5.00/kg, free over 200.00, ships and
    // delivers locally, takes everything but bank transfer.
    let policy = OrgPolicy {
        organization_id: DEMO_ORG.to_string(),
        freight: FreightPolicy {
            mode: FreightMode::NegotiateFreight,
            charge_type: FreightChargeType::PerWeight,
            fixed_value_cents: Some(1_500),
            per_weight_value_cents: Some(500),
            free_shipping_threshold_cents: Some(20_000),
            free_shipping_enabled: true,
        },
        payment_methods: vec![
            PaymentMethod::Cash,
            PaymentMethod::Pix,
            PaymentMethod::CreditCard,
            PaymentMethod::DebitCard,
        ],
        delivery_methods: vec![
            DeliveryMethod::Pickup,
            DeliveryMethod::LocalDelivery,
            DeliveryMethod::Shipping,
        ],
    };
    db.policies().upsert(&policy).await?;
    println!("✓ Settlement policy written for {DEMO_ORG}");

    let mut generated = 0;
    for seed in 0..count {
        let product = generate_product(seed);
        if let Err(e) = db.products().insert(&product).await {
            eprintln!("Failed to insert {}: {e}", product.sku);
            continue;
        }
        generated += 1;
    }

    println!("✓ Generated {generated} products");
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates a single product with deterministic pseudo-variety.
fn generate_product(seed: usize) -> Product {
    let now = Utc::now();
    let name = NAMES[seed % NAMES.len()];

    Product {
        id: Uuid::new_v4().to_string(),
        organization_id: DEMO_ORG.to_string(),
        sku: format!("DEMO-{seed:04}"),
        name: format!("{name} #{}", seed / NAMES.len() + 1),
        price_cents: 499 + ((seed * 37) % 4_500) as i64,
        weight_grams: Some(((seed % 8) as i64 + 1) * 125),
        current_stock: (seed % 40) as i64,
        min_stock: 5,
        track_stock: seed % 7 != 0, // a few untracked services/vouchers
        allow_negative_stock: false,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}
