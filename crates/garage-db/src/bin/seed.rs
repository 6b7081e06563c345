//! # Demo Cache Seeder
//!
//! Fills a local cache with demo jobs, inventory and a shop config so the
//! dashboard and `garage-report` have something to show offline.
//!
//! ## Usage
//! ```bash
//! # 40 jobs (default) into ./garage_dev.db
//! cargo run -p garage-db --bin seed
//!
//! # Custom amount and path
//! cargo run -p garage-db --bin seed -- --count 200 --db ./data/cache.db
//! ```
//!
//! ## Generated Data
//! - Jobs spread over the last 60 days, cycling through the four statuses,
//!   with repeat visits for a handful of customers
//! - A parts inventory where a few items sit at or below their reorder level
//! - A shop config with a placeholder group invite link

use chrono::{Days, Utc};
use std::env;

use garage_core::{new_id, InventoryItem, Job, JobStatus, Money, ShopConfig};
use garage_db::{keys, Database, DbConfig};

/// Demo customers: (name, mobile, plate, brand, model)
const CUSTOMERS: &[(&str, &str, &str, &str, &str)] = &[
    ("Asha Menon", "9845012345", "KA01AB1234", "Maruti", "Swift"),
    ("Ravi Kumar", "9880011223", "KA05MN4321", "Hyundai", "Creta"),
    ("Imran Shaikh", "9900123456", "KA03HK7788", "Honda", "City"),
    ("Deepa Rao", "9741234567", "KA51Z9090", "Tata", "Nexon"),
    ("Joseph Dsouza", "9611122233", "KA02MJ5050", "Mahindra", "XUV700"),
    ("Lakshmi Iyer", "9448012345", "KA04P3131", "Toyota", "Innova"),
    ("Vikram Singh", "9535099887", "KA53C2468", "Kia", "Seltos"),
];

const SERVICES: &[(&str, f64)] = &[
    ("General service", 2499.0),
    ("Oil change", 899.0),
    ("Brake pads replacement", 3200.0),
    ("Wheel alignment and balancing", 1100.0),
    ("AC gas refill", 1800.0),
    ("Clutch overhaul", 7500.0),
    ("Denting and painting", 5400.0),
];

/// (name, category, unit, quantity, min_stock, price)
const PARTS: &[(&str, &str, &str, f64, f64, f64)] = &[
    ("Engine Oil 5W-30", "Fluids", "ltr", 24.0, 10.0, 420.0),
    ("Brake Pad Set", "Brakes", "set", 3.0, 4.0, 1450.0),
    ("Oil Filter", "Filters", "pcs", 12.0, 5.0, 260.0),
    ("Air Filter", "Filters", "pcs", 5.0, 5.0, 380.0),
    ("Coolant", "Fluids", "ltr", 18.0, 6.0, 310.0),
    ("Wiper Blade", "Accessories", "pcs", 0.0, 4.0, 220.0),
    ("Spark Plug", "Ignition", "pcs", 40.0, 8.0, 150.0),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 40;
    let mut db_path = String::from("./garage_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(40);
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
                println!("Garage Desk Demo Cache Seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of jobs to generate (default: 40)");
                println!("  -d, --db <PATH>    Cache file path (default: ./garage_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Garage Desk Demo Cache Seeder");
    println!("=============================");
    println!("Cache: {}", db_path);
    println!("Jobs:  {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let cache = db.cache();
    println!("✓ Connected to cache, migrations applied");

    let existing: Vec<Job> = cache.read_list(keys::JOBS).await?;
    if !existing.is_empty() {
        println!("⚠ Cache already holds {} jobs", existing.len());
        println!("  Skipping seed to avoid overwriting them.");
        println!("  Delete the cache file to regenerate.");
        return Ok(());
    }

    let today = Utc::now().date_naive();
    let jobs: Vec<Job> = (0..count).map(|seed| demo_job(seed, today)).collect();
    cache.write(keys::JOBS, &jobs).await?;
    println!("✓ Wrote {} jobs", jobs.len());

    let stamp = Utc::now().to_rfc3339();
    let inventory: Vec<InventoryItem> = PARTS
        .iter()
        .map(|(name, category, unit, quantity, min_stock, price)| InventoryItem {
            unit: unit.to_string(),
            quantity: *quantity,
            min_stock: *min_stock,
            price: Money::from_major(*price),
            last_updated: stamp.clone(),
            ..InventoryItem::new(*name, *category)
        })
        .collect();
    let low = inventory.iter().filter(|item| item.is_low_stock()).count();
    cache.write(keys::INVENTORY, &inventory).await?;
    println!("✓ Wrote {} inventory items ({} low on stock)", inventory.len(), low);

    let config = ShopConfig {
        shop_name: "Garage Desk Demo Workshop".into(),
        group_invite_link: "https://chat.whatsapp.com/demo-invite".into(),
        shop_phone: "080-4000-1234".into(),
        ..Default::default()
    };
    cache.write(keys::CONFIG, &config).await?;
    println!("✓ Wrote shop config");

    db.close().await;
    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// A deterministic demo job. Older jobs are further along the workflow.
fn demo_job(seed: usize, today: chrono::NaiveDate) -> Job {
    let (name, mobile, plate, brand, model) = CUSTOMERS[seed % CUSTOMERS.len()];
    let (service, charges) = SERVICES[(seed * 3) % SERVICES.len()];

    let age_days = ((seed * 7) % 60) as u64;
    let date_in = today.checked_sub_days(Days::new(age_days)).unwrap_or(today);
    let expected = date_in
        .checked_add_days(Days::new(1 + (seed % 4) as u64))
        .unwrap_or(date_in);

    let status = match age_days {
        0..=2 => JobStatus::ALL[seed % 2],
        3..=10 => JobStatus::ALL[1 + seed % 2],
        _ => JobStatus::Delivered,
    };

    Job {
        id: new_id(),
        customer_name: name.to_string(),
        customer_mobile: mobile.to_string(),
        customer_address: None,
        vehicle_number: plate.to_string(),
        brand: Some(brand.to_string()),
        model: Some(model.to_string()),
        vehicle_type: Some("Car".to_string()),
        color: None,
        services: Some(service.to_string()),
        date_in,
        expected_delivery_date: expected,
        charges: Money::from_major(charges),
        status,
    }
}
