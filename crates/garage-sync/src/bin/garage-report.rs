//! # Workshop Report
//!
//! Loads the configuration, syncs (or falls back to the local cache) and
//! prints the dashboard, overdue jobs and low-stock items.
//!
//! ## Usage
//! ```bash
//! # Last 30 days, config from the platform config dir
//! cargo run -p garage-sync --bin garage-report
//!
//! # Explicit config and range (today, yesterday, 7d, 30d, 90d, all)
//! cargo run -p garage-sync --bin garage-report -- --config ./garage.toml --range 7d
//! ```
//!
//! With no `remote.url` configured the report runs from the local cache
//! alone; `seed` from `garage-db` can fill one.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use garage_core::views::DateRange;
use garage_db::{Database, DbConfig};
use garage_sync::remote::{MemoryBackend, RemoteBackend, RestBackend};
use garage_sync::{GarageConfig, GarageStore, StoreOptions, SyncState};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,garage=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn parse_range(value: &str) -> Option<DateRange> {
    match value {
        "today" => Some(DateRange::Today),
        "yesterday" => Some(DateRange::Yesterday),
        "7d" => Some(DateRange::LAST_7_DAYS),
        "30d" => Some(DateRange::LAST_30_DAYS),
        "90d" => Some(DateRange::LAST_3_MONTHS),
        "all" => Some(DateRange::AllTime),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let mut config_path: Option<PathBuf> = None;
    let mut range = DateRange::LAST_30_DAYS;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--range" | "-r" => {
                if i + 1 < args.len() {
                    match parse_range(&args[i + 1]) {
                        Some(parsed) => range = parsed,
                        None => warn!(range = %args[i + 1], "Unknown range, using last 30 days"),
                    }
                    i += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }

    let config = GarageConfig::load(config_path)?;

    let cache_path = config.cache_path();
    if let Some(parent) = cache_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let db = Database::new(DbConfig::new(cache_path)).await?;

    let backend: Arc<dyn RemoteBackend> = match RestBackend::from_config(&config)? {
        Some(rest) => Arc::new(rest),
        None => {
            warn!("No remote.url configured, reading local cache only");
            Arc::new(MemoryBackend::unreachable())
        }
    };

    let store = GarageStore::init(&db, backend, StoreOptions::from_config(&config)).await;

    if let SyncState::CacheFallback { reason } = store.state() {
        println!("(offline: {})", reason);
    }

    let config = store.config();
    println!("{}", config.display_name());
    println!("{}", "=".repeat(60));

    let stats = store.dashboard(range);
    println!("Jobs ({})", stats.range.label());
    println!("  Total:        {}", stats.total);
    println!("  Received:     {}", stats.received);
    println!("  In progress:  {}", stats.in_progress);
    println!("  Completed:    {}", stats.completed);
    println!("  Delivered:    {}", stats.delivered);
    println!("  Revenue:      ₹{}", stats.revenue);
    println!();

    println!("Overdue ({})", stats.overdue_count());
    for job in &stats.overdue {
        println!(
            "  {}  {:<12} {:<20} due {}  [{}]",
            job.date_in, job.vehicle_number, job.customer_name, job.expected_delivery_date, job.status
        );
    }
    println!();

    println!("Recent");
    for job in &stats.recent {
        println!(
            "  {}  {:<12} {:<20} ₹{}  [{}]",
            job.date_in, job.vehicle_number, job.customer_name, job.charges, job.status
        );
    }
    println!();

    let low = store.low_stock();
    println!("Low stock ({})", low.len());
    for item in &low {
        println!(
            "  {:<28} {:>6} {:<4} (reorder at {})",
            item.name, item.quantity, item.unit, item.min_stock
        );
    }

    let pending = store.pending_writes();
    if !pending.is_empty() {
        println!();
        println!("{} write(s) waiting for the remote", pending.len());
    }

    db.close().await;
    Ok(())
}
