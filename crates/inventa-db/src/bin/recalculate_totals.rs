//! # Totals Recalculation
//!
//! Recomputes every sale's subtotal and total from its lines and fixes the
//! ones that drifted. Prints the run report as JSON.
//!
//! ## Usage
//! ```bash
//! # Use the configured database (inventa.toml / INVENTA_DB_PATH)
//! cargo run -p inventa-db --bin recalculate-totals
//!
//! # Use a specific config file
//! cargo run -p inventa-db --bin recalculate-totals -- --config ./inventa.toml
//! ```
//!
//! Exits with status 1 when any sale could not be checked.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use inventa_db::logging::init_tracing;
use inventa_db::AppConfig;

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Inventa Totals Recalculation");
                println!();
                println!("Usage: recalculate-totals [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>  Config file (default: platform config dir)");
                println!("  -h, --help           Show this help message");
                return Ok(ExitCode::SUCCESS);
            }
            _ => {}
        }
        i += 1;
    }

    let config = AppConfig::load(config_path)?;
    let db = config.open_database().await?;

    let report = db.ledger().recalculate_totals().await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    db.close().await;

    if report.failures.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
