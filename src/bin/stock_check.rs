use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

use stock_watch::alerts::AlertCenter;
use stock_watch::config;
use stock_watch::handlers::render_log;
use stock_watch::source::{self, ProductSource};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Run a single stock check against the configured source and print the notifications"
)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Print the notifications as JSON instead of text
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;
    cfg.ensure_dirs()?;

    let products = source::from_config(&cfg).await?;
    let snapshot = match products.list_products().await {
        Ok(snapshot) => snapshot,
        Err(err) => {
            error!(?err, "product source unavailable");
            return Err(err.into());
        }
    };

    let mut center = AlertCenter::new();
    let report = center.observe(&snapshot, Utc::now());
    info!(
        products = snapshot.len(),
        notifications = report.added,
        "stock check complete"
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(center.log().entries())?);
    } else {
        println!("{}", render_log(center.log().entries()));
    }
    Ok(())
}
