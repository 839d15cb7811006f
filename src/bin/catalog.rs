use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use stock_watch::config;
use stock_watch::db;
use stock_watch::model::NewProduct;

#[derive(Debug, Parser)]
#[command(author, version, about = "Manage the local SQLite product catalog")]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Add a product and print its id
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value_t = 0)]
        stock: i64,
        #[arg(long, default_value_t = 0)]
        threshold: i64,
        #[arg(long, default_value_t = 7)]
        lead_time_days: i64,
    },
    /// Overwrite the stock level of a product
    SetStock {
        #[arg(long)]
        id: String,
        #[arg(long)]
        stock: i64,
    },
    /// List products in catalog order
    List,
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

    let pool = db::init_pool(&cfg.database_url()).await?;
    db::run_migrations(&pool).await?;

    match args.command {
        Cmd::Add {
            name,
            category,
            stock,
            threshold,
            lead_time_days,
        } => {
            let id = db::insert_product(
                &pool,
                &NewProduct {
                    name,
                    category,
                    current_stock: stock,
                    reorder_threshold: threshold,
                    lead_time_days,
                },
            )
            .await?;
            info!(%id, "product added");
            println!("{}", id);
        }
        Cmd::SetStock { id, stock } => {
            if !db::set_stock(&pool, &id, stock).await? {
                return Err(anyhow!("no product with id {}", id));
            }
            info!(%id, stock, "stock updated");
        }
        Cmd::List => {
            for p in db::list_products(&pool).await? {
                println!(
                    "{}\t{}\t{}\tstock={}\tthreshold={}\tlead={}d",
                    p.id,
                    p.name,
                    p.category.as_deref().unwrap_or("-"),
                    p.stock(),
                    p.threshold(),
                    p.lead_time_days
                );
            }
        }
    }
    Ok(())
}
