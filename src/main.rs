use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use tokio::sync::Mutex;
use tracing::{error, info};

use stock_watch::alerts::AlertCenter;
use stock_watch::analysis::{GeminiClient, LlmService};
use stock_watch::config;
use stock_watch::handlers::{self, BotContext};
use stock_watch::scheduler::AlertScheduler;
use stock_watch::source;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
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
    let llm: Option<Arc<dyn LlmService>> = match &cfg.analysis {
        Some(analysis) => Some(Arc::new(GeminiClient::from_config(analysis)?)),
        None => None,
    };

    // One notification center per running bot session.
    let center = Arc::new(Mutex::new(AlertCenter::new()));
    let scheduler = AlertScheduler::start(
        center.clone(),
        products.clone(),
        Duration::from_secs(cfg.app.check_interval_secs),
    );

    let ctx = BotContext {
        center,
        source: products,
        llm,
    };
    let cfg = Arc::new(cfg);
    let bot = Bot::new(cfg.telegram.bot_token.clone());

    info!("starting telegram bot");
    teloxide::repl(bot, move |bot: Bot, msg: Message| {
        let ctx = ctx.clone();
        let cfg = cfg.clone();
        async move {
            if let Err(err) =
                handlers::handle_update(&bot, &ctx, |uid| cfg.is_allowed(uid), &msg).await
            {
                error!(?err, "failed to handle update");
            }
            respond(())
        }
    })
    .await;

    info!("bot stopped; shutting down scheduler");
    scheduler.shutdown().await;
    Ok(())
}
