use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::PathBuf;

use stock_watch::analysis::{self, AnalysisFailure, AnalysisRequest, GeminiClient};
use stock_watch::config;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Extract structured business data from text or a document"
)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Text to analyse
    #[arg(long, conflicts_with = "file")]
    text: Option<String>,

    /// Text document to analyse
    #[arg(long)]
    file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;
    let analysis_cfg = cfg
        .analysis
        .as_ref()
        .ok_or_else(|| anyhow!("no `analysis` section in {}", args.config.display()))?;
    let client = GeminiClient::from_config(analysis_cfg)?;

    let request = match (args.text, args.file) {
        (Some(text), None) => AnalysisRequest::text(text),
        (None, Some(path)) => {
            let content = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            AnalysisRequest::file(content, &name, file_type(&path))
        }
        _ => return Err(anyhow!("pass exactly one of --text or --file")),
    };

    match analysis::analyze(&client, &request).await {
        Ok(res) => println!("{}", serde_json::to_string_pretty(&res)?),
        Err(failure) => {
            println!("{}", serde_json::to_string_pretty(&failure)?);
            return Err(anyhow!(
                "analysis failed with status {}: {}",
                AnalysisFailure::STATUS,
                failure.error
            ));
        }
    }
    Ok(())
}

fn file_type(path: &std::path::Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => "text/csv",
        Some("json") => "application/json",
        Some("md") => "text/markdown",
        Some("html") | Some("htm") => "text/html",
        _ => "text/plain",
    }
}
