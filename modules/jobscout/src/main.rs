use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use apify_client::ApifyClient;
use jobscout::datagol::{DatagolFilterSource, DatagolSink, LogSink};
use jobscout::scout::JobScout;
use jobscout::traits::PostingSink;
use jobscout_common::{Config, RunInput, ScoutError};

#[derive(Parser)]
#[command(name = "jobscout", about = "Batch job-posting search over Apify, filtered into DataGOL")]
struct Cli {
    /// Path to a JSON run input file
    #[arg(long)]
    input: Option<PathBuf>,

    /// Resolve lists and the search space, then exit without calling Apify
    #[arg(long)]
    dry_run: bool,

    /// Log admitted postings instead of saving them to DataGOL
    #[arg(long)]
    log_only: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("jobscout=info,apify_client=info,datagol_client=info")
            }),
        )
        .init();

    let cli = Cli::parse();
    info!("Job scout starting...");

    let input = match &cli.input {
        Some(path) => read_input(path)?,
        None => RunInput::default(),
    };
    let config = Config::from_env(input);
    config.log_redacted();

    if config.apify_token.is_empty() && !cli.dry_run {
        return Err(ScoutError::Config("APIFY_TOKEN is not set".to_string()).into());
    }

    let provider = Arc::new(ApifyClient::new(config.apify_token.clone()));
    let source = Arc::new(DatagolFilterSource::new(&config));
    let sink: Arc<dyn PostingSink> = if cli.log_only || cli.dry_run {
        Arc::new(LogSink)
    } else {
        Arc::new(DatagolSink::new(&config))
    };

    let scout = JobScout::new(config, provider, source, sink);

    if cli.dry_run {
        let plan = scout.plan().await?;
        for unit in &plan.units {
            info!(unit = %unit, "Would search");
        }
        info!(
            units = plan.units.len(),
            batches = plan.batches,
            expected_secs = plan.expected_secs,
            "Dry run complete"
        );
        return Ok(());
    }

    let run = scout.run().await?;
    info!(
        run_id = %run.run_id,
        admitted = run.postings.len(),
        "Job scout run complete"
    );
    Ok(())
}

fn read_input(path: &Path) -> Result<RunInput> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read run input {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse run input {}", path.display()))
}
