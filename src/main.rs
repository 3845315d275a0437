//! CLI front-end: `single` and `batch` commands.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use leaderscrape::orchestrator::pool;
use leaderscrape::{Orchestrator, ScrapeConfigBuilder};

#[derive(Parser)]
#[command(name = "leaderscrape", version, about = "Leaderboard extraction engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process one site.
    Single {
        /// Site URL (http/https).
        url: String,
        /// Enable datastore-facing production behavior.
        #[arg(long)]
        production: bool,
        /// Run the browser with a visible window.
        #[arg(long)]
        headed: bool,
    },
    /// Process many sites through the worker pool.
    Batch {
        /// Site URLs; `websites.txt` is read when none are given.
        urls: Vec<String>,
        #[arg(long)]
        production: bool,
        /// Worker count (default: min(cpus, 4)).
        #[arg(long)]
        workers: Option<usize>,
        /// Delay between site starts, in milliseconds.
        #[arg(long)]
        delay: Option<u64>,
        /// Cap on sites processed.
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Single {
            url,
            production,
            headed,
        } => {
            let config = ScrapeConfigBuilder::new()
                .production(production)
                .headless(!headed)
                .build()?;
            let orchestrator = Arc::new(Orchestrator::new(config)?);
            let run = pool::process_site(&orchestrator, &url).await;

            info!(
                domain = %run.domain,
                results = run.results.len(),
                errors = run.errors.len(),
                warnings = run.warnings.len(),
                "single site finished"
            );
            println!("{}", serde_json::to_string_pretty(&run)?);
            if run.results.is_empty() {
                anyhow::bail!("no leaderboard extracted for {url}");
            }
            Ok(())
        }
        Command::Batch {
            urls,
            production,
            workers,
            delay,
            limit,
        } => {
            let mut builder = ScrapeConfigBuilder::new().production(production).limit(limit);
            if let Some(workers) = workers {
                builder = builder.workers(workers);
            }
            if let Some(delay) = delay {
                builder = builder.start_delay(Duration::from_millis(delay));
            }
            let config = builder.build()?;

            let urls = if urls.is_empty() {
                leaderscrape::websites::load(config.websites_path())?
            } else {
                urls
            };
            if urls.is_empty() {
                anyhow::bail!("no site URLs to process");
            }

            let orchestrator = Arc::new(Orchestrator::new(config)?);

            // Honour the per-site refresh interval
            let due: Vec<String> = urls
                .into_iter()
                .filter(|url| {
                    match pool::recently_scraped(&orchestrator, url) {
                        Ok(true) => {
                            info!(%url, "skipping, scraped within refresh interval");
                            false
                        }
                        Ok(false) => true,
                        Err(e) => {
                            warn!(%url, "skipping invalid URL: {e:#}");
                            false
                        }
                    }
                })
                .collect();

            let runs = pool::run_batch(Arc::clone(&orchestrator), due).await;
            let succeeded = runs.iter().filter(|r| !r.results.is_empty()).count();
            info!(
                total = runs.len(),
                succeeded,
                "batch finished"
            );
            if succeeded == 0 && !runs.is_empty() {
                anyhow::bail!("every site failed");
            }
            Ok(())
        }
    }
}
