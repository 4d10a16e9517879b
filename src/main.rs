mod analyzer;
mod cli;
mod config;
mod model;
mod normalizer;
mod notifier;
mod parser;
mod pipeline;
mod scraper;
mod storage;
mod utils;

use crate::cli::{Cli, LedgerBackend, Settings};
use crate::model::{FetchError, StorageError};
use crate::notifier::Notifier;
use crate::parser::parse_feed;
use crate::pipeline::{process_offers, RunSummary};
use crate::scraper::{FeedFetcher, FeedSource};
use crate::storage::{FileLedger, SeenLedger, SqliteLedger};
use anyhow::Context;
use clap::Parser;
use tokio::time::sleep;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Cli::parse()
        .into_settings()
        .context("Invalid configuration")?;
    info!(
        "Starting with {} criteria, provider {:?}, tax {}%",
        settings.criteria.count(),
        settings.provider,
        settings.options.tax_percent
    );

    let mut ledger = if settings.options.test_mode {
        info!("Test mode: nothing is sent and the state file is left alone.");
        None
    } else {
        Some(open_ledger(&settings).with_context(|| {
            format!("Failed to open state file {}", settings.state_file.display())
        })?)
    };

    let notifier = settings.notifier().context("Notifier setup failed")?;
    let fetcher = FeedFetcher::new().context("HTTP client setup failed")?;

    loop {
        match run_once(&settings, &fetcher, ledger.as_deref_mut(), notifier.as_ref()).await {
            Ok(summary) => {
                if summary.notify_failed > 0 {
                    error!("{} notifications could not be delivered", summary.notify_failed);
                }
            }
            Err(e) => error!("Feed error: {}", e),
        }

        let Some(interval) = settings.interval else {
            break;
        };
        info!("Waiting {}s for the next pass...", interval.as_secs());
        sleep(interval).await;
    }
    Ok(())
}

fn open_ledger(settings: &Settings) -> Result<Box<dyn SeenLedger>, StorageError> {
    let ledger: Box<dyn SeenLedger> = match settings.ledger {
        LedgerBackend::File => Box::new(FileLedger::open(&settings.state_file)?),
        LedgerBackend::Sqlite => Box::new(SqliteLedger::new(&settings.state_file.to_string_lossy())?),
    };
    Ok(ledger)
}

/// One fetch-evaluate-notify pass over the whole feed.
async fn run_once<L: SeenLedger + ?Sized>(
    settings: &Settings,
    source: &dyn FeedSource,
    ledger: Option<&mut L>,
    notifier: &dyn Notifier,
) -> Result<RunSummary, FetchError> {
    info!("Fetching {}", settings.data_url);
    let document = source.fetch(&settings.data_url).await?;
    let offers = parse_feed(&document)?;
    info!("Feed holds {} offers", offers.len());

    Ok(process_offers(&offers, &settings.criteria, &settings.options, ledger, notifier).await)
}
