use anyhow::Result;
use clap::Parser;
use tracing::{debug, error, info};

use news_harvest::browser::ChromeSession;
use news_harvest::cli::Cli;
use news_harvest::models::RunOutcome;
use news_harvest::utils::logging::init_logging;
use news_harvest::{AppConfig, Harvester};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::from_path(path, true)?,
        None => AppConfig::from_env()?,
    };
    cli.apply(&mut config);

    let _log_guard = init_logging(&config.logging)?;
    config.validate()?;

    info!("Starting news-harvest...");
    debug!("search_phrase set to: {}", config.search.search_phrase);
    debug!("category set to: {}", config.search.category);
    debug!("months set to: {}", config.search.months);

    let session = match ChromeSession::launch(&config.browser) {
        Ok(session) => session,
        Err(e) => {
            error!("Could not establish a browser session: {}", e);
            return Ok(());
        }
    };

    let harvester = Harvester::new(config)?;
    let report = harvester.run(session).await?;

    match &report.outcome {
        RunOutcome::Completed { stop } => info!(
            "Scrape finished ({:?}): {} pages, {} entries, {} images",
            stop, report.pages_visited, report.entries_kept, report.images_saved
        ),
        RunOutcome::Aborted { step, reason } => error!("Scrape aborted while {}: {}", step, reason),
    }

    Ok(())
}
