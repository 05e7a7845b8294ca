//! # Somoy News Scraper
//!
//! Scrapes one category of a news site, extracts structured article data,
//! drops articles filed under other categories and scores each one for
//! relevance using named-entity and sentiment signals.
//!
//! ## Usage
//!
//! ```sh
//! somoy_news_scraper --category politics -o data.json
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Discovery**: Collect candidate article URLs from the category listing page
//! 2. **Extraction**: Render each article and read its metadata and JSON-LD block
//! 3. **Filtering**: Drop articles whose news type is not the requested category
//! 4. **Scoring**: Keywords, international perspective, sentiment and importance
//! 5. **Output**: Write all records as one JSON array

use clap::Parser;
use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod error;
mod models;
mod outputs;
mod pipeline;
mod render;
mod scoring;
mod scrapers;
mod utils;

use api::HfInferenceClient;
use cli::Cli;
use config::ScraperConfig;
use error::PipelineError;
use outputs::json;
use pipeline::{Pipeline, RunOutput};
use render::HttpRenderer;
use scoring::{Analyzer, Scorer};
use utils::ensure_writable_parent;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("somoy_news_scraper starting up");

    let args = Cli::parse();
    debug!(?args.category, ?args.output, ?args.config, "Parsed CLI arguments");

    // ---- Configuration ----
    let config = Arc::new(load_config(&args)?);

    if args.list_categories {
        for category in &config.categories {
            println!("{category}");
        }
        return Ok(());
    }

    let selector = args.category.as_deref().unwrap_or_default();
    let Some(category) = config.category(selector).cloned() else {
        error!(category = %selector, "Unknown category");
        return Err(PipelineError::Config(format!("unknown category {selector:?}")).into());
    };
    info!(category = %category, "Selected category");

    // Early check: ensure the output location is writable
    if let Err(e) = ensure_writable_parent(&args.output).await {
        error!(path = %args.output.display(), error = %e, "Output location is not writable");
        return Err(e);
    }

    // ---- Collaborators, created once for the whole run ----
    let renderer = HttpRenderer::connect(&config.render).map_err(PipelineError::Session)?;
    info!(?renderer, "Rendering session established");

    let inference = Arc::new(
        HfInferenceClient::new(&config.inference)
            .map_err(|e| PipelineError::Config(format!("inference client: {e}")))?,
    );
    info!(?inference, "Inference client ready");

    let analyzer = Analyzer::new(
        Scorer::new(&config.scoring),
        inference.clone(),
        inference,
    );
    let pipeline = Pipeline::new(Arc::clone(&config), Arc::new(renderer), analyzer)?;

    // ---- Run, cancellable with Ctrl-C ----
    let output = tokio::select! {
        res = pipeline.run(&category) => res?,
        _ = tokio::signal::ctrl_c() => {
            warn!("Cancelled; no output written");
            return Err("run cancelled".into());
        }
    };

    output.report.log_summary();
    let written = write_run(output, &args.output).await?;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        articles = written,
        path = %args.output.display(),
        "Execution complete"
    );

    Ok(())
}

/// Write the records of a finished run to `path`.
///
/// # Returns
///
/// The number of records written.
///
/// # Errors
///
/// [`PipelineError::NoResults`] when the run produced nothing; the output
/// file is left untouched in that case. Write failures are
/// [`PipelineError::Output`].
async fn write_run(output: RunOutput, path: &Path) -> Result<usize, PipelineError> {
    let records = output.into_records().inspect_err(|err| {
        error!(error = %err, "Nothing to write");
    })?;
    json::write_articles(&records, path).await?;
    Ok(records.len())
}

/// Load the configuration file (if any) and apply CLI overrides.
fn load_config(args: &Cli) -> Result<ScraperConfig, PipelineError> {
    let mut config = ScraperConfig::load(args.config.as_deref())?;

    if let Some(concurrency) = args.concurrency {
        if concurrency == 0 {
            return Err(PipelineError::Config("concurrency must be at least 1".to_string()));
        }
        config.concurrency = concurrency;
    }
    if args.browserless_url.is_some() {
        config.render.browserless_url = args.browserless_url.clone();
    }
    if args.browserless_token.is_some() {
        config.render.browserless_token = args.browserless_token.clone();
    }
    if let Some(url) = &args.inference_url {
        config.inference.endpoint = url.clone();
    }
    if args.inference_token.is_some() {
        config.inference.token = args.inference_token.clone();
    }
    Ok(config)
}
