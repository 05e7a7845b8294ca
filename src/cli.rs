//! Command-line interface definitions.
//!
//! Collaborator endpoints and tokens can also be supplied through environment
//! variables.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the scraper.
///
/// # Examples
///
/// ```sh
/// # Scrape the politics category into ./data.json
/// somoy_news_scraper --category politics
///
/// # Render through Browserless, four pages at a time
/// somoy_news_scraper -c 3 -o out/international.json --concurrency 4 \
///     --browserless-url http://localhost:3000
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Category to scrape, by id (1-13) or slug
    #[arg(short, long, required_unless_present = "list_categories")]
    pub category: Option<String>,

    /// Path of the JSON file to write
    #[arg(short, long, default_value = "data.json")]
    pub output: PathBuf,

    /// Optional path to a YAML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of article pages extracted at once (overrides the config file)
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Browserless base URL; pages are fetched directly when absent
    #[arg(long, env = "BROWSERLESS_URL")]
    pub browserless_url: Option<String>,

    /// Browserless API token
    #[arg(long, env = "BROWSERLESS_TOKEN", hide_env_values = true)]
    pub browserless_token: Option<String>,

    /// Inference service base URL (overrides the config file)
    #[arg(long, env = "INFERENCE_URL")]
    pub inference_url: Option<String>,

    /// Inference service API token
    #[arg(long, env = "HF_TOKEN", hide_env_values = true)]
    pub inference_token: Option<String>,

    /// Print the configured categories and exit
    #[arg(long)]
    pub list_categories: bool,
}
