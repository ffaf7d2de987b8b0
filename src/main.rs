//! storefront-scraper - Resilient product and review scraper for a
//! browser-rendered storefront.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use storefront_scraper::commands::{CrawlCommand, ExtractCommand, ScrapeCommand};
use storefront_scraper::config::{Config, OutputFormat};
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "storefront-scraper",
    version,
    about = "Resilient product and review scraper for a browser-rendered storefront",
    long_about = "Drives a browser over WebDriver through the storefront's product pages and writes \
                  every product, with its customer reviews, to a JSON file. Missing fields get \
                  fixed fallback values instead of failing the product."
)]
struct Cli {
    /// Storefront base URL
    #[arg(long, global = true, env = "STOREFRONT_BASE_URL")]
    base_url: Option<String>,

    /// WebDriver server URL (e.g., http://localhost:9515 for chromedriver)
    #[arg(long, global = true, env = "STOREFRONT_WEBDRIVER_URL")]
    webdriver: Option<String>,

    /// Delay between product pages in milliseconds
    #[arg(long, global = true, env = "STOREFRONT_DELAY")]
    delay: Option<u64>,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format for stdout
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Show the browser window
    #[arg(long, global = true)]
    headed: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape a range of product IDs
    #[command(alias = "s")]
    Scrape {
        /// First product ID (inclusive)
        #[arg(long)]
        from: Option<u32>,

        /// Last product ID (inclusive)
        #[arg(long)]
        to: Option<u32>,

        /// JSON output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Follow the paginated product listing
    #[command(alias = "c")]
    Crawl {
        /// Listing page to start from
        #[arg(long, default_value = "1")]
        start_page: u32,

        /// Stop after this many listing pages
        #[arg(long)]
        max_pages: Option<u32>,

        /// JSON output file [default: productsPaginated.json]
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Extract one product from a saved HTML page, without a browser
    #[command(alias = "x")]
    Extract {
        /// Saved product page
        file: PathBuf,

        /// URL the page was saved from
        #[arg(long)]
        url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    if let Some(webdriver) = cli.webdriver {
        config.webdriver_url = webdriver;
    }
    if let Some(delay) = cli.delay {
        config.delay_ms = delay;
    }
    if let Some(format) = cli.format {
        config.format = format;
    }
    if let Some(log_file) = cli.log_file {
        config.log_file = Some(log_file);
    }
    if cli.headed {
        config.headless = false;
    }

    init_logging(cli.verbose, config.log_file.as_deref())?;

    let output = match cli.command {
        Commands::Scrape { from, to, output } => {
            if let Some(from) = from {
                config.first_id = from;
            }
            if let Some(to) = to {
                config.last_id = to;
            }
            if let Some(output) = output {
                config.output = output;
            }

            ScrapeCommand::new(config).execute().await?
        }

        Commands::Crawl { start_page, max_pages, output } => {
            if let Some(output) = output {
                config.crawl_output = output;
            }
            CrawlCommand::new(config, start_page, max_pages).execute().await?
        }

        Commands::Extract { file, url } => {
            ExtractCommand::new(config).execute(&file, url.as_deref()).await?
        }
    };

    println!("{}", output);
    Ok(())
}

/// Console logging plus an optional plain-text log file.
fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    let console = fmt::layer().with_target(false).with_writer(std::io::stderr).with_filter(filter);

    let file = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            let level = if verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file))
                    .with_filter(level),
            )
        }
        None => None,
    };

    tracing_subscriber::registry().with(console).with(file).init();
    Ok(())
}
