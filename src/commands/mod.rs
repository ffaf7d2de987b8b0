//! CLI command implementations.

pub mod crawl;
pub mod extract;
pub mod scrape;

pub use crawl::CrawlCommand;
pub use extract::ExtractCommand;
pub use scrape::ScrapeCommand;

use crate::config::Config;
use crate::extract::{EventLog, ProductAssembler, Resolver, ResolverSettings};
use crate::site::models::ProductRecord;
use crate::site::session::Page;
use anyhow::Result;
use rand::RngExt;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Builds the product assembler described by `config`.
pub fn assembler(config: &Config, log: Arc<dyn EventLog + Send + Sync>) -> ProductAssembler {
    let resolver = Resolver::new(ResolverSettings::from_config(config), log);
    ProductAssembler::new(resolver, Duration::from_secs(config.title_timeout_secs))
}

/// Keeps the batch result when closing the browser fails afterwards; the
/// close error is only logged.
pub fn after_close<T>(outcome: Result<T>, closed: Result<()>) -> Result<T> {
    if let Err(e) = closed {
        warn!("{:#}", e);
    }
    outcome
}

/// Delay between product pages with random jitter.
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    delay_ms: u64,
    jitter_ms: u64,
}

impl Pacer {
    pub fn new(delay_ms: u64, jitter_ms: u64) -> Self {
        Self { delay_ms, jitter_ms }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.delay_ms, config.delay_jitter_ms)
    }

    /// Sleeps for the base delay plus up to `jitter_ms`.
    pub async fn wait(&self) {
        if self.delay_ms == 0 {
            return;
        }

        let jitter = if self.jitter_ms > 0 {
            rand::rng().random_range(0..=self.jitter_ms)
        } else {
            0
        };

        let total_delay = self.delay_ms + jitter;
        debug!("Delaying {}ms", total_delay);
        tokio::time::sleep(Duration::from_millis(total_delay)).await;
    }
}

/// End-of-run statistics. Products are identified by ID or URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: Vec<String>,
}

impl BatchSummary {
    fn success(&mut self) {
        self.attempted += 1;
        self.succeeded += 1;
    }

    fn failure(&mut self, target: &str) {
        self.attempted += 1;
        self.failed.push(target.to_string());
    }

    /// Writes the summary to the log.
    pub fn log(&self) {
        info!("Scraping complete");
        info!("Total products attempted: {}", self.attempted);
        info!("Total products successfully scraped: {}", self.succeeded);
        if !self.failed.is_empty() {
            warn!("Failed products: {}", self.failed.join(", "));
        }
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Attempted:  {}", self.attempted)?;
        writeln!(f, "Successful: {}", self.succeeded)?;
        write!(f, "Failed:     {}", self.failed.len())?;
        if !self.failed.is_empty() {
            write!(f, " ({})", self.failed.join(", "))?;
        }
        Ok(())
    }
}

/// Records and statistics of one batch.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub records: Vec<ProductRecord>,
    pub summary: BatchSummary,
}

/// A product to scrape: how it is reported and where it lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub label: String,
    pub url: String,
}

/// Assembles every target in order. A product that fails is logged and
/// counted; the batch carries on. Once the browser session is lost the
/// remaining targets are counted as failed without being loaded.
pub async fn run_batch<P: Page>(
    assembler: &ProductAssembler,
    page: &P,
    targets: &[Target],
    pacer: Pacer,
) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();
    let mut disconnected = false;

    for (i, target) in targets.iter().enumerate() {
        if disconnected {
            outcome.summary.failure(&target.label);
            continue;
        }
        if i > 0 {
            pacer.wait().await;
        }

        info!("Scraping product {}", target.label);
        match assembler.assemble(page, &target.url).await {
            Ok(record) => {
                outcome.records.push(record);
                outcome.summary.success();
            }
            Err(e) => {
                error!("Error scraping product {}: {}", target.label, e);
                if e.is_disconnect() {
                    error!("Browser session lost; skipping remaining products");
                    disconnected = true;
                }
                outcome.summary.failure(&target.label);
            }
        }
    }

    outcome
}
