//! Crawl the paginated listing and scrape every linked product.

use crate::commands::scrape::report;
use crate::commands::{after_close, assembler, run_batch, BatchOutcome, Pacer, Target};
use crate::config::Config;
use crate::extract::{Resolver, ResolverSettings, TracingLog};
use crate::format;
use crate::site::locators::listing;
use crate::site::session::Page;
use crate::site::{absolute_url, listing_url, Browser};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// Walks `products?page=N` until a page has no product links.
pub struct CrawlCommand {
    config: Config,
    start_page: u32,
    max_pages: Option<u32>,
}

impl CrawlCommand {
    /// Creates a new crawl command.
    pub fn new(config: Config, start_page: u32, max_pages: Option<u32>) -> Self {
        Self { config, start_page: start_page.max(1), max_pages }
    }

    /// Opens a browser, crawls and writes the JSON batch.
    pub async fn execute(&self) -> Result<String> {
        let browser = Browser::open(&self.config).await.context("Failed to start browser")?;

        let outcome = self.execute_with_page(&browser).await;
        let outcome = after_close(outcome, browser.close().await)?;

        self.finish(outcome)
    }

    /// Writes the batch to `crawl_output` and renders the report.
    pub fn finish(&self, outcome: BatchOutcome) -> Result<String> {
        format::write_json(&self.config.crawl_output, &outcome.records)?;
        outcome.summary.log();
        Ok(report(&self.config, &self.config.crawl_output, &outcome))
    }

    /// Crawls with a provided page (for testing).
    pub async fn execute_with_page(&self, page: &impl Page) -> Result<BatchOutcome> {
        let urls = self.product_urls(page).await?;
        info!("Found {} product links", urls.len());

        let targets: Vec<Target> =
            urls.into_iter().map(|url| Target { label: url.clone(), url }).collect();

        let assembler = assembler(&self.config, Arc::new(TracingLog));
        Ok(run_batch(&assembler, page, &targets, Pacer::from_config(&self.config)).await)
    }

    /// Collects product links from the listing pages, in page order and
    /// without duplicates.
    pub async fn product_urls(&self, page: &impl Page) -> Result<Vec<String>> {
        let resolver = Resolver::new(ResolverSettings::from_config(&self.config), Arc::new(TracingLog));
        let pacer = Pacer::from_config(&self.config);

        let mut urls: Vec<String> = Vec::new();
        let mut number = self.start_page;
        let mut visited = 0;

        loop {
            if self.max_pages.is_some_and(|max| visited >= max) {
                debug!("Reached page limit");
                break;
            }
            if visited > 0 {
                pacer.wait().await;
            }

            let url = listing_url(&self.config.base_url, number);
            page.goto(&url).await.with_context(|| format!("Failed to load listing {}", url))?;
            visited += 1;

            // Wait for the cards to render before reading them all
            let first = resolver
                .find_one(page, &listing::PRODUCT_LINK)
                .await
                .with_context(|| format!("Failed to read product links on {}", url))?;
            if first.is_none() {
                debug!("No product links on page {}, stopping", number);
                break;
            }

            let hrefs = resolver
                .attrs_of(page, &listing::PRODUCT_LINK, listing::HREF_ATTR)
                .await
                .with_context(|| format!("Failed to read product links on {}", url))?;
            if hrefs.is_empty() {
                debug!("No product links on page {}, stopping", number);
                break;
            }

            debug!("Page {}: {} product links", number, hrefs.len());
            for href in hrefs {
                let product = absolute_url(&self.config.base_url, &href);
                if !urls.contains(&product) {
                    urls.push(product);
                }
            }
            number += 1;
        }

        Ok(urls)
    }
}
