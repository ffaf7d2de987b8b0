//! Batch scrape over a range of product IDs.

use crate::commands::{after_close, assembler, run_batch, BatchOutcome, Pacer, Target};
use crate::config::{Config, OutputFormat};
use crate::extract::TracingLog;
use crate::format::{self, Formatter};
use crate::site::session::Page;
use crate::site::{product_url, Browser};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Scrapes products `first_id..=last_id` and writes them to the output file.
pub struct ScrapeCommand {
    config: Config,
}

impl ScrapeCommand {
    /// Creates a new scrape command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Opens a browser, scrapes the range and writes the JSON batch.
    ///
    /// Returns the text to print: the summary, preceded by the records when
    /// a table or markdown format is selected.
    pub async fn execute(&self) -> Result<String> {
        let browser = Browser::open(&self.config).await.context("Failed to start browser")?;

        let outcome = self.execute_with_page(&browser).await;
        let outcome = after_close(outcome, browser.close().await)?;

        self.finish(outcome)
    }

    /// Scrapes the range with a provided page (for testing).
    pub async fn execute_with_page(&self, page: &impl Page) -> Result<BatchOutcome> {
        if self.config.first_id > self.config.last_id {
            anyhow::bail!(
                "Invalid product range: {} > {}",
                self.config.first_id,
                self.config.last_id
            );
        }

        info!(
            "Scraping products {} to {} from {}",
            self.config.first_id, self.config.last_id, self.config.base_url
        );

        let targets: Vec<Target> = self
            .config
            .product_ids()
            .map(|id| Target { label: id.to_string(), url: product_url(&self.config.base_url, id) })
            .collect();

        let assembler = assembler(&self.config, Arc::new(TracingLog));
        Ok(run_batch(&assembler, page, &targets, Pacer::from_config(&self.config)).await)
    }

    /// Writes the batch and renders the report.
    pub fn finish(&self, outcome: BatchOutcome) -> Result<String> {
        format::write_json(&self.config.output, &outcome.records)?;
        outcome.summary.log();
        Ok(report(&self.config, &self.config.output, &outcome))
    }
}

/// Summary text, with the records first for human-readable formats.
pub(crate) fn report(config: &Config, output: &Path, outcome: &BatchOutcome) -> String {
    let summary = format!("{}\nOutput:     {}", outcome.summary, output.display());
    match config.format {
        OutputFormat::Json => summary,
        _ => format!("{}\n\n{}", Formatter::new(config.format).format_products(&outcome.records), summary),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::testing::{FakeNode, FakePage};
    use crate::site::locators::product;
    use tempfile::TempDir;

    fn make_test_config(dir: &TempDir) -> Config {
        Config {
            base_url: "https://shop.test".to_string(),
            element_timeout_ms: 0,
            title_timeout_secs: 0,
            delay_ms: 0,
            delay_jitter_ms: 0,
            first_id: 1,
            last_id: 3,
            output: dir.path().join("products.json"),
            ..Config::default()
        }
    }

    fn titled(title: &str) -> FakeNode {
        FakeNode::new()
            .child(product::TITLE, FakeNode::with_text(title))
            .child(product::SKU, FakeNode::with_text(&format!("SKU: {}-SKU", title)))
    }

    fn shop() -> FakePage {
        FakePage::showing(FakeNode::new())
            .with_page("https://shop.test/products/1", titled("One"))
            .with_page("https://shop.test/products/3", titled("Three"))
    }

    #[tokio::test]
    async fn test_scrape_range() {
        let dir = TempDir::new().unwrap();
        let cmd = ScrapeCommand::new(make_test_config(&dir));

        let outcome = cmd.execute_with_page(&shop()).await.unwrap();
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.records[1].sku, "Three-SKU");
        assert_eq!(outcome.summary.failed, vec!["2"]);
    }

    #[tokio::test]
    async fn test_finish_writes_json_and_reports() {
        let dir = TempDir::new().unwrap();
        let config = make_test_config(&dir);
        let output = config.output.clone();
        let cmd = ScrapeCommand::new(config);

        let outcome = cmd.execute_with_page(&shop()).await.unwrap();
        let report = cmd.finish(outcome).unwrap();

        assert!(report.contains("Attempted:  3"));
        assert!(report.contains("Failed:     1 (2)"));
        let written = format::read_json(&output).unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(written[0].title, "One");
    }

    #[tokio::test]
    async fn test_table_report_lists_records() {
        let dir = TempDir::new().unwrap();
        let config = Config { format: OutputFormat::Table, ..make_test_config(&dir) };
        let cmd = ScrapeCommand::new(config);

        let outcome = cmd.execute_with_page(&shop()).await.unwrap();
        let report = cmd.finish(outcome).unwrap();
        assert!(report.contains("One-SKU"));
        assert!(report.contains("Total: 2 products"));
    }

    #[tokio::test]
    async fn test_invalid_range() {
        let dir = TempDir::new().unwrap();
        let config = Config { first_id: 5, last_id: 2, ..make_test_config(&dir) };

        let err = ScrapeCommand::new(config).execute_with_page(&shop()).await.unwrap_err();
        assert!(err.to_string().contains("Invalid product range"));
    }
}
