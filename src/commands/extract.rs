//! Offline extraction from a saved product page.

use crate::commands::assembler;
use crate::config::Config;
use crate::extract::TracingLog;
use crate::format::Formatter;
use crate::site::models::ProductRecord;
use crate::site::session::Page;
use crate::site::StaticSite;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Runs the product extractors against an HTML file instead of a browser.
pub struct ExtractCommand {
    config: Config,
}

impl ExtractCommand {
    /// Creates a new extract command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Extracts the product in `path` and returns formatted output.
    ///
    /// `url` only labels the page in logs; it defaults to a `file://` URL.
    pub async fn execute(&self, path: &Path, url: Option<&str>) -> Result<String> {
        let html = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read HTML file: {}", path.display()))?;
        let url = url.map_or_else(|| format!("file://{}", path.display()), str::to_string);

        let site = StaticSite::single(url.clone(), html);
        let record = self.execute_with_page(&site, &url).await?;

        let formatter = Formatter::new(self.config.format);
        Ok(formatter.format_product(&record))
    }

    /// Extracts the product at `url` from a provided page (for testing).
    pub async fn execute_with_page(&self, page: &impl Page, url: &str) -> Result<ProductRecord> {
        info!("Extracting product from {}", url);
        let assembler = assembler(&self.config, Arc::new(TracingLog));
        assembler
            .assemble(page, url)
            .await
            .with_context(|| format!("No product extracted from {}", url))
    }
}
