//! Output formatting for product records (JSON, table, markdown) and the
//! JSON batch file.

use crate::config::OutputFormat;
use crate::site::models::{ProductRecord, ReviewCount, StockQuantity};
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::path::Path;
use tracing::info;

const INDENT: &[u8] = b"    ";

/// Serializes `value` as JSON with 4-space indentation.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(INDENT));
    value.serialize(&mut serializer).context("Failed to serialize records")?;
    String::from_utf8(buf).context("Serialized JSON was not UTF-8")
}

/// Writes the batch to `path` as a JSON array, one element per product.
pub fn write_json(path: impl AsRef<Path>, records: &[ProductRecord]) -> Result<()> {
    let path = path.as_ref();
    let json = to_json(records)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {} products to {}", records.len(), path.display());
    Ok(())
}

/// Reads a batch written by [`write_json`].
pub fn read_json(path: impl AsRef<Path>) -> Result<Vec<ProductRecord>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Formats records for stdout.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a single record.
    pub fn format_product(&self, product: &ProductRecord) -> String {
        match self.format {
            OutputFormat::Json => self.json(product, "{}"),
            OutputFormat::Table => self.table_single(product),
            OutputFormat::Markdown => self.markdown_single(product),
        }
    }

    /// Formats multiple records.
    pub fn format_products(&self, products: &[ProductRecord]) -> String {
        if products.is_empty() {
            return match self.format {
                OutputFormat::Json => "[]".to_string(),
                _ => "No products found.".to_string(),
            };
        }

        match self.format {
            OutputFormat::Json => self.json(products, "[]"),
            OutputFormat::Table => self.table_products(products),
            OutputFormat::Markdown => self.markdown_products(products),
        }
    }

    fn json<T: Serialize + ?Sized>(&self, value: &T, empty: &str) -> String {
        to_json(value).unwrap_or_else(|_| empty.to_string())
    }

    // Table formatting

    fn table_single(&self, product: &ProductRecord) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Title:    {}", product.title));
        lines.push(format!("Price:    {}", product.price));
        lines.push(format!("SKU:      {}", product.sku));
        lines.push(format!("Rating:   {} ({} reviews)", product.overall_rating, count(product)));
        lines.push(format!("Stock:    {} ({})", product.inventory_status, stock(product)));

        if !product.categories.is_empty() {
            lines.push(format!("Tags:     {}", product.categories.join(", ")));
        }
        lines.push(format!("Images:   {}", product.image_urls.len()));
        lines.push(format!("Reviews:  {} extracted", product.reviews.len()));
        lines.push(format!("Checksum: {}", product.checksum));

        lines.join("\n")
    }

    fn table_products(&self, products: &[ProductRecord]) -> String {
        let sku_width = 14;
        let price_width = 12;
        let rating_width = 6;
        let stock_width = 8;
        let title_width = 40;

        let mut lines = Vec::new();

        lines.push(format!(
            "{:<sku_width$}  {:<price_width$}  {:<rating_width$}  {:<stock_width$}  {}",
            "SKU", "Price", "Rating", "Stock", "Title"
        ));
        lines.push(format!(
            "{:-<sku_width$}  {:-<price_width$}  {:-<rating_width$}  {:-<stock_width$}  {:-<title_width$}",
            "", "", "", "", ""
        ));

        for product in products {
            let rating = product.stars().map_or("N/A".to_string(), |s| format!("{:.1}", s));
            lines.push(format!(
                "{:<sku_width$}  {:>price_width$}  {:>rating_width$}  {:>stock_width$}  {}",
                product.sku,
                product.price,
                rating,
                stock(product),
                truncate(&product.title, title_width)
            ));
        }

        lines.push(String::new());
        lines.push(format!("Total: {} products", products.len()));

        lines.join("\n")
    }

    // Markdown formatting

    fn markdown_single(&self, product: &ProductRecord) -> String {
        let mut lines = Vec::new();

        lines.push(format!("## {}", product.title));
        lines.push(String::new());
        lines.push(format!("- **Price:** {}", product.price));
        lines.push(format!("- **SKU:** {}", product.sku));
        lines.push(format!("- **Rating:** {} ({} reviews)", product.overall_rating, count(product)));
        lines.push(format!("- **Stock:** {} ({})", product.inventory_status, stock(product)));
        if !product.categories.is_empty() {
            lines.push(format!("- **Categories:** {}", product.categories.join(", ")));
        }

        if !product.reviews.is_empty() {
            lines.push(String::new());
            lines.push("### Reviews".to_string());
            lines.push(String::new());
            for review in &product.reviews {
                lines.push(format!(
                    "- {}/5 **{}** by {} ({})",
                    review.rating, review.title, review.name, review.date
                ));
            }
        }

        lines.join("\n")
    }

    fn markdown_products(&self, products: &[ProductRecord]) -> String {
        let mut lines = Vec::new();

        lines.push("| SKU | Price | Rating | Stock | Reviews | Title |".to_string());
        lines.push("|-----|-------|--------|-------|---------|-------|".to_string());

        for product in products {
            lines.push(format!(
                "| {} | {} | {} | {} | {} | {} |",
                product.sku,
                product.price,
                product.overall_rating,
                stock(product),
                product.reviews.len(),
                truncate(&product.title, 40)
            ));
        }

        lines.push(String::new());
        lines.push(format!("*{} products scraped*", products.len()));

        lines.join("\n")
    }
}

fn count(product: &ProductRecord) -> String {
    match product.total_reviews {
        ReviewCount::Count(n) => n.to_string(),
        ReviewCount::NotAvailable => "N/A".to_string(),
    }
}

fn stock(product: &ProductRecord) -> String {
    match product.inventory_stock {
        StockQuantity::Units(n) => n.to_string(),
        StockQuantity::Unspecified => "?".to_string(),
        StockQuantity::NotAvailable => "N/A".to_string(),
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let head: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}
