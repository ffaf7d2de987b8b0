//! Product page assembly.

use crate::extract::fallback;
use crate::extract::fields;
use crate::extract::resolver::{Resolver, ResolverFault};
use crate::extract::reviews::ReviewAssembler;
use crate::extract::{Extraction, Sentinel};
use crate::site::locators::product;
use crate::site::models::{
    InventoryStatus, OverallRating, ProductRecord, ReviewCount, StockQuantity,
};
use crate::site::session::{Page, ScopeError};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Steps of assembling one product, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    NavigateToPage,
    WaitForTitlePresence,
    ExtractAllFields,
    AssembleReviews,
    ReturnRecord,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::NavigateToPage => "navigate to page",
            Stage::WaitForTitlePresence => "wait for title",
            Stage::ExtractAllFields => "extract fields",
            Stage::AssembleReviews => "assemble reviews",
            Stage::ReturnRecord => "return record",
        })
    }
}

/// Why a product produced no record.
#[derive(Debug, Error)]
pub enum ProductError {
    /// No title showed up in time. Treated as "no product at this URL".
    #[error("no product found at {url}: title did not appear")]
    PageLoadTimeout { url: String },

    #[error("unexpected failure at {url} during {stage}: {source}")]
    Unexpected {
        url: String,
        stage: Stage,
        #[source]
        source: UnexpectedFault,
    },
}

impl ProductError {
    /// True when the browser session is gone and later products will fail too.
    pub fn is_disconnect(&self) -> bool {
        match self {
            ProductError::Unexpected { source: UnexpectedFault::Navigation(e), .. } => e.is_disconnect(),
            ProductError::Unexpected { source: UnexpectedFault::Lookup(e), .. } => e.is_disconnect(),
            ProductError::PageLoadTimeout { .. } => false,
        }
    }
}

/// Underlying cause of [`ProductError::Unexpected`].
#[derive(Debug, Error)]
pub enum UnexpectedFault {
    #[error(transparent)]
    Navigation(#[from] ScopeError),

    #[error(transparent)]
    Lookup(#[from] ResolverFault),
}

/// Builds one [`ProductRecord`] per product page.
///
/// The record is all or nothing: every field holds a value or its fallback,
/// or no record is produced.
pub struct ProductAssembler {
    resolver: Resolver,
    title_timeout: Duration,
}

impl ProductAssembler {
    pub fn new(resolver: Resolver, title_timeout: Duration) -> Self {
        Self { resolver, title_timeout }
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Navigates to `url` and assembles its record.
    pub async fn assemble<P: Page>(&self, page: &P, url: &str) -> Result<ProductRecord, ProductError> {
        enter(url, Stage::NavigateToPage);
        page.goto(url)
            .await
            .map_err(|e| unexpected(url, Stage::NavigateToPage, e))?;

        enter(url, Stage::WaitForTitlePresence);
        let title = self
            .resolver
            .text_within(page, &product::TITLE, self.title_timeout)
            .await
            .map_err(|e| unexpected(url, Stage::WaitForTitlePresence, e))?;
        if title.is_none() {
            return Err(ProductError::PageLoadTimeout { url: url.to_string() });
        }

        enter(url, Stage::ExtractAllFields);
        let mut record = self
            .fields(page)
            .await
            .map_err(|e| unexpected(url, Stage::ExtractAllFields, e))?;

        enter(url, Stage::AssembleReviews);
        record.reviews = ReviewAssembler::new(&self.resolver).assemble(page).await;

        enter(url, Stage::ReturnRecord);
        info!("Assembled '{}' with {} reviews", record.title, record.reviews.len());
        Ok(record)
    }

    /// Runs every field extractor. A field fault is logged and replaced by the
    /// field's fallback; only a lost session aborts.
    async fn fields<P: Page>(&self, page: &P) -> Result<ProductRecord, ResolverFault> {
        let r = &self.resolver;

        let title = self.field("title", fields::title(r, page).await)?;
        let price = self.field("price", fields::price(r, page).await)?;
        let categories = self.field("categories", fields::categories(r, page).await)?;
        let image_urls = self.field("image URLs", fields::image_urls(r, page).await)?;
        let description = self.field("description", fields::description(r, page).await)?;

        let summary = match fields::rating_summary(r, page).await {
            Ok(summary) => summary,
            Err(e) => {
                let sentinel = self.fault_sentinel("rating", e)?;
                fields::RatingSummary {
                    overall: Extraction::Missing(sentinel),
                    total_reviews: Extraction::Missing(sentinel),
                }
            }
        };

        let status = self.field("stock status", fields::inventory_status(r, page).await)?;
        let quantity = self.field("stock quantity", fields::inventory_quantity(r, page, &status).await)?;
        let sku = self.field("SKU", fields::sku(r, page).await)?;
        let checksum = self.field("checksum", fields::checksum(r, page).await)?;

        Ok(ProductRecord {
            title: title.or_label(fallback::TITLE),
            price: price.or_label(fallback::PRICE),
            categories: categories.or_else(|_| Vec::new()),
            image_urls: image_urls.or_else(|_| Vec::new()),
            description: description.or_label(fallback::DESCRIPTION),
            overall_rating: summary.overall.or_else(|_| OverallRating::NotAvailable),
            total_reviews: summary.total_reviews.map(ReviewCount::Count).or_else(|_| ReviewCount::NotAvailable),
            inventory_status: status.or_else(|_| InventoryStatus::Unknown),
            inventory_stock: stock_quantity(quantity),
            sku: sku.or_label(fallback::SKU),
            checksum: checksum.or_label(fallback::CHECKSUM),
            reviews: Vec::new(),
        })
    }

    /// Turns a field fault into a `NotFound` sentinel unless the session is gone.
    fn field<T>(
        &self,
        name: &str,
        result: Result<Extraction<T>, ResolverFault>,
    ) -> Result<Extraction<T>, ResolverFault> {
        match result {
            Ok(extraction) => Ok(extraction),
            Err(e) => self.fault_sentinel(name, e).map(Extraction::Missing),
        }
    }

    fn fault_sentinel(&self, name: &str, fault: ResolverFault) -> Result<Sentinel, ResolverFault> {
        if fault.is_disconnect() {
            return Err(fault);
        }
        self.resolver
            .log()
            .error(&format!("Error extracting {}: {}; using fallback", name, fault));
        Ok(Sentinel::NotFound)
    }
}

fn enter(url: &str, stage: Stage) {
    debug!("{}: {}", url, stage);
}

fn unexpected(url: &str, stage: Stage, source: impl Into<UnexpectedFault>) -> ProductError {
    ProductError::Unexpected { url: url.to_string(), stage, source: source.into() }
}

fn stock_quantity(quantity: Extraction<u32>) -> StockQuantity {
    quantity.map(StockQuantity::Units).or_else(|sentinel| match sentinel {
        Sentinel::NotFound => StockQuantity::NotAvailable,
        Sentinel::Unspecified | Sentinel::Unparseable => StockQuantity::Unspecified,
    })
}
