//! Per-field extraction rules.
//!
//! Each extractor resolves its locator, parses what it finds and reports an
//! [`Extraction`]. A missing element is a sentinel, not an error; only
//! unexpected resolver faults come back as `Err`.

use crate::extract::resolver::{Resolver, ResolverFault};
use crate::extract::{Extraction, Sentinel};
use crate::site::locators::{product, review, Locator};
use crate::site::models::{InventoryStatus, OverallRating, ReviewDate};
use crate::site::session::Scope;
use regex_lite::Regex;
use std::time::Duration;

const SKU_PREFIX: &str = "SKU: ";
const MAX_STARS: u8 = 5;

/// Looks up the first match of `locator` and parses its text.
///
/// `NotFound` when nothing matches within the resolver timeout, `Unparseable`
/// when `parse` rejects the text.
pub async fn extract<S, T, F>(
    resolver: &Resolver,
    scope: &S,
    locator: &Locator,
    parse: F,
) -> Result<Extraction<T>, ResolverFault>
where
    S: Scope,
    F: FnOnce(&str) -> Option<T>,
{
    let timeout = resolver.settings().timeout;
    extract_within(resolver, scope, locator, timeout, parse).await
}

/// [`extract`] with an explicit presence timeout.
pub async fn extract_within<S, T, F>(
    resolver: &Resolver,
    scope: &S,
    locator: &Locator,
    timeout: Duration,
    parse: F,
) -> Result<Extraction<T>, ResolverFault>
where
    S: Scope,
    F: FnOnce(&str) -> Option<T>,
{
    match resolver.text_within(scope, locator, timeout).await? {
        Some(text) => Ok(Extraction::parsed(parse(&text))),
        None => Ok(Extraction::Missing(Sentinel::NotFound)),
    }
}

/// Trimmed text, rejecting blanks.
fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Texts of every match, blanks dropped. `NotFound` when none remain.
async fn extract_list<S: Scope>(
    resolver: &Resolver,
    scope: &S,
    locator: &Locator,
) -> Result<Extraction<Vec<String>>, ResolverFault> {
    let texts: Vec<String> = resolver
        .texts_of(scope, locator)
        .await?
        .iter()
        .filter_map(|text| non_empty(text))
        .collect();
    Ok(found_unless_empty(texts))
}

fn found_unless_empty(values: Vec<String>) -> Extraction<Vec<String>> {
    if values.is_empty() {
        Extraction::Missing(Sentinel::NotFound)
    } else {
        Extraction::Found(values)
    }
}

pub async fn title<S: Scope>(resolver: &Resolver, page: &S) -> Result<Extraction<String>, ResolverFault> {
    extract(resolver, page, &product::TITLE, non_empty).await
}

/// Price text with its currency symbol.
pub async fn price<S: Scope>(resolver: &Resolver, page: &S) -> Result<Extraction<String>, ResolverFault> {
    extract(resolver, page, &product::PRICE, non_empty).await
}

pub async fn categories<S: Scope>(
    resolver: &Resolver,
    page: &S,
) -> Result<Extraction<Vec<String>>, ResolverFault> {
    extract_list(resolver, page, &product::CATEGORIES).await
}

pub async fn image_urls<S: Scope>(
    resolver: &Resolver,
    page: &S,
) -> Result<Extraction<Vec<String>>, ResolverFault> {
    let urls = resolver
        .attrs_of(page, &product::IMAGES, product::IMAGE_SOURCE_ATTR)
        .await?
        .into_iter()
        .filter(|url| !url.trim().is_empty())
        .collect();
    Ok(found_unless_empty(urls))
}

pub async fn description<S: Scope>(
    resolver: &Resolver,
    page: &S,
) -> Result<Extraction<String>, ResolverFault> {
    extract(resolver, page, &product::DESCRIPTION, non_empty).await
}

/// Overall rating and review count, read from the same summary line.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingSummary {
    pub overall: Extraction<OverallRating>,
    pub total_reviews: Extraction<u32>,
}

impl RatingSummary {
    fn missing(sentinel: Sentinel) -> Self {
        Self {
            overall: Extraction::Missing(sentinel),
            total_reviews: Extraction::Missing(sentinel),
        }
    }

    /// Parses "4.5 out of 5 stars, 128 reviews". Either half may be absent.
    pub fn parse(text: &str) -> Self {
        Self {
            overall: Extraction::parsed(parse_overall_rating(text)),
            total_reviews: Extraction::parsed(parse_review_count(text)),
        }
    }
}

fn parse_overall_rating(text: &str) -> Option<OverallRating> {
    let re = Regex::new(r"(\d+(?:\.\d+)?) out of 5 stars").ok()?;
    let score = re.captures(text)?.get(1)?.as_str();
    OverallRating::from_score(score)
}

fn parse_review_count(text: &str) -> Option<u32> {
    let re = Regex::new(r"(\d+) reviews").ok()?;
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

pub async fn rating_summary<S: Scope>(
    resolver: &Resolver,
    page: &S,
) -> Result<RatingSummary, ResolverFault> {
    match resolver.text_of(page, &product::RATING).await? {
        Some(text) => Ok(RatingSummary::parse(&text)),
        None => Ok(RatingSummary::missing(Sentinel::NotFound)),
    }
}

/// Stock badge state. Several elements share the badge styling, so the first
/// whose text is a known badge wins.
///
/// `NotFound` when no candidate exists, `Unparseable` when none reads as a
/// known badge.
pub async fn inventory_status<S: Scope>(
    resolver: &Resolver,
    page: &S,
) -> Result<Extraction<InventoryStatus>, ResolverFault> {
    let candidates = resolver.texts_of(page, &product::STOCK_STATUS).await?;
    if candidates.is_empty() {
        return Ok(Extraction::Missing(Sentinel::NotFound));
    }

    let status = candidates.iter().find_map(|text| InventoryStatus::from_badge(text));
    Ok(Extraction::parsed(status))
}

/// Units available for a given stock state.
///
/// Out of stock is 0 without reading the page. In stock reads the secondary
/// quantity text; a missing or number-free text is `Unspecified`. Any other
/// state is `NotFound`.
pub async fn inventory_quantity<S: Scope>(
    resolver: &Resolver,
    page: &S,
    status: &Extraction<InventoryStatus>,
) -> Result<Extraction<u32>, ResolverFault> {
    match status {
        Extraction::Found(InventoryStatus::OutOfStock) => Ok(Extraction::Found(0)),
        Extraction::Found(InventoryStatus::InStock) => {
            let quantity = resolver
                .text_of(page, &product::STOCK_QUANTITY)
                .await?
                .and_then(|text| parse_leading_number(&text));
            Ok(quantity.map_or(Extraction::Missing(Sentinel::Unspecified), Extraction::Found))
        }
        _ => Ok(Extraction::Missing(Sentinel::NotFound)),
    }
}

/// First run of digits in `text`.
fn parse_leading_number(text: &str) -> Option<u32> {
    let re = Regex::new(r"(\d+)").ok()?;
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

/// SKU from the first muted paragraph that reads "SKU: ...". Reviewer lines
/// share the styling, so candidates without the prefix are skipped.
pub async fn sku<S: Scope>(resolver: &Resolver, page: &S) -> Result<Extraction<String>, ResolverFault> {
    let candidates = resolver.texts_of(page, &product::SKU).await?;
    if candidates.is_empty() {
        return Ok(Extraction::Missing(Sentinel::NotFound));
    }

    let sku = candidates.iter().find_map(|text| parse_sku(text));
    Ok(Extraction::parsed(sku))
}

fn parse_sku(text: &str) -> Option<String> {
    non_empty(text.trim().strip_prefix(SKU_PREFIX)?)
}

/// Product checksum. Review blocks carry checksum elements with the same
/// styling; those are not the product's.
pub async fn checksum<S: Scope>(resolver: &Resolver, page: &S) -> Result<Extraction<String>, ResolverFault> {
    let mut in_reviews = Vec::new();
    for block in resolver.find_many(page, &review::BLOCK).await {
        in_reviews.extend(resolver.texts_of(&block, &review::CHECKSUM).await?);
    }

    let candidates = resolver.texts_of(page, &product::CHECKSUM).await?;
    let first = candidates.into_iter().find(|text| !in_reviews.contains(text));
    match first {
        Some(text) => Ok(Extraction::parsed(non_empty(&text))),
        None => Ok(Extraction::Missing(Sentinel::NotFound)),
    }
}

async fn first_text<S: Scope>(
    resolver: &Resolver,
    scope: &S,
    locator: &Locator,
) -> Result<Extraction<String>, ResolverFault> {
    let first = resolver.texts_of(scope, locator).await?.into_iter().next();
    match first {
        Some(text) => Ok(Extraction::parsed(non_empty(&text))),
        None => Ok(Extraction::Missing(Sentinel::NotFound)),
    }
}

// Review fields. The block is already rendered, so lookups inside it check
// presence once instead of waiting.

/// Reviewer from "By Jane Doe on 3/14/2024".
pub async fn reviewer<S: Scope>(resolver: &Resolver, block: &S) -> Result<Extraction<String>, ResolverFault> {
    extract_within(resolver, block, &review::REVIEWER, Duration::ZERO, parse_reviewer).await
}

fn parse_reviewer(text: &str) -> Option<String> {
    let re = Regex::new(r"By (.+?) on").ok()?;
    non_empty(re.captures(text)?.get(1)?.as_str())
}

/// Number of filled stars, capped at 5.
pub async fn review_stars<S: Scope>(resolver: &Resolver, block: &S) -> u8 {
    let stars = resolver.find_many(block, &review::STARS).await.len();
    u8::try_from(stars).unwrap_or(MAX_STARS).min(MAX_STARS)
}

pub async fn review_title<S: Scope>(
    resolver: &Resolver,
    block: &S,
) -> Result<Extraction<String>, ResolverFault> {
    extract_within(resolver, block, &review::TITLE, Duration::ZERO, non_empty).await
}

/// Date from the last paragraph of the block. A block with a single
/// paragraph has no date line.
pub async fn review_date<S: Scope>(
    resolver: &Resolver,
    block: &S,
) -> Result<Extraction<ReviewDate>, ResolverFault> {
    let paragraphs = resolver.texts_of(block, &review::PARAGRAPHS).await?;
    match paragraphs.last() {
        Some(last) if paragraphs.len() > 1 => Ok(Extraction::parsed(parse_review_date(last))),
        _ => Ok(Extraction::Missing(Sentinel::NotFound)),
    }
}

fn parse_review_date(text: &str) -> Option<ReviewDate> {
    let re = Regex::new(r"on (\d{1,2}/\d{1,2}/\d{4})").ok()?;
    ReviewDate::parse(re.captures(text)?.get(1)?.as_str())
}

pub async fn review_body<S: Scope>(
    resolver: &Resolver,
    block: &S,
) -> Result<Extraction<String>, ResolverFault> {
    extract_within(resolver, block, &review::BODY, Duration::ZERO, non_empty).await
}

pub async fn review_checksum<S: Scope>(
    resolver: &Resolver,
    block: &S,
) -> Result<Extraction<String>, ResolverFault> {
    first_text(resolver, block, &review::CHECKSUM).await
}
