//! Product and review records as written to the output JSON.
//!
//! Every field always holds either a real value or a fixed fallback, so a
//! record never has a missing key. Typed fields that can fall back serialize
//! as their value or as the fallback label and parse back from either.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One scraped product page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde(rename = "Product Title")]
    pub title: String,
    /// Displayed price, currency symbol included.
    #[serde(rename = "Price")]
    pub price: String,
    #[serde(rename = "Categories")]
    pub categories: Vec<String>,
    #[serde(rename = "Product Image URLs")]
    pub image_urls: Vec<String>,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Overall Rating")]
    pub overall_rating: OverallRating,
    #[serde(rename = "Total Reviews")]
    pub total_reviews: ReviewCount,
    #[serde(rename = "Inventory Status")]
    pub inventory_status: InventoryStatus,
    #[serde(rename = "Inventory Stock Available")]
    pub inventory_stock: StockQuantity,
    #[serde(rename = "SKU")]
    pub sku: String,
    #[serde(rename = "Product Checksum")]
    pub checksum: String,
    #[serde(rename = "Customer Reviews")]
    pub reviews: Vec<ReviewRecord>,
}

impl ProductRecord {
    /// Star score if the page showed one.
    pub fn stars(&self) -> Option<f32> {
        self.overall_rating.score()
    }
}

/// One customer review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// Position of the review block on its product page, starting at 1.
    #[serde(rename = "Review ID")]
    pub id: u32,
    #[serde(rename = "Name")]
    pub name: String,
    /// Filled stars, 0-5.
    #[serde(rename = "Rating")]
    pub rating: u8,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Date")]
    pub date: ReviewDate,
    #[serde(rename = "Review Body")]
    pub body: String,
    #[serde(rename = "Review Checksum")]
    pub checksum: String,
}

const NOT_AVAILABLE: &str = "N/A";

/// Overall rating rendered as "4.5/5 Stars".
#[derive(Debug, Clone, PartialEq)]
pub enum OverallRating {
    /// Score exactly as displayed ("4.5"), validated to lie in 0-5.
    Stars(String),
    NotAvailable,
}

impl OverallRating {
    /// Builds a rating from displayed score text. Rejects scores outside 0-5.
    pub fn from_score(score: &str) -> Option<Self> {
        let value: f32 = score.trim().parse().ok()?;
        (0.0..=5.0).contains(&value).then(|| Self::Stars(score.trim().to_string()))
    }

    pub fn score(&self) -> Option<f32> {
        match self {
            Self::Stars(score) => score.parse().ok(),
            Self::NotAvailable => None,
        }
    }
}

impl fmt::Display for OverallRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stars(score) => write!(f, "{}/5 Stars", score),
            Self::NotAvailable => f.write_str(NOT_AVAILABLE),
        }
    }
}

impl Serialize for OverallRating {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for OverallRating {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        if text == NOT_AVAILABLE {
            return Ok(Self::NotAvailable);
        }
        text.strip_suffix("/5 Stars")
            .and_then(Self::from_score)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid overall rating: {}", text)))
    }
}

/// Helper shape for fields that hold a number or a fallback label.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum NumberOrLabel {
    Number(u32),
    Label(String),
}

/// Total review count shown in the rating summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "NumberOrLabel", into = "NumberOrLabel")]
pub enum ReviewCount {
    Count(u32),
    NotAvailable,
}

impl From<ReviewCount> for NumberOrLabel {
    fn from(count: ReviewCount) -> Self {
        match count {
            ReviewCount::Count(n) => NumberOrLabel::Number(n),
            ReviewCount::NotAvailable => NumberOrLabel::Label(NOT_AVAILABLE.to_string()),
        }
    }
}

impl TryFrom<NumberOrLabel> for ReviewCount {
    type Error = String;

    fn try_from(value: NumberOrLabel) -> Result<Self, Self::Error> {
        match value {
            NumberOrLabel::Number(n) => Ok(ReviewCount::Count(n)),
            NumberOrLabel::Label(label) if label == NOT_AVAILABLE => Ok(ReviewCount::NotAvailable),
            NumberOrLabel::Label(label) => Err(format!("invalid review count: {}", label)),
        }
    }
}

/// Stock badge state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryStatus {
    #[serde(rename = "In stock")]
    InStock,
    #[serde(rename = "Out of stock")]
    OutOfStock,
    #[serde(rename = "Stock Status Unavailable")]
    Unknown,
}

impl InventoryStatus {
    /// Matches the badge text exactly (after trimming).
    pub fn from_badge(text: &str) -> Option<Self> {
        match text.trim() {
            "In stock" => Some(Self::InStock),
            "Out of stock" => Some(Self::OutOfStock),
            _ => None,
        }
    }
}

impl fmt::Display for InventoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::InStock => "In stock",
            Self::OutOfStock => "Out of stock",
            Self::Unknown => "Stock Status Unavailable",
        })
    }
}

const UNSPECIFIED_STOCK: &str = "Unspecified Stock";

/// Units available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "NumberOrLabel", into = "NumberOrLabel")]
pub enum StockQuantity {
    /// Known count; 0 when out of stock.
    Units(u32),
    /// In stock, but the page gives no count.
    Unspecified,
    /// Stock status itself is unknown.
    NotAvailable,
}

impl From<StockQuantity> for NumberOrLabel {
    fn from(quantity: StockQuantity) -> Self {
        match quantity {
            StockQuantity::Units(n) => NumberOrLabel::Number(n),
            StockQuantity::Unspecified => NumberOrLabel::Label(UNSPECIFIED_STOCK.to_string()),
            StockQuantity::NotAvailable => NumberOrLabel::Label(NOT_AVAILABLE.to_string()),
        }
    }
}

impl TryFrom<NumberOrLabel> for StockQuantity {
    type Error = String;

    fn try_from(value: NumberOrLabel) -> Result<Self, Self::Error> {
        match value {
            NumberOrLabel::Number(n) => Ok(StockQuantity::Units(n)),
            NumberOrLabel::Label(label) => match label.as_str() {
                UNSPECIFIED_STOCK => Ok(StockQuantity::Unspecified),
                NOT_AVAILABLE => Ok(StockQuantity::NotAvailable),
                _ => Err(format!("invalid stock quantity: {}", label)),
            },
        }
    }
}

const UNKNOWN_DATE: &str = "Unknown Date";
const DATE_FORMAT: &str = "%m/%d/%Y";

/// Review date, rendered the way the storefront shows it ("3/14/2024").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDate {
    On(NaiveDate),
    Unknown,
}

impl ReviewDate {
    /// Parses "M/D/YYYY".
    pub fn parse(text: &str) -> Option<Self> {
        NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).ok().map(Self::On)
    }
}

impl fmt::Display for ReviewDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On(date) => write!(f, "{}", date.format("%-m/%-d/%Y")),
            Self::Unknown => f.write_str(UNKNOWN_DATE),
        }
    }
}

impl Serialize for ReviewDate {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ReviewDate {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        if text == UNKNOWN_DATE {
            return Ok(Self::Unknown);
        }
        Self::parse(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid review date: {}", text)))
    }
}
