//! Resilient extraction of product records from a loaded page.
//!
//! Lookups go through the [`Resolver`], which tolerates slow rendering and
//! stale element handles. Each field extractor yields an [`Extraction`]; the
//! assemblers turn those into records, substituting the values from
//! [`fallback`] so a record is always complete.

pub mod fields;
pub mod log;
pub mod product;
pub mod resolver;
pub mod reviews;

#[cfg(test)]
pub(crate) mod testing;

pub use log::{EventLog, MemoryLog, TracingLog};
pub use product::{ProductAssembler, ProductError, Stage, UnexpectedFault};
pub use resolver::{Resolver, ResolverFault, ResolverSettings};
pub use reviews::ReviewAssembler;

/// Why a field has no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentinel {
    /// No element matched.
    NotFound,
    /// An element matched but its content did not parse.
    Unparseable,
    /// The page says the value exists without stating it.
    Unspecified,
}

/// Outcome of one field extractor.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction<T> {
    Found(T),
    Missing(Sentinel),
}

impl<T> Extraction<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Extraction::Found(_))
    }

    pub fn found(self) -> Option<T> {
        match self {
            Extraction::Found(value) => Some(value),
            Extraction::Missing(_) => None,
        }
    }

    pub fn sentinel(&self) -> Option<Sentinel> {
        match self {
            Extraction::Found(_) => None,
            Extraction::Missing(sentinel) => Some(*sentinel),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Extraction<U> {
        match self {
            Extraction::Found(value) => Extraction::Found(f(value)),
            Extraction::Missing(sentinel) => Extraction::Missing(sentinel),
        }
    }

    /// Value, or the fallback chosen for the sentinel.
    pub fn or_else(self, fallback: impl FnOnce(Sentinel) -> T) -> T {
        match self {
            Extraction::Found(value) => value,
            Extraction::Missing(sentinel) => fallback(sentinel),
        }
    }

    /// Found when `value` is present, otherwise `Unparseable`.
    pub fn parsed(value: Option<T>) -> Self {
        value.map_or(Extraction::Missing(Sentinel::Unparseable), Extraction::Found)
    }
}

impl<T: Into<String>> Extraction<T> {
    /// Value as a string, or a fixed fallback label.
    pub fn or_label(self, label: &str) -> String {
        self.map(Into::into).or_else(|_| label.to_string())
    }
}

/// Fallback values written when a field cannot be extracted.
pub mod fallback {
    pub const TITLE: &str = "Untitled Product";
    pub const PRICE: &str = "Price Unavailable";
    pub const DESCRIPTION: &str = "No Description Available";
    pub const SKU: &str = "SKU Unavailable";
    pub const CHECKSUM: &str = "N/A";
    // Categories, image URLs and reviews fall back to empty lists.
    // Overall rating, review count, stock status and quantity fall back to
    // the label variants of their types in `site::models`.

    pub const REVIEWER: &str = "Anonymous";
    pub const REVIEW_TITLE: &str = "Untitled Review";
    pub const REVIEW_BODY: &str = "No review text";
    pub const REVIEW_CHECKSUM: &str = "No Checksum";
}
