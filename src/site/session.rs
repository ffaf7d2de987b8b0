//! Page and element traits the extraction core runs against.
//!
//! The browser backend and the static snapshot backend both implement these,
//! which keeps the extractors testable without a running browser. Futures are
//! `?Send`: one session drives one page at a time on the calling task.

use crate::site::locators::Locator;
use async_trait::async_trait;
use thiserror::Error;

/// Failure reported by a page backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    /// The node behind a handle was replaced after the handle was obtained.
    #[error("stale element reference: {0}")]
    Stale(String),

    #[error("invalid locator {locator}: {reason}")]
    InvalidLocator { locator: String, reason: String },

    #[error("locator strategy not supported by this page: {0}")]
    Unsupported(String),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// The browser session or window is gone.
    #[error("browser session lost: {0}")]
    Disconnected(String),

    #[error("webdriver command failed: {0}")]
    Command(String),
}

impl ScopeError {
    pub fn is_stale(&self) -> bool {
        matches!(self, ScopeError::Stale(_))
    }

    /// True when no further command on this session can succeed.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, ScopeError::Disconnected(_))
    }
}

/// Anything elements can be looked up in: the whole page or one element.
#[async_trait(?Send)]
pub trait Scope {
    type Node: Element;

    /// Returns the first match, or `None` when nothing matches right now.
    async fn query(&self, locator: &Locator) -> Result<Option<Self::Node>, ScopeError>;

    /// Returns every current match in document order.
    async fn query_all(&self, locator: &Locator) -> Result<Vec<Self::Node>, ScopeError>;
}

/// Handle to a node on the current page. Invalidated by navigation.
#[async_trait(?Send)]
pub trait Element: Scope<Node = Self> + Sized {
    /// Rendered text of the element.
    async fn text(&self) -> Result<String, ScopeError>;

    async fn attr(&self, name: &str) -> Result<Option<String>, ScopeError>;
}

/// A browsable page.
#[async_trait(?Send)]
pub trait Page: Scope {
    /// Loads `url`, replacing the current document.
    async fn goto(&self, url: &str) -> Result<(), ScopeError>;
}
