//! In-memory storefront built from saved HTML.
//!
//! Serves the `extract` command (offline extraction of a saved product page)
//! and gives the tests a deterministic page to run the extractors against.

use crate::site::locators::{Locator, Strategy};
use crate::site::session::{Element, Page, Scope, ScopeError};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::cell::RefCell;
use std::collections::HashMap;
use tracing::{debug, trace};

/// A fixed set of pages keyed by URL.
pub struct StaticSite {
    pages: HashMap<String, String>,
    current: RefCell<Html>,
}

impl StaticSite {
    /// Creates a site with no pages.
    pub fn new() -> Self {
        Self { pages: HashMap::new(), current: RefCell::new(Html::parse_document("")) }
    }

    /// Creates a site serving a single page.
    pub fn single(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self::new().with_page(url, html)
    }

    /// Adds a page.
    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }

    /// Number of pages served.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl Default for StaticSite {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl Page for StaticSite {
    async fn goto(&self, url: &str) -> Result<(), ScopeError> {
        let document = match self.pages.get(url) {
            Some(html) => Html::parse_document(html),
            None => {
                // A browser would render the site's empty 404 page
                debug!("No snapshot for {}, serving empty page", url);
                Html::parse_document("")
            }
        };
        *self.current.borrow_mut() = document;
        Ok(())
    }
}

#[async_trait(?Send)]
impl Scope for StaticSite {
    type Node = HtmlNode;

    async fn query(&self, locator: &Locator) -> Result<Option<HtmlNode>, ScopeError> {
        let selector = compile(locator)?;
        let document = self.current.borrow();
        let node = document.select(&selector).next().map(HtmlNode::capture);
        Ok(node)
    }

    async fn query_all(&self, locator: &Locator) -> Result<Vec<HtmlNode>, ScopeError> {
        let selector = compile(locator)?;
        let document = self.current.borrow();
        let nodes = document.select(&selector).map(HtmlNode::capture).collect();
        Ok(nodes)
    }
}

/// Detached copy of one element and its subtree.
#[derive(Debug, Clone)]
pub struct HtmlNode {
    fragment: Html,
}

impl HtmlNode {
    fn capture(element: ElementRef<'_>) -> Self {
        Self { fragment: Html::parse_fragment(&element.html()) }
    }

    fn element(&self) -> Result<ElementRef<'_>, ScopeError> {
        self.fragment
            .root_element()
            .child_elements()
            .next()
            .ok_or_else(|| ScopeError::Stale("captured element is empty".to_string()))
    }
}

#[async_trait(?Send)]
impl Scope for HtmlNode {
    type Node = HtmlNode;

    async fn query(&self, locator: &Locator) -> Result<Option<HtmlNode>, ScopeError> {
        let selector = compile(locator)?;
        let element = self.element()?;
        let node = element.select(&selector).next().map(HtmlNode::capture);
        Ok(node)
    }

    async fn query_all(&self, locator: &Locator) -> Result<Vec<HtmlNode>, ScopeError> {
        let selector = compile(locator)?;
        let element = self.element()?;
        let nodes = element.select(&selector).map(HtmlNode::capture).collect();
        Ok(nodes)
    }
}

#[async_trait(?Send)]
impl Element for HtmlNode {
    async fn text(&self) -> Result<String, ScopeError> {
        let raw: String = self.element()?.text().collect();
        Ok(normalize_whitespace(&raw))
    }

    async fn attr(&self, name: &str) -> Result<Option<String>, ScopeError> {
        Ok(self.element()?.value().attr(name).map(String::from))
    }
}

fn compile(locator: &Locator) -> Result<Selector, ScopeError> {
    trace!("Compiling {}", locator);
    match locator.strategy {
        Strategy::Css => Selector::parse(locator.pattern).map_err(|e| ScopeError::InvalidLocator {
            locator: locator.to_string(),
            reason: e.to_string(),
        }),
        Strategy::XPath => Err(ScopeError::Unsupported(locator.to_string())),
    }
}

/// Collapses runs of whitespace the way a browser renders text.
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
