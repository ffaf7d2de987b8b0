//! Scriptable page doubles for extractor tests.

use crate::site::locators::Locator;
use crate::site::session::{Element, Page, Scope, ScopeError};
use async_trait::async_trait;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

/// Element double with canned text, attributes and children keyed by
/// locator pattern.
#[derive(Debug, Clone)]
pub struct FakeNode {
    text: Result<String, ScopeError>,
    attrs: HashMap<&'static str, String>,
    children: HashMap<&'static str, Vec<FakeNode>>,
    fault: Option<ScopeError>,
}

impl FakeNode {
    pub fn new() -> Self {
        Self {
            text: Ok(String::new()),
            attrs: HashMap::new(),
            children: HashMap::new(),
            fault: None,
        }
    }

    pub fn with_text(text: &str) -> Self {
        Self { text: Ok(text.to_string()), ..Self::new() }
    }

    /// Reading this node's text fails with `err`.
    pub fn unreadable(err: ScopeError) -> Self {
        Self { text: Err(err), ..Self::new() }
    }

    pub fn attr(mut self, name: &'static str, value: &str) -> Self {
        self.attrs.insert(name, value.to_string());
        self
    }

    pub fn child(mut self, locator: Locator, node: FakeNode) -> Self {
        self.children.entry(locator.pattern).or_default().push(node);
        self
    }

    /// Every lookup inside this node fails with `err`.
    pub fn failing(mut self, err: ScopeError) -> Self {
        self.fault = Some(err);
        self
    }

    fn lookup(&self, locator: &Locator) -> Result<Vec<FakeNode>, ScopeError> {
        if let Some(err) = &self.fault {
            return Err(err.clone());
        }
        Ok(self.children.get(locator.pattern).cloned().unwrap_or_default())
    }
}

#[async_trait(?Send)]
impl Scope for FakeNode {
    type Node = FakeNode;

    async fn query(&self, locator: &Locator) -> Result<Option<FakeNode>, ScopeError> {
        Ok(self.lookup(locator)?.into_iter().next())
    }

    async fn query_all(&self, locator: &Locator) -> Result<Vec<FakeNode>, ScopeError> {
        self.lookup(locator)
    }
}

#[async_trait(?Send)]
impl Element for FakeNode {
    async fn text(&self) -> Result<String, ScopeError> {
        self.text.clone()
    }

    async fn attr(&self, name: &str) -> Result<Option<String>, ScopeError> {
        Ok(self.attrs.get(name).cloned())
    }
}

type Scripted = Result<Option<FakeNode>, ScopeError>;

/// Page double. Serves a [`FakeNode`] tree per URL and can script the
/// answers of individual lookups ahead of the tree.
pub struct FakePage {
    pages: HashMap<String, FakeNode>,
    current: RefCell<FakeNode>,
    script: RefCell<HashMap<&'static str, VecDeque<Scripted>>>,
    queries: RefCell<Vec<&'static str>>,
    navigation_error: Option<ScopeError>,
}

impl FakePage {
    /// A page already showing `root`.
    pub fn showing(root: FakeNode) -> Self {
        Self {
            pages: HashMap::new(),
            current: RefCell::new(root),
            script: RefCell::new(HashMap::new()),
            queries: RefCell::new(Vec::new()),
            navigation_error: None,
        }
    }

    pub fn with_page(mut self, url: &str, root: FakeNode) -> Self {
        self.pages.insert(url.to_string(), root);
        self
    }

    pub fn failing_navigation(mut self, err: ScopeError) -> Self {
        self.navigation_error = Some(err);
        self
    }

    /// Queues answers for `query` on `locator`, consumed before the tree.
    pub fn script(self, locator: Locator, answers: Vec<Scripted>) -> Self {
        self.script.borrow_mut().entry(locator.pattern).or_default().extend(answers);
        self
    }

    /// Number of lookups made for `locator`.
    pub fn lookups(&self, locator: Locator) -> usize {
        self.queries.borrow().iter().filter(|p| **p == locator.pattern).count()
    }
}

#[async_trait(?Send)]
impl Page for FakePage {
    async fn goto(&self, url: &str) -> Result<(), ScopeError> {
        if let Some(err) = &self.navigation_error {
            return Err(err.clone());
        }
        let root = self.pages.get(url).cloned().unwrap_or_else(FakeNode::new);
        *self.current.borrow_mut() = root;
        Ok(())
    }
}

#[async_trait(?Send)]
impl Scope for FakePage {
    type Node = FakeNode;

    async fn query(&self, locator: &Locator) -> Result<Option<FakeNode>, ScopeError> {
        self.queries.borrow_mut().push(locator.pattern);
        let scripted = self.script.borrow_mut().get_mut(locator.pattern).and_then(VecDeque::pop_front);
        match scripted {
            Some(answer) => answer,
            None => {
                let root = self.current.borrow().clone();
                root.query(locator).await
            }
        }
    }

    async fn query_all(&self, locator: &Locator) -> Result<Vec<FakeNode>, ScopeError> {
        self.queries.borrow_mut().push(locator.pattern);
        let root = self.current.borrow().clone();
        root.query_all(locator).await
    }
}
