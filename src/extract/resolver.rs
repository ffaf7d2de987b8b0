//! Element lookup that waits for slow rendering and survives stale handles.

use crate::config::Config;
use crate::extract::log::EventLog;
use crate::site::locators::Locator;
use crate::site::session::{Element, Scope, ScopeError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep, Instant};

/// Unexpected lookup failure. Missing elements are not faults.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolverFault {
    #[error("{locator} went stale {attempts} times in a row")]
    StaleExhausted { locator: String, attempts: u32 },

    #[error("lookup of {locator} failed: {source}")]
    Lookup {
        locator: String,
        #[source]
        source: ScopeError,
    },
}

impl ResolverFault {
    /// True when the browser session is gone.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, ResolverFault::Lookup { source, .. } if source.is_disconnect())
    }
}

/// Timing knobs for lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverSettings {
    /// How long `find_one` waits for an element to appear.
    pub timeout: Duration,
    /// Pause between presence checks.
    pub poll_interval: Duration,
    /// Full-lookup retries allowed after consecutive stale handles.
    pub stale_retries: u32,
    /// Pause before a stale retry.
    pub stale_backoff: Duration,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(500),
            stale_retries: 3,
            stale_backoff: Duration::from_secs(1),
        }
    }
}

impl ResolverSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeout: Duration::from_millis(config.element_timeout_ms),
            poll_interval: Duration::from_millis(config.poll_interval_ms.max(1)),
            stale_retries: config.stale_retries,
            stale_backoff: Duration::from_millis(config.stale_backoff_ms),
        }
    }

    /// Settings that never wait: one presence check, immediate retries.
    pub fn immediate() -> Self {
        Self {
            timeout: Duration::ZERO,
            poll_interval: Duration::from_millis(1),
            stale_retries: 3,
            stale_backoff: Duration::ZERO,
        }
    }
}

/// Resolves locators against a page or element scope.
#[derive(Clone)]
pub struct Resolver {
    settings: ResolverSettings,
    log: Arc<dyn EventLog + Send + Sync>,
}

impl Resolver {
    pub fn new(settings: ResolverSettings, log: Arc<dyn EventLog + Send + Sync>) -> Self {
        Self { settings, log }
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    pub fn log(&self) -> &dyn EventLog {
        self.log.as_ref()
    }

    /// First match, waiting up to the configured timeout.
    pub async fn find_one<S: Scope>(
        &self,
        scope: &S,
        locator: &Locator,
    ) -> Result<Option<S::Node>, ResolverFault> {
        self.find_one_within(scope, locator, self.settings.timeout).await
    }

    /// First match, waiting up to `timeout`. `None` once the wait runs out.
    ///
    /// A stale handle restarts the whole lookup after a short backoff, at most
    /// `stale_retries` times.
    pub async fn find_one_within<S: Scope>(
        &self,
        scope: &S,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Option<S::Node>, ResolverFault> {
        let mut stale = 0;
        self.locate(scope, locator, timeout, &mut stale).await
    }

    /// Lookup loop behind [`Resolver::find_one_within`]. `stale` counts the
    /// retries already spent by the caller.
    async fn locate<S: Scope>(
        &self,
        scope: &S,
        locator: &Locator,
        timeout: Duration,
        stale: &mut u32,
    ) -> Result<Option<S::Node>, ResolverFault> {
        loop {
            match self.poll(scope, locator, timeout).await {
                Ok(found) => return Ok(found),
                Err(e) if e.is_stale() => {
                    *stale += 1;
                    self.back_off(locator, *stale).await?;
                }
                Err(e) => return Err(self.fault(locator, e)),
            }
        }
    }

    /// Every current match. Never waits and never fails: faults are logged
    /// and yield an empty list.
    pub async fn find_many<S: Scope>(&self, scope: &S, locator: &Locator) -> Vec<S::Node> {
        match scope.query_all(locator).await {
            Ok(nodes) => nodes,
            Err(e) => {
                self.log.error(&format!("Error finding elements {}: {}", locator, e));
                Vec::new()
            }
        }
    }

    /// Text of the first match, waiting up to the configured timeout.
    pub async fn text_of<S: Scope>(
        &self,
        scope: &S,
        locator: &Locator,
    ) -> Result<Option<String>, ResolverFault> {
        self.text_within(scope, locator, self.settings.timeout).await
    }

    /// Text of the first match. A handle that goes stale between lookup and
    /// read triggers a fresh lookup under the same retry bound.
    pub async fn text_within<S: Scope>(
        &self,
        scope: &S,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Option<String>, ResolverFault> {
        let mut stale = 0;
        loop {
            let Some(node) = self.locate(scope, locator, timeout, &mut stale).await? else {
                return Ok(None);
            };

            match node.text().await {
                Ok(text) => return Ok(Some(text)),
                Err(e) if e.is_stale() => {
                    stale += 1;
                    self.back_off(locator, stale).await?;
                }
                Err(e) => return Err(self.fault(locator, e)),
            }
        }
    }

    /// Text of every current match, in document order.
    pub async fn texts_of<S: Scope>(
        &self,
        scope: &S,
        locator: &Locator,
    ) -> Result<Vec<String>, ResolverFault> {
        let mut texts = Vec::new();
        for node in self.find_many(scope, locator).await {
            texts.push(node.text().await.map_err(|e| self.fault(locator, e))?);
        }
        Ok(texts)
    }

    /// Attribute `name` of every current match that carries it.
    pub async fn attrs_of<S: Scope>(
        &self,
        scope: &S,
        locator: &Locator,
        name: &str,
    ) -> Result<Vec<String>, ResolverFault> {
        let mut values = Vec::new();
        for node in self.find_many(scope, locator).await {
            if let Some(value) = node.attr(name).await.map_err(|e| self.fault(locator, e))? {
                values.push(value);
            }
        }
        Ok(values)
    }

    /// Checks presence until found or `timeout` elapses.
    async fn poll<S: Scope>(
        &self,
        scope: &S,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Option<S::Node>, ScopeError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(node) = scope.query(locator).await? {
                return Ok(Some(node));
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            sleep(self.settings.poll_interval.min(deadline - now)).await;
        }
    }

    /// Waits before stale retry number `stale`, or gives up past the bound.
    async fn back_off(&self, locator: &Locator, stale: u32) -> Result<(), ResolverFault> {
        if stale > self.settings.stale_retries {
            let fault = ResolverFault::StaleExhausted { locator: locator.to_string(), attempts: stale };
            self.log.error(&fault.to_string());
            return Err(fault);
        }

        self.log.warn(&format!("Stale element encountered: {}. Retrying...", locator));
        sleep(self.settings.stale_backoff).await;
        Ok(())
    }

    fn fault(&self, locator: &Locator, source: ScopeError) -> ResolverFault {
        self.log.error(&format!("Unexpected error finding element {}: {}", locator, source));
        ResolverFault::Lookup { locator: locator.to_string(), source }
    }
}
