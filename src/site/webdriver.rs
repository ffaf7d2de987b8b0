//! Browser session over WebDriver using fantoccini.

use crate::config::Config;
use crate::site::locators::{Locator, Strategy};
use crate::site::session::{Element, Page, Scope, ScopeError};
use anyhow::{Context, Result};
use async_trait::async_trait;
use fantoccini::elements::Element as WebElement;
use fantoccini::error::CmdError;
use fantoccini::wd::TimeoutConfiguration;
use fantoccini::{Client, ClientBuilder};
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{debug, error, info};

/// Pause between failed session setup attempts.
const SETUP_RETRY_PAUSE: Duration = Duration::from_secs(2);

/// A live browser session. Owned by the command that opened it, which must
/// call [`Browser::close`] on every exit path.
pub struct Browser {
    client: Client,
}

impl Browser {
    /// Connects to the WebDriver server, retrying session creation.
    pub async fn open(config: &Config) -> Result<Self> {
        let attempts = config.driver_setup_retries.max(1);

        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut builder = ClientBuilder::native();
            builder.capabilities(capabilities(config.headless));

            match builder.connect(&config.webdriver_url).await {
                Ok(client) => {
                    client
                        .update_timeouts(TimeoutConfiguration::new(
                            None,
                            Some(Duration::from_secs(config.page_load_timeout_secs)),
                            None,
                        ))
                        .await
                        .context("Failed to set page load timeout")?;

                    info!("Browser session ready at {}", config.webdriver_url);
                    return Ok(Self { client });
                }
                Err(e) => {
                    error!("WebDriver setup attempt {} failed: {}", attempt, e);
                    if attempt >= attempts {
                        anyhow::bail!(
                            "Failed to set up WebDriver after {} attempts: {}",
                            attempts,
                            e
                        );
                    }
                    tokio::time::sleep(SETUP_RETRY_PAUSE).await;
                }
            }
        }
    }

    /// Ends the browser session.
    pub async fn close(self) -> Result<()> {
        debug!("Closing browser session");
        self.client.close().await.context("Failed to close browser session")
    }
}

#[async_trait(?Send)]
impl Page for Browser {
    async fn goto(&self, url: &str) -> Result<(), ScopeError> {
        debug!("GET {}", url);
        self.client.goto(url).await.map_err(|e| match classify(e) {
            ScopeError::Command(reason) => ScopeError::Navigation { url: url.to_string(), reason },
            other => other,
        })
    }
}

#[async_trait(?Send)]
impl Scope for Browser {
    type Node = WebNode;

    async fn query(&self, locator: &Locator) -> Result<Option<WebNode>, ScopeError> {
        match self.client.find(to_webdriver(locator)).await {
            Ok(element) => Ok(Some(WebNode(element))),
            Err(e) if e.is_no_such_element() => Ok(None),
            Err(e) => Err(classify(e)),
        }
    }

    async fn query_all(&self, locator: &Locator) -> Result<Vec<WebNode>, ScopeError> {
        let elements = self.client.find_all(to_webdriver(locator)).await.map_err(classify)?;
        Ok(elements.into_iter().map(WebNode).collect())
    }
}

/// Handle to an element in the browser.
#[derive(Debug, Clone)]
pub struct WebNode(WebElement);

#[async_trait(?Send)]
impl Scope for WebNode {
    type Node = WebNode;

    async fn query(&self, locator: &Locator) -> Result<Option<WebNode>, ScopeError> {
        match self.0.find(to_webdriver(locator)).await {
            Ok(element) => Ok(Some(WebNode(element))),
            Err(e) if e.is_no_such_element() => Ok(None),
            Err(e) => Err(classify(e)),
        }
    }

    async fn query_all(&self, locator: &Locator) -> Result<Vec<WebNode>, ScopeError> {
        let elements = self.0.find_all(to_webdriver(locator)).await.map_err(classify)?;
        Ok(elements.into_iter().map(WebNode).collect())
    }
}

#[async_trait(?Send)]
impl Element for WebNode {
    async fn text(&self) -> Result<String, ScopeError> {
        self.0.text().await.map_err(classify)
    }

    async fn attr(&self, name: &str) -> Result<Option<String>, ScopeError> {
        self.0.attr(name).await.map_err(classify)
    }
}

/// Chrome capabilities for a new session.
fn capabilities(headless: bool) -> Map<String, Value> {
    let mut args = vec!["--disable-gpu", "--window-size=1280,1024"];
    if headless {
        args.push("--headless");
    }

    let mut caps = Map::new();
    caps.insert("browserName".to_string(), json!("chrome"));
    caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
    caps
}

fn to_webdriver(locator: &Locator) -> fantoccini::Locator<'static> {
    match locator.strategy {
        Strategy::Css => fantoccini::Locator::Css(locator.pattern),
        Strategy::XPath => fantoccini::Locator::XPath(locator.pattern),
    }
}

/// Maps a WebDriver failure onto the categories the resolver acts on.
fn classify(err: CmdError) -> ScopeError {
    if err.is_stale_element_reference() {
        ScopeError::Stale(err.to_string())
    } else if err.is_no_such_window() || err.is_invalid_session_id() || matches!(err, CmdError::Lost(_)) {
        ScopeError::Disconnected(err.to_string())
    } else {
        ScopeError::Command(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fantoccini::error::{ErrorStatus, WebDriver};

    #[test]
    fn test_capabilities_headless() {
        let caps = capabilities(true);
        assert_eq!(caps["browserName"], "chrome");

        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(args.contains(&json!("--headless")));
    }

    #[test]
    fn test_capabilities_headed() {
        let caps = capabilities(false);
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(!args.contains(&json!("--headless")));
    }

    #[test]
    fn test_locator_conversion() {
        assert!(matches!(
            to_webdriver(&Locator::css("h1.title")),
            fantoccini::Locator::Css("h1.title")
        ));
        assert!(matches!(
            to_webdriver(&Locator::xpath("//h1")),
            fantoccini::Locator::XPath("//h1")
        ));
    }

    fn standard(status: ErrorStatus) -> CmdError {
        CmdError::Standard(WebDriver::new(status, "from driver"))
    }

    #[test]
    fn test_classify_stale() {
        assert!(classify(standard(ErrorStatus::StaleElementReference)).is_stale());
    }

    #[test]
    fn test_classify_lost_session() {
        assert!(classify(standard(ErrorStatus::NoSuchWindow)).is_disconnect());
        assert!(classify(standard(ErrorStatus::InvalidSessionId)).is_disconnect());

        let lost = CmdError::Lost(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset"));
        assert!(classify(lost).is_disconnect());
    }

    #[test]
    fn test_no_such_element_is_a_miss() {
        let miss = standard(ErrorStatus::NoSuchElement);
        assert!(miss.is_no_such_element());
        assert!(matches!(classify(miss), ScopeError::Command(_)));
    }

    #[test]
    fn test_classify_other_errors_as_command() {
        assert!(matches!(classify(CmdError::WaitTimeout), ScopeError::Command(_)));
    }
}
