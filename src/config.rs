//! Configuration management with TOML, environment variables, and CLI overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Storefront root, without a trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// WebDriver endpoint (chromedriver, geckodriver, Selenium)
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Run the browser without a window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Attempts at creating a browser session
    #[serde(default = "default_driver_setup_retries")]
    pub driver_setup_retries: u32,

    /// Browser page-load timeout in seconds
    #[serde(default = "default_page_load_timeout_secs")]
    pub page_load_timeout_secs: u64,

    /// How long to wait for the product title before giving up on a page
    #[serde(default = "default_title_timeout_secs")]
    pub title_timeout_secs: u64,

    /// How long to wait for any other element
    #[serde(default = "default_element_timeout_ms")]
    pub element_timeout_ms: u64,

    /// Pause between presence checks
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Lookup retries after stale element references
    #[serde(default = "default_stale_retries")]
    pub stale_retries: u32,

    /// Pause before each stale retry
    #[serde(default = "default_stale_backoff_ms")]
    pub stale_backoff_ms: u64,

    /// Base delay between product pages in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Random jitter added to delay (0 to this value)
    #[serde(default = "default_delay_jitter_ms")]
    pub delay_jitter_ms: u64,

    /// First product ID to scrape (inclusive)
    #[serde(default = "default_first_id")]
    pub first_id: u32,

    /// Last product ID to scrape (inclusive)
    #[serde(default = "default_last_id")]
    pub last_id: u32,

    /// JSON file the batch is written to
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// JSON file a listing crawl is written to
    #[serde(default = "default_crawl_output")]
    pub crawl_output: PathBuf,

    /// Optional log file, in addition to the console
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Format for records printed to stdout
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_base_url() -> String {
    "https://hiring-xry4.onrender.com".to_string()
}

fn default_webdriver_url() -> String {
    "http://localhost:9515".to_string()
}

fn default_headless() -> bool {
    true
}

fn default_driver_setup_retries() -> u32 {
    3
}

fn default_page_load_timeout_secs() -> u64 {
    30
}

fn default_title_timeout_secs() -> u64 {
    5
}

fn default_element_timeout_ms() -> u64 {
    10_000
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_stale_retries() -> u32 {
    3
}

fn default_stale_backoff_ms() -> u64 {
    1000
}

fn default_delay_ms() -> u64 {
    1000
}

fn default_delay_jitter_ms() -> u64 {
    500
}

fn default_first_id() -> u32 {
    1
}

fn default_last_id() -> u32 {
    51
}

fn default_output() -> PathBuf {
    PathBuf::from("products1.json")
}

fn default_crawl_output() -> PathBuf {
    PathBuf::from("productsPaginated.json")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            webdriver_url: default_webdriver_url(),
            headless: default_headless(),
            driver_setup_retries: default_driver_setup_retries(),
            page_load_timeout_secs: default_page_load_timeout_secs(),
            title_timeout_secs: default_title_timeout_secs(),
            element_timeout_ms: default_element_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            stale_retries: default_stale_retries(),
            stale_backoff_ms: default_stale_backoff_ms(),
            delay_ms: default_delay_ms(),
            delay_jitter_ms: default_delay_jitter_ms(),
            first_id: default_first_id(),
            last_id: default_last_id(),
            output: default_output(),
            crawl_output: default_crawl_output(),
            log_file: None,
            format: OutputFormat::Json,
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("storefront-scraper").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(url) = std::env::var("STOREFRONT_BASE_URL") {
            self.base_url = url;
        }

        if let Ok(url) = std::env::var("STOREFRONT_WEBDRIVER_URL") {
            self.webdriver_url = url;
        }

        if let Ok(delay) = std::env::var("STOREFRONT_DELAY") {
            if let Ok(d) = delay.parse() {
                self.delay_ms = d;
            }
        }

        self
    }

    /// Product IDs covered by a batch run.
    pub fn product_ids(&self) -> std::ops::RangeInclusive<u32> {
        self.first_id..=self.last_id
    }
}

/// Output format for records printed to stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "table" => Ok(OutputFormat::Table),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(format!("Unknown format: {}. Use: json, table, markdown", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.base_url, "https://hiring-xry4.onrender.com");
        assert_eq!(config.webdriver_url, "http://localhost:9515");
        assert!(config.headless);
        assert_eq!(config.driver_setup_retries, 3);
        assert_eq!(config.page_load_timeout_secs, 30);
        assert_eq!(config.title_timeout_secs, 5);
        assert_eq!(config.stale_retries, 3);
        assert_eq!(config.product_ids(), 1..=51);
        assert_eq!(config.output, PathBuf::from("products1.json"));
        assert_eq!(config.crawl_output, PathBuf::from("productsPaginated.json"));
        assert!(config.log_file.is_none());
        assert_eq!(config.format, OutputFormat::Json);
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("TABLE".parse::<OutputFormat>().unwrap(), OutputFormat::Table);
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);

        let err = "csv".parse::<OutputFormat>().unwrap_err();
        assert!(err.contains("Unknown format"));
        assert!(err.contains("json, table, markdown"));
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(OutputFormat::Json.to_string(), "json");
        assert_eq!(OutputFormat::Table.to_string(), "table");
        assert_eq!(OutputFormat::Markdown.to_string(), "markdown");
    }

    #[test]
    fn test_config_from_toml_partial() {
        let toml = r#"
            base_url = "http://localhost:8000"
            first_id = 10
            last_id = 12
            headless = false
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.product_ids(), 10..=12);
        assert!(!config.headless);
        assert_eq!(config.delay_ms, 1000);
    }

    #[test]
    fn test_config_from_toml_all_fields() {
        let toml = r#"
            base_url = "http://shop.local"
            webdriver_url = "http://selenium:4444"
            headless = true
            driver_setup_retries = 5
            page_load_timeout_secs = 60
            title_timeout_secs = 8
            element_timeout_ms = 2500
            poll_interval_ms = 100
            stale_retries = 2
            stale_backoff_ms = 250
            delay_ms = 0
            delay_jitter_ms = 0
            first_id = 3
            last_id = 4
            output = "out/products.json"
            crawl_output = "out/paginated.json"
            log_file = "scraper.log"
            format = "markdown"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.webdriver_url, "http://selenium:4444");
        assert_eq!(config.driver_setup_retries, 5);
        assert_eq!(config.page_load_timeout_secs, 60);
        assert_eq!(config.title_timeout_secs, 8);
        assert_eq!(config.element_timeout_ms, 2500);
        assert_eq!(config.poll_interval_ms, 100);
        assert_eq!(config.stale_retries, 2);
        assert_eq!(config.stale_backoff_ms, 250);
        assert_eq!(config.delay_ms, 0);
        assert_eq!(config.output, PathBuf::from("out/products.json"));
        assert_eq!(config.crawl_output, PathBuf::from("out/paginated.json"));
        assert_eq!(config.log_file, Some(PathBuf::from("scraper.log")));
        assert_eq!(config.format, OutputFormat::Markdown);
    }

    #[test]
    fn test_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            base_url = "http://fixture.local"
            delay_ms = 4000
            "#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.base_url, "http://fixture.local");
        assert_eq!(config.delay_ms, 4000);
    }

    #[test]
    fn test_config_from_file_not_found() {
        let err = Config::from_file("/nonexistent/path/config.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_config_from_file_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml {{{{").unwrap();

        let err = Config::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_config_load_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "last_id = 30").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.last_id, 30);
        assert_eq!(config.first_id, 1);
    }

    #[test]
    fn test_config_with_env() {
        let orig_base = std::env::var("STOREFRONT_BASE_URL").ok();
        let orig_driver = std::env::var("STOREFRONT_WEBDRIVER_URL").ok();
        let orig_delay = std::env::var("STOREFRONT_DELAY").ok();

        std::env::set_var("STOREFRONT_BASE_URL", "http://staging.shop");
        std::env::set_var("STOREFRONT_WEBDRIVER_URL", "http://grid:4444");
        std::env::set_var("STOREFRONT_DELAY", "not_a_number");

        let config = Config::new().with_env();
        assert_eq!(config.base_url, "http://staging.shop");
        assert_eq!(config.webdriver_url, "http://grid:4444");
        // Invalid delay is ignored
        assert_eq!(config.delay_ms, 1000);

        std::env::set_var("STOREFRONT_DELAY", "250");
        assert_eq!(Config::new().with_env().delay_ms, 250);

        for (key, value) in [
            ("STOREFRONT_BASE_URL", orig_base),
            ("STOREFRONT_WEBDRIVER_URL", orig_driver),
            ("STOREFRONT_DELAY", orig_delay),
        ] {
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = Config {
            base_url: "http://shop.local".to_string(),
            log_file: Some(PathBuf::from("scraper.log")),
            format: OutputFormat::Table,
            ..Config::default()
        };

        let text = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();

        assert_eq!(parsed.base_url, config.base_url);
        assert_eq!(parsed.log_file, config.log_file);
        assert_eq!(parsed.format, config.format);
        assert_eq!(parsed.element_timeout_ms, config.element_timeout_ms);
    }
}
