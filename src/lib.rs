//! storefront-scraper - Resilient product and review scraper for a
//! browser-rendered storefront.
//!
//! Pages are driven through WebDriver (or served from saved HTML), and every
//! product page becomes one fully populated [`ProductRecord`]: fields that
//! cannot be read carry fixed fallback values instead of going missing.

pub mod commands;
pub mod config;
pub mod extract;
pub mod format;
pub mod site;

pub use config::Config;
pub use extract::{Extraction, ProductAssembler, Resolver, ReviewAssembler, Sentinel};
pub use site::models::{ProductRecord, ReviewRecord};
