//! Storefront pages: locators, record types and the page backends.

pub mod locators;
pub mod models;
pub mod session;
pub mod snapshot;
pub mod webdriver;

pub use locators::{Locator, Strategy};
pub use models::{
    InventoryStatus, OverallRating, ProductRecord, ReviewCount, ReviewDate, ReviewRecord,
    StockQuantity,
};
pub use session::{Element, Page, Scope, ScopeError};
pub use snapshot::StaticSite;
pub use webdriver::Browser;

/// URL of product `id` on the storefront at `base_url`.
pub fn product_url(base_url: &str, id: u32) -> String {
    format!("{}/products/{}", base_url.trim_end_matches('/'), id)
}

/// URL of listing page `page`.
pub fn listing_url(base_url: &str, page: u32) -> String {
    format!("{}/products?page={}", base_url.trim_end_matches('/'), page)
}

/// Resolves a listing link against the storefront base. Absolute links pass
/// through unchanged.
pub fn absolute_url(base_url: &str, href: &str) -> String {
    let href = href.trim();
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    format!("{}/{}", base_url.trim_end_matches('/'), href.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_url() {
        assert_eq!(product_url("https://shop.test", 7), "https://shop.test/products/7");
        assert_eq!(product_url("https://shop.test/", 7), "https://shop.test/products/7");
    }

    #[test]
    fn test_listing_url() {
        assert_eq!(listing_url("https://shop.test", 2), "https://shop.test/products?page=2");
    }

    #[test]
    fn test_absolute_url() {
        assert_eq!(absolute_url("https://shop.test", "/products/3"), "https://shop.test/products/3");
        assert_eq!(absolute_url("https://shop.test/", "products/3"), "https://shop.test/products/3");
        assert_eq!(
            absolute_url("https://shop.test", "https://cdn.test/products/3"),
            "https://cdn.test/products/3"
        );
    }
}
