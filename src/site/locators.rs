//! Locators for storefront pages.
//!
//! Every element the extractors read is named here. Update this file when the
//! storefront changes its markup.
//!
//! **Update process**: when a field starts falling back on every product,
//! save the product page HTML, fix the locator, and add the page as a test
//! fixture.

use std::fmt;

/// How a locator pattern is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Style selector (`h1.text-3xl.font-bold`).
    Css,
    /// Structural path (`//div[@class='flex items-center']/p`).
    XPath,
}

/// Declarative description of how to find an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Locator {
    pub strategy: Strategy,
    pub pattern: &'static str,
}

impl Locator {
    pub const fn css(pattern: &'static str) -> Self {
        Self { strategy: Strategy::Css, pattern }
    }

    pub const fn xpath(pattern: &'static str) -> Self {
        Self { strategy: Strategy::XPath, pattern }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.strategy {
            Strategy::Css => write!(f, "css={}", self.pattern),
            Strategy::XPath => write!(f, "xpath={}", self.pattern),
        }
    }
}

/// Locators for a single product page.
pub mod product {
    use super::Locator;

    /// Product heading. Its presence also signals that the page loaded.
    pub const TITLE: Locator = Locator::css("h1.text-3xl.font-bold");

    pub const PRICE: Locator = Locator::css("p.text-3xl.tracking-tight.text-gray-900");

    /// Category tag links.
    pub const CATEGORIES: Locator = Locator::css("a.bg-primary-100.text-primary-800");

    /// Gallery images (exact class list, thumbnails use a different one).
    pub const IMAGES: Locator = Locator::css("img[class='h-full w-full object-cover object-center']");

    pub const IMAGE_SOURCE_ATTR: &str = "src";

    pub const DESCRIPTION: Locator = Locator::css("p[class='text-base text-gray-700']");

    /// Summary line like "4.5 out of 5 stars, 128 reviews".
    pub const RATING: Locator =
        Locator::css("div[class='flex items-center'] > p[class='ml-3 text-sm text-gray-700']");

    /// Stock badge candidates. The badge text decides which one is the status.
    pub const STOCK_STATUS: Locator = Locator::css("div.inline-flex.items-center");

    /// "12 available" next to the stock badge.
    pub const STOCK_QUANTITY: Locator = Locator::css("p.ml-2.text-sm.text-gray-500");

    /// First muted paragraph on the page carries "SKU: ...".
    pub const SKU: Locator = Locator::css("p[class='text-sm text-gray-500']");

    pub const CHECKSUM: Locator = Locator::css("code.text-xs.font-mono");
}

/// Locators for customer reviews. Everything except `BLOCK` is scoped to a
/// single review block.
pub mod review {
    use super::Locator;

    /// One review block on the product page.
    pub const BLOCK: Locator = Locator::css("div.border-b.border-gray-200.pb-8");

    /// "By Jane Doe on 3/14/2024".
    pub const REVIEWER: Locator = Locator::css("p[class='text-sm text-gray-500']");

    /// Filled star icons.
    pub const STARS: Locator = Locator::css("svg.text-yellow-400");

    pub const TITLE: Locator = Locator::css("p[class='ml-3 text-sm font-medium text-gray-900']");

    /// All paragraphs of the block; the last one carries the date.
    pub const PARAGRAPHS: Locator = Locator::css("p");

    pub const BODY: Locator = Locator::css("p.text-base.text-gray-900");

    pub const CHECKSUM: Locator = Locator::css("code.text-xs.font-mono");
}

/// Locators for the paginated product listing.
pub mod listing {
    use super::Locator;

    /// Product card link.
    pub const PRODUCT_LINK: Locator = Locator::css("a[class='group']");

    pub const HREF_ATTR: &str = "href";
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    const ALL_CSS: &[Locator] = &[
        product::TITLE,
        product::PRICE,
        product::CATEGORIES,
        product::IMAGES,
        product::DESCRIPTION,
        product::RATING,
        product::STOCK_STATUS,
        product::STOCK_QUANTITY,
        product::SKU,
        product::CHECKSUM,
        review::BLOCK,
        review::REVIEWER,
        review::STARS,
        review::TITLE,
        review::PARAGRAPHS,
        review::BODY,
        review::CHECKSUM,
        listing::PRODUCT_LINK,
    ];

    #[test]
    fn test_locators_compile() {
        for locator in ALL_CSS {
            assert_eq!(locator.strategy, Strategy::Css);
            assert!(Selector::parse(locator.pattern).is_ok(), "bad selector: {}", locator);
        }
    }

    #[test]
    fn test_locator_display() {
        assert_eq!(product::TITLE.to_string(), "css=h1.text-3xl.font-bold");
        assert_eq!(Locator::xpath("//h1").to_string(), "xpath=//h1");
    }

    #[test]
    fn test_exact_class_matching() {
        let html = Html::parse_document(
            r#"<div>
                <img class="h-full w-full object-cover object-center" src="/a.jpg">
                <img class="h-full w-full object-cover object-center thumb" src="/b.jpg">
            </div>"#,
        );

        let selector = Selector::parse(product::IMAGES.pattern).unwrap();
        let srcs: Vec<_> = html.select(&selector).filter_map(|e| e.value().attr("src")).collect();
        assert_eq!(srcs, vec!["/a.jpg"]);
    }

    #[test]
    fn test_rating_requires_parent() {
        let html = Html::parse_document(
            r#"<div class="flex items-center"><p class="ml-3 text-sm text-gray-700">4.5 out of 5 stars</p></div>
               <p class="ml-3 text-sm text-gray-700">stray</p>"#,
        );

        let selector = Selector::parse(product::RATING.pattern).unwrap();
        let texts: Vec<String> = html.select(&selector).map(|e| e.text().collect()).collect();
        assert_eq!(texts, vec!["4.5 out of 5 stars".to_string()]);
    }
}
