//! Customer review extraction.

use crate::extract::fallback;
use crate::extract::fields;
use crate::extract::resolver::{Resolver, ResolverFault};
use crate::site::locators::review;
use crate::site::models::{ReviewDate, ReviewRecord};
use crate::site::session::{Element, Scope};
use tracing::debug;

/// Builds review records from the review blocks of a product page.
///
/// Unlike product fields, a review that faults is dropped rather than
/// filled with fallbacks. Its siblings are unaffected.
pub struct ReviewAssembler<'a> {
    resolver: &'a Resolver,
}

impl<'a> ReviewAssembler<'a> {
    pub fn new(resolver: &'a Resolver) -> Self {
        Self { resolver }
    }

    /// Reviews in page order. IDs are block positions starting at 1, so a
    /// dropped review leaves a gap.
    pub async fn assemble<S: Scope>(&self, page: &S) -> Vec<ReviewRecord> {
        let blocks = self.resolver.find_many(page, &review::BLOCK).await;
        if blocks.is_empty() {
            self.resolver.log().warn("No review elements found");
            return Vec::new();
        }

        let mut reviews = Vec::with_capacity(blocks.len());
        for (id, block) in (1u32..).zip(blocks.iter()) {
            match self.review(id, block).await {
                Ok(record) => reviews.push(record),
                Err(e) => {
                    self.resolver
                        .log()
                        .error(&format!("Error processing individual review {}: {}", id, e));
                }
            }
        }

        debug!("Assembled {} of {} reviews", reviews.len(), blocks.len());
        reviews
    }

    async fn review<N: Element>(&self, id: u32, block: &N) -> Result<ReviewRecord, ResolverFault> {
        let r = self.resolver;
        Ok(ReviewRecord {
            id,
            name: fields::reviewer(r, block).await?.or_label(fallback::REVIEWER),
            rating: fields::review_stars(r, block).await,
            title: fields::review_title(r, block).await?.or_label(fallback::REVIEW_TITLE),
            date: fields::review_date(r, block).await?.or_else(|_| ReviewDate::Unknown),
            body: fields::review_body(r, block).await?.or_label(fallback::REVIEW_BODY),
            checksum: fields::review_checksum(r, block).await?.or_label(fallback::REVIEW_CHECKSUM),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::log::{Level, MemoryLog};
    use crate::extract::resolver::ResolverSettings;
    use crate::extract::testing::{FakeNode, FakePage};
    use crate::site::session::ScopeError;
    use std::sync::Arc;

    fn resolver() -> (Resolver, Arc<MemoryLog>) {
        let log = Arc::new(MemoryLog::new());
        (Resolver::new(ResolverSettings::immediate(), log.clone()), log)
    }

    fn block(name: &str, stars: usize) -> FakeNode {
        let mut node = FakeNode::new()
            .child(review::REVIEWER, FakeNode::with_text(&format!("By {} on 1/2/2024", name)))
            .child(review::TITLE, FakeNode::with_text("Nice"))
            .child(review::PARAGRAPHS, FakeNode::with_text("Nice"))
            .child(review::PARAGRAPHS, FakeNode::with_text(&format!("By {} on 1/2/2024", name)))
            .child(review::BODY, FakeNode::with_text("Works well."))
            .child(review::CHECKSUM, FakeNode::with_text(&format!("r-{}", name)));
        for _ in 0..stars {
            node = node.child(review::STARS, FakeNode::new());
        }
        node
    }

    #[tokio::test]
    async fn test_reviews_numbered_in_page_order() {
        let page = FakePage::showing(
            FakeNode::new()
                .child(review::BLOCK, block("Ann", 5))
                .child(review::BLOCK, block("Bob", 2)),
        );
        let (r, _) = resolver();

        let reviews = ReviewAssembler::new(&r).assemble(&page).await;
        assert_eq!(reviews.len(), 2);
        assert_eq!((reviews[0].id, reviews[0].name.as_str(), reviews[0].rating), (1, "Ann", 5));
        assert_eq!((reviews[1].id, reviews[1].name.as_str(), reviews[1].rating), (2, "Bob", 2));
        assert_eq!(reviews[1].checksum, "r-Bob");
        assert_eq!(reviews[1].date.to_string(), "1/2/2024");
    }

    #[tokio::test]
    async fn test_empty_block_gets_fallbacks() {
        let page = FakePage::showing(FakeNode::new().child(review::BLOCK, FakeNode::new()));
        let (r, _) = resolver();

        let reviews = ReviewAssembler::new(&r).assemble(&page).await;
        assert_eq!(
            reviews,
            vec![ReviewRecord {
                id: 1,
                name: "Anonymous".to_string(),
                rating: 0,
                title: "Untitled Review".to_string(),
                date: ReviewDate::Unknown,
                body: "No review text".to_string(),
                checksum: "No Checksum".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_faulty_review_is_skipped_not_siblings() {
        let broken = block("Cat", 4).failing(ScopeError::Command("detached frame".into()));
        let page = FakePage::showing(
            FakeNode::new()
                .child(review::BLOCK, block("Ann", 5))
                .child(review::BLOCK, broken)
                .child(review::BLOCK, block("Dan", 3)),
        );
        let (r, log) = resolver();

        let reviews = ReviewAssembler::new(&r).assemble(&page).await;
        let ids: Vec<u32> = reviews.iter().map(|review| review.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(log
            .messages(Level::Error)
            .iter()
            .any(|m| m.contains("Error processing individual review 2")));
    }

    #[tokio::test]
    async fn test_no_reviews_warns() {
        let page = FakePage::showing(FakeNode::new());
        let (r, log) = resolver();

        assert!(ReviewAssembler::new(&r).assemble(&page).await.is_empty());
        assert_eq!(log.messages(Level::Warn), vec!["No review elements found"]);
    }
}
