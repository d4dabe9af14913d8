use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::page::{PageClass, classify_page, page_identifier};
use crate::source::PageSource;

/// Why a resolution attempt (or a whole subject) produced no image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    #[error("page already visited in this attempt")]
    Cycle,

    #[error("disambiguation page")]
    Disambiguation,

    #[error("fetch failed: {0}")]
    FetchError(String),

    #[error("no taxonomy image or relevant link")]
    NoContent,

    #[error("all fallback names exhausted")]
    AllFallbacksExhausted,
}

impl FailureReason {
    /// Short stable name, used in JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Cycle => "cycle",
            Self::Disambiguation => "disambiguation",
            Self::FetchError(_) => "fetch_error",
            Self::NoContent => "no_content",
            Self::AllFallbacksExhausted => "all_fallbacks_exhausted",
        }
    }
}

/// Result of looking at one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// `src` of the image to download.
    ImageFound(String),
    /// Title of the next page to try.
    FollowLink(String),
    Failed(FailureReason),
}

/// Fetches and classifies reference pages, one hop at a time.
pub struct PageResolver {
    source: Arc<dyn PageSource>,
}

impl PageResolver {
    pub fn new(source: Arc<dyn PageSource>) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &Arc<dyn PageSource> {
        &self.source
    }

    /// Looks at the page for `title`. `visited` holds page identifiers already
    /// fetched during the current attempt; a revisit fails without fetching.
    pub async fn resolve(&self, title: &str, visited: &mut HashSet<String>) -> Outcome {
        let page_id = page_identifier(title);
        if !visited.insert(page_id.clone()) {
            return Outcome::Failed(FailureReason::Cycle);
        }

        info!(title, page = %page_id, "fetching reference page");
        let html = match self.source.fetch_page(&page_id).await {
            Ok(html) => html,
            Err(e) => return Outcome::Failed(FailureReason::FetchError(e.to_string())),
        };

        match classify_page(&html) {
            Ok(PageClass::Disambiguation) => Outcome::Failed(FailureReason::Disambiguation),
            Ok(PageClass::Image(src)) => Outcome::ImageFound(src),
            Ok(PageClass::Link(next)) => Outcome::FollowLink(next),
            Ok(PageClass::NoContent) => Outcome::Failed(FailureReason::NoContent),
            Err(e) => Outcome::Failed(FailureReason::FetchError(e.to_string())),
        }
    }

    /// Follows links from `title` until an image is found or the chain fails.
    /// Terminates because `visited` grows on every fetch and a revisit stops
    /// the chain.
    pub async fn resolve_chain(
        &self,
        title: &str,
        visited: &mut HashSet<String>,
    ) -> std::result::Result<String, FailureReason> {
        let mut current = title.to_string();
        loop {
            match self.resolve(&current, visited).await {
                Outcome::ImageFound(src) => return Ok(src),
                Outcome::FollowLink(next) => {
                    debug!(from = %current, to = %next, "following link");
                    current = next;
                }
                Outcome::Failed(reason) => return Err(reason),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{FakeWiki, link_page, no_content_page, taxobox_page};

    fn setup(wiki: FakeWiki) -> (PageResolver, Arc<FakeWiki>) {
        let wiki = Arc::new(wiki);
        (PageResolver::new(wiki.clone()), wiki)
    }

    #[tokio::test]
    async fn revisit_fails_without_fetch() {
        let (resolver, wiki) = setup(FakeWiki::new().page("Lion", taxobox_page("/lion.jpg")));
        let mut visited = HashSet::from(["Lion".to_string()]);

        let outcome = resolver.resolve("Lion", &mut visited).await;
        assert_eq!(outcome, Outcome::Failed(FailureReason::Cycle));
        assert!(wiki.fetch_log().is_empty());
    }

    #[tokio::test]
    async fn missing_page_is_fetch_error() {
        let (resolver, _) = setup(FakeWiki::new());
        let outcome = resolver.resolve("Yeti", &mut HashSet::new()).await;
        assert!(matches!(outcome, Outcome::Failed(FailureReason::FetchError(_))));
    }

    #[tokio::test]
    async fn follows_link_to_image() {
        let (resolver, wiki) = setup(
            FakeWiki::new()
                .page("Cattle", link_page("Bos_taurus", "Bos taurus species"))
                .page("Bos_taurus", taxobox_page("/cow.jpg")),
        );
        let mut visited = HashSet::new();
        let src = resolver.resolve_chain("Cattle", &mut visited).await.unwrap();

        assert_eq!(src, "/cow.jpg");
        assert_eq!(wiki.fetch_log(), vec!["page:Cattle", "page:Bos_taurus"]);
        assert_eq!(visited.len(), 2);
    }

    #[tokio::test]
    async fn two_node_cycle_terminates() {
        let (resolver, wiki) = setup(
            FakeWiki::new()
                .page("A", link_page("B", "B species"))
                .page("B", link_page("A", "A species")),
        );
        let result = resolver.resolve_chain("A", &mut HashSet::new()).await;

        assert_eq!(result, Err(FailureReason::Cycle));
        assert_eq!(wiki.fetch_log(), vec!["page:A", "page:B"]);
    }

    #[tokio::test]
    async fn n_node_cycle_terminates() {
        let n = 12;
        let mut wiki = FakeWiki::new();
        for i in 0..n {
            let next = format!("Node_{}", (i + 1) % n);
            wiki = wiki.page(&format!("Node_{i}"), link_page(&next, "genus page"));
        }
        let (resolver, wiki) = setup(wiki);
        let result = resolver.resolve_chain("Node 0", &mut HashSet::new()).await;

        assert_eq!(result, Err(FailureReason::Cycle));
        assert_eq!(wiki.fetch_log().len(), n);
    }

    #[tokio::test]
    async fn chain_stops_at_dead_end() {
        let (resolver, _) = setup(
            FakeWiki::new()
                .page("Gnu", link_page("Wildebeest", "Wildebeest mammal"))
                .page("Wildebeest", no_content_page()),
        );
        let result = resolver.resolve_chain("Gnu", &mut HashSet::new()).await;
        assert_eq!(result, Err(FailureReason::NoContent));
    }

    #[tokio::test]
    async fn resolve_is_deterministic() {
        let wiki = FakeWiki::new()
            .page("Cattle", link_page("Bos_taurus", "Bos taurus species"))
            .page("Bos_taurus", taxobox_page("/cow.jpg"))
            .page("Jaguar", crate::fixtures::disambiguation_page());
        let (resolver, _) = setup(wiki);

        for title in ["Cattle", "Bos taurus", "Jaguar", "Yeti"] {
            let first = resolver.resolve(title, &mut HashSet::new()).await;
            for _ in 0..3 {
                let again = resolver.resolve(title, &mut HashSet::new()).await;
                assert_eq!(again, first, "title: {title}");
            }
        }
    }
}
