//! In-memory reference corpus for resolver tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{Result, ScrapeError};
use crate::source::PageSource;

#[derive(Default)]
pub struct FakeWiki {
    pages: HashMap<String, String>,
    broken_images: HashSet<String>,
    search_hits: HashMap<String, String>,
    log: Mutex<Vec<String>>,
}

impl FakeWiki {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a page under its page identifier (`Bos_taurus`).
    pub fn page(mut self, page_id: &str, html: String) -> Self {
        self.pages.insert(page_id.to_string(), html);
        self
    }

    pub fn broken_image(mut self, src: &str) -> Self {
        self.broken_images.insert(src.to_string());
        self
    }

    pub fn search_hit(mut self, query: &str, title: &str) -> Self {
        self.search_hits.insert(query.to_string(), title.to_string());
        self
    }

    /// Every request made so far: `page:{id}`, `image:{src}`, `search:{q}`.
    pub fn fetch_log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn page_fetches(&self) -> Vec<String> {
        self.fetch_log()
            .into_iter()
            .filter_map(|entry| entry.strip_prefix("page:").map(str::to_string))
            .collect()
    }

    fn record(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }
}

#[async_trait]
impl PageSource for FakeWiki {
    async fn fetch_page(&self, page_id: &str) -> Result<String> {
        self.record(format!("page:{page_id}"));
        tokio::task::yield_now().await;
        self.pages
            .get(page_id)
            .cloned()
            .ok_or_else(|| ScrapeError::NotFound(page_id.to_string()))
    }

    async fn fetch_image(&self, src: &str) -> Result<Vec<u8>> {
        self.record(format!("image:{src}"));
        tokio::task::yield_now().await;
        if self.broken_images.contains(src) {
            return Err(ScrapeError::ApiError(src.to_string(), "HTTP 500".to_string()));
        }
        Ok(format!("bytes of {src}").into_bytes())
    }

    async fn search_title(&self, query: &str) -> Result<Option<String>> {
        self.record(format!("search:{query}"));
        Ok(self.search_hits.get(query).cloned())
    }
}

pub fn taxobox_page(img_src: &str) -> String {
    format!(
        r#"<html><body><div class="mw-parser-output">
        <table class="infobox biota"><tr><td><img src="{img_src}"></td></tr>
        <tr><td>Kingdom: Animalia</td></tr></table>
        </div></body></html>"#
    )
}

pub fn link_page(target_id: &str, link_title: &str) -> String {
    format!(
        r#"<html><body><div class="mw-parser-output">
        <p>See <a href="/wiki/{target_id}" title="{link_title}">here</a>.</p>
        </div></body></html>"#
    )
}

pub fn no_content_page() -> String {
    r#"<html><body><div class="mw-parser-output"><p>Nothing useful.</p></div></body></html>"#
        .to_string()
}

pub fn disambiguation_page() -> String {
    r#"<html><body><div class="mw-parser-output">
    <table id="disambigbox"><tr><td>This page lists articles with similar titles.</td></tr></table>
    <table class="infobox biota"><tr><td><img src="/decoy.jpg"></td></tr><tr><td>Kingdom</td></tr></table>
    <a href="/wiki/Jaguar_cat" title="Jaguar species">cat</a>
    </div></body></html>"#
        .to_string()
}
