use std::time::Duration;

use async_trait::async_trait;
use bestiary_core::AppConfig;
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::PageCache;
use crate::error::{Result, ScrapeError};
use crate::http::RateLimitedClient;

/// The two HTTP surfaces the resolver consumes, plus the optional search API.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the HTML of the reference page with the given (already encoded)
    /// page identifier.
    async fn fetch_page(&self, page_id: &str) -> Result<String>;

    /// Fetch raw image bytes for an `img` `src` taken from a page.
    async fn fetch_image(&self, src: &str) -> Result<Vec<u8>>;

    /// Best-matching page title for a free-text query.
    async fn search_title(&self, _query: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

/// MediaWiki-backed page source.
pub struct WikiClient {
    client: RateLimitedClient,
    cache: Option<PageCache>,
    base_url: String,
    list_page: String,
}

impl WikiClient {
    pub fn with_params(
        base_url: &str,
        list_page: &str,
        min_interval: Duration,
        max_retries: u32,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self> {
        Ok(Self {
            client: RateLimitedClient::new(min_interval, max_retries, timeout, user_agent)?,
            cache: None,
            base_url: base_url.trim_end_matches('/').to_string(),
            list_page: list_page.to_string(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = Self::with_params(
            &config.source.base_url,
            &config.source.list_page,
            Duration::from_millis(config.fetch.min_interval_ms),
            config.fetch.max_retries,
            Duration::from_secs(config.fetch.timeout_secs),
            &config.source.user_agent,
        )?;
        if config.cache.enabled {
            let ttl = Duration::from_secs(config.cache.ttl_hours.saturating_mul(3600));
            return Ok(client.with_cache(PageCache::new(config.cache_dir(), ttl)?));
        }
        Ok(client)
    }

    pub fn with_cache(mut self, cache: PageCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn page_url(&self, page_id: &str) -> String {
        format!("{}/wiki/{}", self.base_url, page_id)
    }

    /// Absolute URL for an image `src`: protocol-relative sources get
    /// `https:`, root-relative ones are joined to the base URL.
    pub fn image_url(&self, src: &str) -> String {
        if src.starts_with("//") {
            format!("https:{src}")
        } else if src.starts_with('/') {
            format!("{}{}", self.base_url, src)
        } else {
            src.to_string()
        }
    }

    /// HTML of the page holding the collateral adjective tables.
    pub async fn fetch_list_page(&self) -> Result<String> {
        self.get_page(&self.list_page).await
    }

    /// Page HTML, served from the page cache when one is configured.
    async fn get_page(&self, page_id: &str) -> Result<String> {
        if let Some(cache) = &self.cache
            && let Some(html) = cache.get(page_id).await
        {
            debug!(page_id, "page cache hit");
            return Ok(html);
        }
        let html = self.client.get(&self.page_url(page_id)).await?;
        if let Some(cache) = &self.cache
            && let Err(e) = cache.put(page_id, &html).await
        {
            warn!(page_id, error = %e, "could not write page cache");
        }
        Ok(html)
    }
}

#[async_trait]
impl PageSource for WikiClient {
    async fn fetch_page(&self, page_id: &str) -> Result<String> {
        self.get_page(page_id).await
    }

    async fn fetch_image(&self, src: &str) -> Result<Vec<u8>> {
        self.client.get_bytes(&self.image_url(src)).await
    }

    async fn search_title(&self, query: &str) -> Result<Option<String>> {
        let url = format!(
            "{}/w/api.php?action=query&list=search&srsearch={}&format=json",
            self.base_url,
            urlencoding::encode(query)
        );
        let val: Value = self.client.get_json(&url).await?;
        let results = val["query"]["search"]
            .as_array()
            .ok_or_else(|| ScrapeError::Parse("search response has no results array".to_string()))?;
        Ok(results
            .first()
            .and_then(|hit| hit["title"].as_str())
            .map(str::to_string))
    }
}
