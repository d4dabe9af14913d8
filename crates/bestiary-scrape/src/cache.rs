//! On-disk cache of reference page HTML, one file per page identifier.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::{debug, warn};

use crate::error::Result;

/// Cached pages live at `{dir}/{encoded page id}.html`; freshness is judged
/// by the file's modification time.
#[derive(Debug, Clone)]
pub struct PageCache {
    dir: PathBuf,
    ttl: Duration,
}

impl PageCache {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, ttl })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `/` and `%` in page ids are encoded, so every id maps to its own file
    /// directly inside `dir`.
    fn path_for(&self, page_id: &str) -> PathBuf {
        self.dir
            .join(format!("{}.html", urlencoding::encode(page_id)))
    }

    /// Cached HTML for `page_id`, or `None` when absent or stale. Stale
    /// entries are removed.
    pub async fn get(&self, page_id: &str) -> Option<String> {
        let path = self.path_for(page_id);
        let modified = tokio::fs::metadata(&path).await.ok()?.modified().ok()?;
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or_default();
        if age > self.ttl {
            debug!(page_id, age_secs = age.as_secs(), "page cache entry expired");
            if let Err(e) = tokio::fs::remove_file(&path).await {
                warn!(page_id, error = %e, "could not remove stale cache entry");
            }
            return None;
        }
        tokio::fs::read_to_string(&path).await.ok()
    }

    pub async fn put(&self, page_id: &str, html: &str) -> Result<()> {
        tokio::fs::write(self.path_for(page_id), html).await?;
        Ok(())
    }
}
