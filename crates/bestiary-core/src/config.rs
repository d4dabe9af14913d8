use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BestiaryError, Result};

/// Root application configuration, loaded from `~/.config/bestiary/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub fetch: FetchConfig,
    pub output: OutputConfig,
    pub cache: CacheConfig,
}

/// Where reference pages come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub base_url: String,
    pub list_page: String,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Maximum number of subjects resolved at the same time.
    pub concurrency: usize,
    pub timeout_secs: u64,
    pub min_interval_ms: u64,
    pub max_retries: u32,
    /// Try the site search API as a last resort.
    pub search_fallback: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub report_path: PathBuf,
    pub image_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_hours: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://en.wikipedia.org".to_string(),
            list_page: "List_of_animal_names".to_string(),
            user_agent: format!("bestiary/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            timeout_secs: 20,
            min_interval_ms: 0,
            max_retries: 2,
            search_fallback: false,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_path: PathBuf::from("output").join("report.html"),
            image_dir: PathBuf::from("output").join("tmp"),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ttl_hours: 7 * 24,
            dir: None,
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    pub const MAX_RETRIES: u32 = 10;

    /// Standard config file path: `~/.config/bestiary/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("BESTIARY_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("bestiary")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        Self::load_from(&path)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.fetch.concurrency == 0 {
            return Err(BestiaryError::ConfigError(
                "fetch.concurrency must be at least 1".to_string(),
            ));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(BestiaryError::ConfigError(
                "fetch.timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.fetch.max_retries > Self::MAX_RETRIES {
            return Err(BestiaryError::ConfigError(format!(
                "fetch.max_retries must be at most {}, got {}",
                Self::MAX_RETRIES,
                self.fetch.max_retries
            )));
        }
        if !self.source.base_url.starts_with("http://")
            && !self.source.base_url.starts_with("https://")
        {
            return Err(BestiaryError::ConfigError(format!(
                "source.base_url is not an http(s) URL: {}",
                self.source.base_url
            )));
        }
        Ok(())
    }

    // ─── Derived paths ─────────────────────────────────────

    /// Directory for cached page HTML.
    pub fn cache_dir(&self) -> PathBuf {
        self.cache.dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("bestiary")
                .join("pages")
        })
    }
}
