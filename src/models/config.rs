//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Pool sizing and traversal settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        self.crawler.validate()?;
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::config("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::config("http.timeout_secs must be > 0"));
        }
        Ok(())
    }
}

/// Pool sizing and traversal settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum concurrent downloads across all hosts
    #[serde(default = "defaults::downloaders")]
    pub downloaders: usize,

    /// Maximum concurrent link extractions
    #[serde(default = "defaults::extractors")]
    pub extractors: usize,

    /// Maximum concurrent downloads to a single host
    #[serde(default = "defaults::per_host")]
    pub per_host: usize,

    /// Number of BFS levels to download (1 = seed only)
    #[serde(default = "defaults::depth")]
    pub depth: usize,

    /// Host allow-list; empty means every host is followed
    #[serde(default)]
    pub hosts: Vec<String>,

    /// How long shutdown waits for in-flight units before aborting them
    #[serde(default = "defaults::shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

impl CrawlerConfig {
    /// Reject pool sizes that would leave a pool without workers.
    pub fn validate(&self) -> Result<()> {
        if self.downloaders == 0 {
            return Err(AppError::config("crawler.downloaders must be > 0"));
        }
        if self.extractors == 0 {
            return Err(AppError::config("crawler.extractors must be > 0"));
        }
        if self.per_host == 0 {
            return Err(AppError::config("crawler.per_host must be > 0"));
        }
        if self.per_host > self.downloaders {
            log::debug!(
                "crawler.per_host ({}) exceeds crawler.downloaders ({}); the pool size still binds",
                self.per_host,
                self.downloaders
            );
        }
        Ok(())
    }

    /// Allow-list as an optional slice, `None` when empty.
    pub fn allowed_hosts(&self) -> Option<&[String]> {
        (!self.hosts.is_empty()).then_some(self.hosts.as_slice())
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            downloaders: defaults::downloaders(),
            extractors: defaults::extractors(),
            per_host: defaults::per_host(),
            depth: defaults::depth(),
            hosts: Vec::new(),
            shutdown_grace_ms: defaults::shutdown_grace_ms(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

mod defaults {
    // Crawler defaults
    pub fn downloaders() -> usize {
        8
    }
    pub fn extractors() -> usize {
        4
    }
    pub fn per_host() -> usize {
        2
    }
    pub fn depth() -> usize {
        2
    }
    pub fn shutdown_grace_ms() -> u64 {
        500
    }

    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; webcrawler/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
}
