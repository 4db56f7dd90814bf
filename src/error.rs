// src/error.rs

//! Unified error handling for the crawler.
//!
//! Per-URL failures (`MalformedUrl`, `Download`, `Extraction`) are recorded
//! against the URL inside a [`CrawlResult`](crate::models::CrawlResult) and
//! never abort a crawl. The remaining variants are setup or surface errors
//! returned to the caller.

use std::fmt;

use thiserror::Error;

/// Result type alias for crawler operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// URL could not be resolved to a host
    #[error("Malformed URL '{url}': {message}")]
    MalformedUrl { url: String, message: String },

    /// Fetching a page failed
    #[error("Download failed for {url}: {message}")]
    Download { url: String, message: String },

    /// Parsing links out of a downloaded page failed
    #[error("Link extraction failed for {url}: {message}")]
    Extraction { url: String, message: String },

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// No async runtime to host the worker pools
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Work submitted to a pool that has been shut down
    #[error("Worker pool is closed")]
    PoolClosed,
}

impl AppError {
    /// Create a malformed URL error.
    pub fn malformed_url(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::MalformedUrl {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a download error.
    pub fn download(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Download {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a link extraction error.
    pub fn extraction(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Extraction {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Normalize an arbitrary downloader failure into a `Download` error for `url`.
    pub fn into_download(self, url: &str) -> Self {
        match self {
            err @ (Self::Download { .. } | Self::MalformedUrl { .. }) => err,
            other => Self::download(url, other),
        }
    }
}
