//! Page fetching capabilities consumed by the crawler.
//!
//! [`WebCrawler`](crate::services::WebCrawler) only sees these traits; the
//! HTTP implementation in [`http`] is one possible collaborator.

pub mod http;

use async_trait::async_trait;

use crate::error::Result;

pub use http::{HtmlDocument, HttpDownloader};

/// Fetches a page by URL.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Download `url`. Any error is recorded against the URL; the crawler
    /// does not retry.
    async fn download(&self, url: &str) -> Result<Box<dyn Document>>;
}

/// A downloaded page.
#[async_trait]
pub trait Document: Send + Sync {
    /// Outbound links of the page as absolute URLs.
    async fn extract_links(&self) -> Result<Vec<String>>;
}
