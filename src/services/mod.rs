//! Service layer for the crawler.
//!
//! - Breadth-first crawling with bounded pools (`WebCrawler`)

mod crawler;
#[cfg(test)]
pub(crate) mod testing;

pub use crawler::WebCrawler;
