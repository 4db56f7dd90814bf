//! Pipeline entry points for crawler operations.
//!
//! - `run_crawler`: Crawl one seed URL and report the outcome

pub mod crawl;

pub use crawl::run_crawler;
