// src/models/mod.rs

//! Domain models for the crawler.

mod config;
mod result;

pub use config::{Config, CrawlerConfig, HttpConfig};
pub use result::CrawlResult;
