// src/pipeline/crawl.rs

//! Single-crawl pipeline.

use std::sync::Arc;

use chrono::Utc;

use crate::error::Result;
use crate::fetch::Downloader;
use crate::models::{Config, CrawlResult};
use crate::services::WebCrawler;
use crate::utils::log;

/// Run one crawl from `url` with the pools and limits in `config`.
///
/// The crawler is shut down with the configured grace period before the
/// result is returned.
pub async fn run_crawler(
    config: &Config,
    downloader: Arc<dyn Downloader>,
    url: &str,
) -> Result<CrawlResult> {
    let start_time = Utc::now();
    log::header(&format!("Crawling {url}"));

    let settings = &config.crawler;
    let crawler = WebCrawler::from_config(downloader, settings)?;
    let hosts = settings.allowed_hosts();
    if let Some(hosts) = hosts {
        ::log::info!("Following links on {} allowed host(s)", hosts.len());
    }

    let result = crawler.download(url, settings.depth, hosts).await;
    crawler.shutdown(settings.shutdown_grace()).await;
    let result = result?;

    let elapsed = Utc::now() - start_time;
    log::summary(
        "Crawl",
        &[
            ("Depth", settings.depth.to_string()),
            ("Downloaded", result.downloaded().len().to_string()),
            ("Errors", result.errors().len().to_string()),
            (
                "Elapsed",
                format!("{:.2}s", elapsed.num_milliseconds() as f64 / 1000.0),
            ),
        ],
    );

    if !result.errors().is_empty() {
        let mut failed: Vec<_> = result.errors().iter().collect();
        failed.sort_by(|a, b| a.0.cmp(b.0));
        for (_, error) in failed {
            log::sub_item(&error.to_string());
        }
    }

    log::success("Crawl complete");
    Ok(result)
}
