// src/services/crawler.rs

//! Breadth-first crawl driver.
//!
//! A crawl advances one level at a time. For every URL of the current
//! frontier the driver resolves the host, applies the allow-list, registers a
//! barrier unit and schedules a download through the per-crawl [`HostGate`].
//! A successful download registers an extraction unit (when another level
//! follows) whose links feed the next frontier. The driver only moves on once
//! the [`LevelBarrier`] reports every unit of the level finished.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use dashmap::{DashMap, DashSet};

use crate::concurrency::{HostGate, LevelBarrier, LevelUnit, WorkerPool};
use crate::error::{AppError, Result};
use crate::fetch::{Document, Downloader};
use crate::models::{CrawlResult, CrawlerConfig};
use crate::utils::host_of;

/// Web crawler with bounded download, extraction and per-host concurrency.
///
/// Pools live as long as the crawler and are shared by successive crawls;
/// all per-crawl state (frontiers, host queues, barrier) is created inside
/// [`download`](Self::download) and dropped when it returns.
pub struct WebCrawler {
    downloader: Arc<dyn Downloader>,
    download_pool: Arc<WorkerPool>,
    extract_pool: Arc<WorkerPool>,
    per_host: usize,
}

/// State shared by every unit of one crawl.
struct CrawlContext {
    downloader: Arc<dyn Downloader>,
    extract_pool: Arc<WorkerPool>,
    barrier: LevelBarrier,
    depth: usize,
    downloaded: DashSet<String>,
    errors: DashMap<String, AppError>,
}

/// One BFS level: the frontier being processed and the next one being built.
struct Level {
    index: usize,
    current: HashSet<String>,
    next: DashSet<String>,
}

impl WebCrawler {
    /// Create a crawler with `downloaders` download workers, `extractors`
    /// extraction workers and at most `per_host` concurrent downloads per host.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new(
        downloader: Arc<dyn Downloader>,
        downloaders: usize,
        extractors: usize,
        per_host: usize,
    ) -> Result<Self> {
        if per_host == 0 {
            return Err(AppError::config("per_host must be > 0"));
        }
        let download_pool = Arc::new(WorkerPool::new("download", downloaders)?);
        let extract_pool = Arc::new(WorkerPool::new("extract", extractors)?);

        log::info!(
            "Crawler ready: {} downloaders, {} extractors, {} per host",
            downloaders,
            extractors,
            per_host
        );

        Ok(Self {
            downloader,
            download_pool,
            extract_pool,
            per_host,
        })
    }

    /// Create a crawler sized by `config`.
    pub fn from_config(downloader: Arc<dyn Downloader>, config: &CrawlerConfig) -> Result<Self> {
        config.validate()?;
        Self::new(
            downloader,
            config.downloaders,
            config.extractors,
            config.per_host,
        )
    }

    /// Crawl from `url`, downloading `depth` levels (1 = the seed only).
    ///
    /// With `hosts`, discovered links whose host is not listed are dropped
    /// silently; the seed itself is always fetched. Per-URL failures end up
    /// in [`CrawlResult::errors`]; only a shut-down crawler returns `Err`.
    pub async fn download(
        &self,
        url: &str,
        depth: usize,
        hosts: Option<&[String]>,
    ) -> Result<CrawlResult> {
        if self.is_closed() {
            return Err(AppError::PoolClosed);
        }
        if depth == 0 {
            return Ok(CrawlResult::default());
        }

        let allowed: Option<HashSet<&str>> =
            hosts.map(|hosts| hosts.iter().map(String::as_str).collect());
        let gate = Arc::new(HostGate::new(
            self.per_host,
            Arc::clone(&self.download_pool),
        ));
        let ctx = Arc::new(CrawlContext {
            downloader: Arc::clone(&self.downloader),
            extract_pool: Arc::clone(&self.extract_pool),
            barrier: LevelBarrier::new(),
            depth,
            downloaded: DashSet::new(),
            errors: DashMap::new(),
        });

        let mut frontier = HashSet::from([url.to_string()]);
        for index in 0..depth {
            if frontier.is_empty() {
                break;
            }
            log::debug!("Level {}: {} URL(s)", index, frontier.len());

            let level = Arc::new(Level {
                index,
                current: frontier,
                next: DashSet::new(),
            });

            let standing = ctx.barrier.register();
            for link in &level.current {
                let host = match host_of(link) {
                    Ok(host) => host,
                    Err(e) => {
                        log::debug!("{}", e);
                        ctx.errors.insert(link.clone(), e);
                        continue;
                    }
                };
                if index > 0 {
                    if let Some(allowed) = &allowed {
                        if !allowed.contains(host.as_str()) {
                            log::trace!("Skipping {} (host {} not allowed)", link, host);
                            continue;
                        }
                    }
                }

                let unit = ctx.barrier.register();
                gate.schedule(
                    &host,
                    download_unit(Arc::clone(&ctx), Arc::clone(&level), link.clone(), unit),
                );
            }
            ctx.barrier.await_level_done(standing).await;

            frontier = level.next.iter().map(|link| link.key().clone()).collect();
        }

        Ok(ctx.collect())
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    pub fn is_closed(&self) -> bool {
        self.download_pool.is_closed() || self.extract_pool.is_closed()
    }

    /// Stop accepting crawls and work, give in-flight units up to `grace`
    /// to finish, then abort them.
    pub async fn shutdown(&self, grace: Duration) {
        log::info!("Shutting down crawler");
        self.download_pool.close();
        self.extract_pool.close();
        tokio::join!(
            self.download_pool.shutdown(grace),
            self.extract_pool.shutdown(grace)
        );
    }
}

impl CrawlContext {
    fn collect(&self) -> CrawlResult {
        let downloaded = self
            .downloaded
            .iter()
            .map(|url| url.key().clone())
            .collect();
        let urls: Vec<String> = self.errors.iter().map(|e| e.key().clone()).collect();
        let errors = urls
            .into_iter()
            .filter_map(|url| self.errors.remove(&url))
            .collect();
        CrawlResult::new(downloaded, errors)
    }
}

async fn download_unit(ctx: Arc<CrawlContext>, level: Arc<Level>, url: String, unit: LevelUnit) {
    let _unit = unit;

    match ctx.downloader.download(&url).await {
        Ok(document) => {
            ctx.downloaded.insert(url.clone());
            if level.index + 1 < ctx.depth {
                // Registered before `_unit` drops, so the level cannot complete in between.
                let extraction = ctx.barrier.register();
                let job = extract_unit(Arc::clone(&ctx), level, url, document, extraction);
                if let Err(e) = ctx.extract_pool.submit(job) {
                    log::warn!("Extraction skipped: {}", e);
                }
            }
        }
        Err(e) => {
            let err = e.into_download(&url);
            log::debug!("{}", err);
            ctx.errors.insert(url, err);
        }
    }
}

async fn extract_unit(
    ctx: Arc<CrawlContext>,
    level: Arc<Level>,
    url: String,
    document: Box<dyn Document>,
    unit: LevelUnit,
) {
    let _unit = unit;

    match document.extract_links().await {
        Ok(links) => {
            for link in links {
                if !ctx.downloaded.contains(&link)
                    && !ctx.errors.contains_key(&link)
                    && !level.current.contains(&link)
                {
                    level.next.insert(link);
                }
            }
        }
        Err(e) => log::debug!("{}", AppError::extraction(&url, e)),
    }
}
