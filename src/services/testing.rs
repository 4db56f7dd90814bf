//! Deterministic in-memory downloader for crawler tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::error::{AppError, Result};
use crate::fetch::{Document, Downloader};

pub fn set(urls: &[&str]) -> HashSet<String> {
    urls.iter().map(|url| url.to_string()).collect()
}

#[derive(Default)]
struct Gauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl Gauge {
    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct Stats {
    calls: Mutex<HashMap<String, usize>>,
    hosts: Mutex<HashMap<String, Arc<Gauge>>>,
    downloads: Gauge,
    extractions: Gauge,
    extraction_calls: AtomicUsize,
}

impl Stats {
    fn host(&self, url: &str) -> Arc<Gauge> {
        let host = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();
        Arc::clone(self.hosts.lock().unwrap().entry(host).or_default())
    }
}

/// Link graph served from memory. Unknown URLs fail to download.
#[derive(Default)]
pub struct StubDownloader {
    pages: HashMap<String, Vec<String>>,
    failing: HashSet<String>,
    broken: HashSet<String>,
    delay: Duration,
    extract_delay: Duration,
    stats: Arc<Stats>,
}

impl StubDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, links: &[&str]) -> Self {
        self.pages
            .insert(url.to_string(), links.iter().map(|l| l.to_string()).collect());
        self
    }

    pub fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    /// Page downloads fine but link extraction fails.
    pub fn broken_links(mut self, url: &str) -> Self {
        self.broken.insert(url.to_string());
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn extract_delay(mut self, delay: Duration) -> Self {
        self.extract_delay = delay;
        self
    }

    pub fn download_count(&self, url: &str) -> usize {
        self.stats.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn extraction_count(&self) -> usize {
        self.stats.extraction_calls.load(Ordering::SeqCst)
    }

    pub fn peak_for_host(&self, host: &str) -> usize {
        self.stats
            .hosts
            .lock()
            .unwrap()
            .get(host)
            .map_or(0, |gauge| gauge.peak())
    }

    pub fn peak_downloads(&self) -> usize {
        self.stats.downloads.peak()
    }

    pub fn peak_extractions(&self) -> usize {
        self.stats.extractions.peak()
    }
}

#[async_trait]
impl Downloader for StubDownloader {
    async fn download(&self, url: &str) -> Result<Box<dyn Document>> {
        *self
            .stats
            .calls
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default() += 1;

        let host = self.stats.host(url);
        host.enter();
        self.stats.downloads.enter();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.stats.downloads.leave();
        host.leave();

        if self.failing.contains(url) {
            return Err(AppError::download(url, "stub failure"));
        }
        let links = self
            .pages
            .get(url)
            .cloned()
            .ok_or_else(|| AppError::download(url, "HTTP 404"))?;

        Ok(Box::new(StubDocument {
            url: url.to_string(),
            links,
            broken: self.broken.contains(url),
            delay: self.extract_delay,
            stats: Arc::clone(&self.stats),
        }))
    }
}

struct StubDocument {
    url: String,
    links: Vec<String>,
    broken: bool,
    delay: Duration,
    stats: Arc<Stats>,
}

#[async_trait]
impl Document for StubDocument {
    async fn extract_links(&self) -> Result<Vec<String>> {
        self.stats.extraction_calls.fetch_add(1, Ordering::SeqCst);
        self.stats.extractions.enter();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.stats.extractions.leave();

        if self.broken {
            return Err(AppError::extraction(&self.url, "unparseable page"));
        }
        Ok(self.links.clone())
    }
}
