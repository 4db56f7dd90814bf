// src/fetch/http.rs

//! HTTP downloader and HTML document.

use std::collections::HashSet;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::fetch::{Document, Downloader};
use crate::models::HttpConfig;
use crate::utils::http::{create_async_client, fetch_text};
use crate::utils::resolve_link;

/// Downloads pages over HTTP(S) with a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        Ok(Self {
            client: create_async_client(config)?,
        })
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, url: &str) -> Result<Box<dyn Document>> {
        log::debug!("GET {}", url);
        let body = fetch_text(&self.client, url)
            .await
            .map_err(|e| AppError::download(url, e))?;
        Ok(Box::new(HtmlDocument::new(url, body)))
    }
}

/// An HTML page and the URL it was fetched from.
#[derive(Debug, Clone)]
pub struct HtmlDocument {
    url: String,
    body: String,
}

impl HtmlDocument {
    pub fn new(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            body: body.into(),
        }
    }

    fn links(&self) -> Result<Vec<String>> {
        let base = Url::parse(&self.url).map_err(|e| AppError::extraction(&self.url, e))?;
        let selector = Selector::parse("a[href]")
            .map_err(|e| AppError::extraction(&self.url, format!("{e:?}")))?;
        let document = Html::parse_document(&self.body);

        let mut seen = HashSet::new();
        let links = document
            .select(&selector)
            .filter_map(|element| element.value().attr("href"))
            .filter_map(|href| resolve_link(&base, href))
            .filter(|link| seen.insert(link.clone()))
            .collect();
        Ok(links)
    }
}

#[async_trait]
impl Document for HtmlDocument {
    async fn extract_links(&self) -> Result<Vec<String>> {
        self.links()
    }
}
