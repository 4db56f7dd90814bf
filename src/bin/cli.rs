//! webcrawler CLI
//!
//! Crawls a site breadth-first from a seed URL.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use webcrawler::{
    error::Result,
    fetch::HttpDownloader,
    models::Config,
    pipeline,
};

/// Bounded-concurrency breadth-first web crawler
#[derive(Parser, Debug)]
#[command(name = "webcrawler", version, about = "Breadth-first web crawler")]
struct Cli {
    /// Seed URL
    url: String,

    /// Number of levels to download (1 = seed only)
    depth: Option<usize>,

    /// Maximum concurrent downloads
    downloaders: Option<usize>,

    /// Maximum concurrent link extractions
    extractors: Option<usize>,

    /// Maximum concurrent downloads per host
    per_host: Option<usize>,

    /// Only follow links to this host (repeatable)
    #[arg(long = "host", value_name = "HOST")]
    hosts: Vec<String>,

    /// Path to configuration file
    #[arg(short, long, default_value = "webcrawler.toml")]
    config: PathBuf,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Apply command line overrides on top of the file configuration.
    fn apply(&self, config: &mut Config) {
        let crawler = &mut config.crawler;
        if let Some(depth) = self.depth {
            crawler.depth = depth;
        }
        if let Some(downloaders) = self.downloaders {
            crawler.downloaders = downloaders;
        }
        if let Some(extractors) = self.extractors {
            crawler.extractors = extractors;
        }
        if let Some(per_host) = self.per_host {
            crawler.per_host = per_host;
        }
        if !self.hosts.is_empty() {
            crawler.hosts = self.hosts.clone();
        }
    }
}

/// Initialize logging based on verbosity flag.
///
/// JSON output keeps stdout clean by hiding the console report.
fn init_logging(verbose: bool, json: bool) {
    let level = match (verbose, json) {
        (true, _) => "debug",
        (false, true) => "warn",
        (false, false) => "info",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.json);

    let mut config = if cli.config.exists() {
        let config = Config::load_or_default(&cli.config);
        log::info!("Loaded configuration from {}", cli.config.display());
        config
    } else {
        Config::default()
    };
    cli.apply(&mut config);

    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }

    let downloader = Arc::new(HttpDownloader::new(&config.http)?);
    let result = pipeline::run_crawler(&config, downloader, &cli.url).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    if result.errors().is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
