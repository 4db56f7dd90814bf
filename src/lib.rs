// src/lib.rs

//! Bounded-concurrency breadth-first web crawler
//!
//! [`WebCrawler`](services::WebCrawler) downloads a site level by level from
//! a seed URL, capping concurrent downloads globally and per host and
//! concurrent link extraction globally.

pub mod concurrency;
pub mod error;
pub mod fetch;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod utils;
