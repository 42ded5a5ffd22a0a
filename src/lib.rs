//! Douyin Downloader - bulk media acquisition from share links.
//!
//! This library implements a resilient acquisition pipeline for a social
//! video platform: share-link classification, cursor-based enumeration of
//! users/collections/music pages, a global request rate limit, bounded
//! retries, resumable chunked downloads, and a persistent ledger that makes
//! repeated runs incremental.
//!
//! # Features
//!
//! - Single posts, user profiles (posts, likes, collections), collections
//!   and music pages
//! - Byte-range resume of interrupted downloads
//! - Cross-run deduplication via the acquisition ledger
//! - Bounded download concurrency with per-scope item limits
//! - Creation-date window filtering
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use douyin_downloader::{
//!     api::{DouyinApi, RequestContext},
//!     classify::Classifier,
//!     config::Config,
//!     download::{Orchestrator, ResumableDownloader},
//!     throttle::RetryPolicy,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(Config::default());
//!     let ctx = Arc::new(RequestContext::new(None, &config.account.user_agent)?);
//!     let client = reqwest::Client::new();
//!     let api = Arc::new(DouyinApi::new(client.clone(), ctx.clone()));
//!     let downloader = Arc::new(ResumableDownloader::new(
//!         client.clone(),
//!         ctx,
//!         RetryPolicy::default(),
//!         false,
//!     ));
//!     let orchestrator =
//!         Orchestrator::new(api, Classifier::new(client), None, downloader, config);
//!     let report = orchestrator
//!         .run(&["https://v.douyin.com/example/".to_string()])
//!         .await?;
//!     println!("{} inputs failed", report.inputs_failed);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod classify;
pub mod cli;
pub mod config;
pub mod crawl;
pub mod download;
pub mod error;
pub mod fs;
pub mod ledger;
pub mod media;
pub mod output;
pub mod throttle;

// Re-exports for convenience
pub use api::{DouyinApi, RequestContext};
pub use classify::{Classifier, ResourceReference, ScopeKind};
pub use config::Config;
pub use download::{Orchestrator, ResumableDownloader, RunReport};
pub use error::{Error, Result};
pub use ledger::Ledger;
pub use media::ItemDocument;
pub use throttle::{RateLimiter, RetryPolicy};
