//! Core application logic for the signs service
//!
//! This module contains the schedule pipeline, leaves first:
//!
//! - [`feed`] - Pure decoding of raw JSON or XML feeds into presentations
//! - [`client`] - Upstream HTTP fetcher behind the [`ScheduleFetcher`] trait
//! - [`cache`] - The shared [`ScheduleCache`] and optional snapshot store
//! - [`refresh`] - The [`RefreshScheduler`] that drives fetch, decode, update
//! - [`server`] - The axum router and listener
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use signs::app::{
//!     ClientConfig, FeedFormat, HttpFetcher, RefreshConfig, RefreshScheduler, ScheduleCache,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = Arc::new(ScheduleCache::new());
//! let url = "https://www.socallinuxexpo.org/scale/23x/signs".parse()?;
//! let fetcher = Arc::new(HttpFetcher::new(url, &ClientConfig::default())?);
//!
//! let scheduler = RefreshScheduler::new(
//!     Arc::clone(&cache),
//!     fetcher,
//!     Arc::new(FeedFormat::Auto),
//!     RefreshConfig::default(),
//! );
//! scheduler.start().await?;
//! println!("{} sessions cached", cache.session_count());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod feed;
pub mod hash;
pub mod models;
pub mod refresh;
pub mod server;

// Re-export commonly used types for convenience
pub use cache::{ScheduleCache, SnapshotStore, UpdateOutcome};
pub use client::{ClientConfig, HttpFetcher, ScheduleFetcher};
pub use feed::{FeedDecoder, FeedFormat, JsonFeed, XmlFeed};
pub use hash::ContentHash;
pub use models::{Event, Presentation, Schedule};
pub use refresh::{RefreshConfig, RefreshScheduler, SchedulerState};
pub use server::{AppState, AssetConfig, HttpServer, ServerConfig};
