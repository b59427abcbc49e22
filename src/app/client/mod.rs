//! Upstream feed client
//!
//! The refresh scheduler depends only on the [`ScheduleFetcher`] trait, so
//! tests can substitute scripted or blocking fetchers for the HTTP one.

pub mod config;
pub mod http;

use async_trait::async_trait;

use crate::errors::FetchResult;

pub use config::ClientConfig;
pub use http::HttpFetcher;

/// Source of raw schedule payloads
#[async_trait]
pub trait ScheduleFetcher: Send + Sync {
    /// Fetch the current raw payload
    async fn fetch(&self) -> FetchResult<Vec<u8>>;

    /// Human-readable source description for logs
    fn describe(&self) -> String {
        "schedule feed".to_string()
    }
}
