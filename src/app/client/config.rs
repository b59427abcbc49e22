//! HTTP client configuration and building logic
//!
//! This module handles the configuration and construction of the pooled
//! HTTP client used for upstream feed requests. The same struct is the
//! `[client]` section of the configuration file.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::constants::http;
use crate::errors::{FetchError, FetchResult};

/// Configuration for the upstream HTTP client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Whole-request timeout, covering connect, headers and body
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Connect timeout, covering the TLS handshake
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Connection pool idle timeout
    #[serde(with = "humantime_serde")]
    pub pool_idle_timeout: Duration,
    /// TCP nodelay (disable Nagle's algorithm)
    pub tcp_nodelay: bool,
    /// Largest accepted response body in bytes
    pub max_body_bytes: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: http::DEFAULT_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            pool_idle_timeout: http::POOL_IDLE_TIMEOUT,
            tcp_nodelay: true,
            max_body_bytes: http::MAX_BODY_BYTES,
        }
    }
}

impl ClientConfig {
    /// Set the whole-request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the connect timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the body size limit
    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// Builds the HTTP client with the specified configuration
    pub fn build_http_client(&self) -> FetchResult<Client> {
        Client::builder()
            .timeout(self.request_timeout)
            .connect_timeout(self.connect_timeout)
            .pool_idle_timeout(self.pool_idle_timeout)
            .tcp_nodelay(self.tcp_nodelay)
            .user_agent(http::USER_AGENT)
            .build()
            .map_err(FetchError::Http)
    }
}
