//! HTTP server and static asset configuration

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{files, server, sponsors};

/// Listener and request handling settings; the `[server]` config section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind host
    pub host: String,
    /// Listen port, 1-65535
    pub port: u16,
    /// Bound on draining in-flight requests at shutdown
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
    /// Per-request timeout
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: server::DEFAULT_HOST.to_string(),
            port: server::DEFAULT_PORT,
            shutdown_timeout: server::SHUTDOWN_TIMEOUT,
            request_timeout: server::REQUEST_TIMEOUT,
        }
    }
}

impl ServerConfig {
    /// `host:port` string passed to the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Frontend and sponsor asset locations; the `[assets]` config section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Directory served for every path not matched by an API route
    pub frontend_dir: PathBuf,
    /// Directory of sponsor logos served under `/sponsors/images`
    pub sponsors_dir: PathBuf,
    /// Image file names per sponsor tier
    pub diamond: Vec<String>,
    pub platinum: Vec<String>,
    pub gold: Vec<String>,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            frontend_dir: PathBuf::from(files::DEFAULT_FRONTEND_DIR),
            sponsors_dir: PathBuf::from(files::DEFAULT_SPONSOR_DIR),
            diamond: owned(sponsors::DIAMOND),
            platinum: owned(sponsors::PLATINUM),
            gold: owned(sponsors::GOLD),
        }
    }
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}
