//! Configuration management for the signs service
//!
//! One TOML file feeds every component. Each section deserializes straight
//! into the runtime config struct of the component that owns it, so there is
//! no separate conversion layer. Missing sections and keys fall back to
//! defaults, which makes an empty file (or no file at all) a valid setup.
//!
//! Precedence, lowest first: built-in defaults, the config file, then CLI
//! overrides. [`AppConfig::validate`] runs last and is the only place startup
//! rejects a configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::app::{AssetConfig, ClientConfig, FeedFormat, RefreshConfig, ServerConfig};
use crate::constants::{feed, files, logging, refresh};
use crate::errors::{ConfigError, ConfigResult, Result};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listener settings
    pub server: ServerConfig,
    /// Upstream feed location and format
    pub feed: FeedConfig,
    /// Refresh loop timing
    pub refresh: RefreshConfig,
    /// Upstream HTTP client settings
    pub client: ClientConfig,
    /// Frontend and sponsor assets
    pub assets: AssetConfig,
    /// Optional on-disk snapshot
    pub persistence: PersistenceConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Upstream feed settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Schedule endpoint, http or https
    pub url: String,
    /// Payload format, `auto` sniffs each response
    pub format: FeedFormat,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: feed::DEFAULT_URL.to_string(),
            format: FeedFormat::Auto,
        }
    }
}

impl FeedConfig {
    /// Parse and check the schedule URL
    ///
    /// The URL must be absolute, use http or https and name a host.
    pub fn parsed_url(&self) -> ConfigResult<Url> {
        let invalid = |reason: String| ConfigError::InvalidUrl {
            url: self.url.clone(),
            reason,
        };

        let url = Url::parse(&self.url).map_err(|e| invalid(format!("invalid URL format: {e}")))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!(
                "URL scheme must be http or https, got {}",
                url.scheme()
            )));
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(invalid("URL must include a host".to_string()));
        }

        Ok(url)
    }
}

/// Snapshot persistence settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Snapshot file; persistence is off when unset
    pub path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when neither `RUST_LOG` nor a verbosity flag is given
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: logging::DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

/// Command line values that take precedence over the config file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub port: Option<u16>,
    pub url: Option<String>,
    /// Refresh interval in whole minutes
    pub refresh_minutes: Option<u64>,
    pub format: Option<FeedFormat>,
    pub persist: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from the first file found
    ///
    /// An explicit path must exist. Otherwise `./signs.toml` and then the
    /// user config directory are tried, and defaults are used when neither
    /// exists.
    pub async fn load(config_file_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_file_override {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound { path }.into());
                }
                Some(path)
            }
            None => Self::find_config_file(),
        };

        match config_path {
            Some(path) => Ok(Self::load_from_file(&path).await?),
            None => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Apply command line overrides on top of the loaded values
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(url) = &overrides.url {
            self.feed.url = url.clone();
        }
        if let Some(minutes) = overrides.refresh_minutes {
            self.refresh.interval = Duration::from_secs(minutes.saturating_mul(60));
        }
        if let Some(format) = overrides.format {
            self.feed.format = format;
        }
        if let Some(path) = &overrides.persist {
            self.persistence.path = Some(path.clone());
        }
    }

    /// Check port, schedule URL and refresh interval
    ///
    /// Intervals above one hour are accepted; see [`log_warnings`](Self::log_warnings).
    pub fn validate(&self) -> ConfigResult<()> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidPort {
                reason: "port must be between 1 and 65535".to_string(),
            });
        }

        self.feed.parsed_url()?;

        let interval = self.refresh.interval;
        if interval < refresh::MIN_INTERVAL {
            return Err(ConfigError::InvalidRefreshInterval {
                reason: format!(
                    "refresh interval must be at least 1 minute, got {}s",
                    interval.as_secs()
                ),
            });
        }

        Ok(())
    }

    /// Log settings that are valid but probably unintended
    ///
    /// Called once logging is initialized, which happens after the config
    /// has been loaded and validated.
    pub fn log_warnings(&self) {
        let interval = self.refresh.interval;
        if interval > refresh::LONG_INTERVAL_WARNING {
            warn!(
                "Refresh interval of {} minutes is unusually long; the schedule may go stale",
                interval.as_secs() / 60
            );
        }
    }

    /// Default config file path for the current user
    pub fn default_config_path() -> ConfigResult<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir
            .join(files::APP_DIR_NAME)
            .join(files::CONFIG_FILE_NAME))
    }

    /// Write a commented default config file
    ///
    /// Returns `false` without touching the file when it already exists and
    /// `overwrite` is not set.
    pub async fn write_default_config(path: &Path, overwrite: bool) -> Result<bool> {
        if path.exists() && !overwrite {
            return Ok(false);
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| ConfigError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        tokio::fs::write(path, Self::generate_default_config_content())
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        info!("Wrote default configuration to {}", path.display());
        Ok(true)
    }

    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(files::LOCAL_CONFIG_FILE_NAME)];
        if let Ok(user_path) = Self::default_config_path() {
            search_paths.push(user_path);
        }

        let found = search_paths.into_iter().find(|path| path.exists());
        match &found {
            Some(path) => debug!("Found config file: {}", path.display()),
            None => debug!("No config file found in standard locations"),
        }
        found
    }

    async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;

        let config: AppConfig = toml::from_str(&content)?;
        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Default configuration content with comments
    pub fn generate_default_config_content() -> String {
        let defaults = Self::default();

        format!(
            r#"# Signs configuration
# Every key is optional; removed keys fall back to the values shown here.
# Durations accept human-readable strings such as "90s", "5m" or "1h 30m".

[server]
host = "{host}"
port = {port}
# Bound on draining in-flight requests at shutdown
shutdown_timeout = "{shutdown}s"
request_timeout = "{request}s"

[feed]
url = "{url}"
# auto, json or xml
format = "auto"

[refresh]
# At least one minute
interval = "{interval}s"
# How long shutdown waits for an in-flight refresh
stop_timeout = "{stop}s"

[client]
request_timeout = "{client_request}s"
connect_timeout = "{client_connect}s"
pool_idle_timeout = "{client_idle}s"
tcp_nodelay = true
max_body_bytes = {max_body}

[assets]
frontend_dir = "{frontend}"
sponsors_dir = "{sponsors}"
# diamond = ["microsoft.png"]
# platinum = ["aws.png", "github.png"]
# gold = ["grafana.png"]

[persistence]
# Keep the last good schedule across restarts
# path = "signs-snapshot.json"

[logging]
level = "{level}"  # error, warn, info, debug, trace
"#,
            host = defaults.server.host,
            port = defaults.server.port,
            shutdown = defaults.server.shutdown_timeout.as_secs(),
            request = defaults.server.request_timeout.as_secs(),
            url = defaults.feed.url,
            interval = defaults.refresh.interval.as_secs(),
            stop = defaults.refresh.stop_timeout.as_secs(),
            client_request = defaults.client.request_timeout.as_secs(),
            client_connect = defaults.client.connect_timeout.as_secs(),
            client_idle = defaults.client.pool_idle_timeout.as_secs(),
            max_body = defaults.client.max_body_bytes,
            frontend = defaults.assets.frontend_dir.display(),
            sponsors = defaults.assets.sponsors_dir.display(),
            level = defaults.logging.level,
        )
    }
}
