//! Application constants for the signs service
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain.

use std::time::Duration;

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all feed requests
    pub const USER_AGENT: &str = concat!("signs/", env!("CARGO_PKG_VERSION"));

    /// Whole-request timeout for one feed fetch
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Connection establishment timeout (covers the TLS handshake)
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Largest feed body accepted (16MB)
    pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;
}

/// Refresh scheduling constants
pub mod refresh {
    use super::Duration;

    /// Default period between refresh ticks
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5 * 60);

    /// Smallest refresh interval accepted by configuration
    pub const MIN_INTERVAL: Duration = Duration::from_secs(60);

    /// Intervals above this only produce a warning
    pub const LONG_INTERVAL_WARNING: Duration = Duration::from_secs(60 * 60);

    /// How long `stop` waits for the refresh loop to confirm exit
    pub const STOP_TIMEOUT: Duration = Duration::from_secs(5);
}

/// HTTP server constants
pub mod server {
    use super::Duration;

    /// Default listen port
    pub const DEFAULT_PORT: u16 = 2017;

    /// Default bind host
    pub const DEFAULT_HOST: &str = "0.0.0.0";

    /// Bound on draining in-flight requests during shutdown
    pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

    /// Per-request timeout applied to every route
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
}

/// Upstream feed constants
pub mod feed {
    /// Default upstream schedule endpoint
    pub const DEFAULT_URL: &str = "https://www.socallinuxexpo.org/scale/23x/signs";

    /// Elements in rendered time markup that carry a machine-readable instant
    pub const TIME_ATTRIBUTE_SELECTOR: &str = "[content], [datetime]";

    /// Attributes read from matched time elements, in preference order
    pub const TIME_ATTRIBUTES: &[&str] = &["content", "datetime"];

    /// Longest character reference considered when unescaping, `&` to `;`
    pub const MAX_ENTITY_LEN: usize = 32;
}

/// File and directory constants
pub mod files {
    /// Application directory name under the user config directory
    pub const APP_DIR_NAME: &str = "signs";

    /// Config file name inside the application directory
    pub const CONFIG_FILE_NAME: &str = "config.toml";

    /// Project-local config file name
    pub const LOCAL_CONFIG_FILE_NAME: &str = "signs.toml";

    /// Default frontend asset directory
    pub const DEFAULT_FRONTEND_DIR: &str = "frontend";

    /// Default sponsor image directory
    pub const DEFAULT_SPONSOR_DIR: &str = "sponsors/images";

    /// Suffix for snapshot files being written
    pub const TEMP_FILE_SUFFIX: &str = ".tmp";
}

/// Sponsor asset constants
pub mod sponsors {
    /// File extensions treated as sponsor images
    pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];

    /// Default diamond tier
    pub const DIAMOND: &[&str] = &["microsoft.png"];

    /// Default platinum tier
    pub const PLATINUM: &[&str] = &[
        "aws.png",
        "github.png",
        "openintel.png",
        "microsoft.png",
        "zabbix.png",
    ];

    /// Default gold tier
    pub const GOLD: &[&str] = &[
        "canonical.png",
        "cleanstart.png",
        "codercom.png",
        "google.png",
        "grafana.png",
        "meta.png",
        "percona.png",
        "planetscale.png",
        "redhat.png",
        "valkey.png",
        "velodb.png",
        "victoriametrics.png",
    ];
}

/// Logging constants
pub mod logging {
    /// Default log level
    pub const DEFAULT_LOG_LEVEL: &str = "info";
}

// Re-export commonly used constants for convenience
pub use http::{DEFAULT_TIMEOUT as HTTP_TIMEOUT, USER_AGENT};
pub use refresh::{DEFAULT_INTERVAL as REFRESH_INTERVAL, MIN_INTERVAL as MIN_REFRESH_INTERVAL};
pub use server::DEFAULT_PORT;
