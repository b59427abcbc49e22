//! Error types for the signs service
//!
//! This module defines the error taxonomy for every component. Fetch and
//! decode errors are transient and absorbed by the refresh scheduler; config
//! errors are fatal at startup; encode errors surface as HTTP 500 responses.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while fetching the upstream schedule feed
#[derive(Error, Debug)]
pub enum FetchError {
    /// Network, TLS or timeout failure reported by the HTTP client
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("Upstream returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// Upstream body exceeded the configured size limit
    #[error("Feed body too large: {size} bytes exceeds limit of {limit} bytes")]
    BodyTooLarge { size: usize, limit: usize },
}

impl FetchError {
    /// Whether the error came from a timeout rather than a refusal or bad status
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Http(e) if e.is_timeout())
    }
}

/// Errors raised while decoding raw feed bytes into presentations
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Payload was not valid JSON for the expected schema
    #[error("Invalid JSON feed: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload was not valid XML for the expected schema
    #[error("Invalid XML feed: {0}")]
    Xml(#[from] quick_xml::de::DeError),

    /// XML payload was not UTF-8
    #[error("Feed is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Payload parsed but every record failed validation
    #[error("Feed contained no valid presentations ({dropped} records dropped)")]
    NoValidRecords { dropped: usize },

    /// Payload was empty or whitespace only
    #[error("Feed payload is empty")]
    EmptyPayload,
}

/// Reasons an individual feed record is rejected
///
/// Record errors never fail a batch on their own; they are logged and the
/// record is skipped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("empty {field}")]
    EmptyField { field: &'static str },

    #[error("invalid {field} timestamp: {value:?}")]
    InvalidTimestamp { field: &'static str, value: String },

    #[error("malformed record: {reason}")]
    Malformed { reason: String },
}

/// Snapshot persistence errors
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Snapshot directory could not be created or written
    #[error("Snapshot I/O failed for {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stored snapshot is not valid wire-format JSON
    #[error("Snapshot at {path:?} is corrupted: {source}")]
    Corrupted {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Snapshot could not be serialised
    #[error("Snapshot serialisation failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Stored content hash is not a valid SHA-256 hex string
    #[error("Invalid content hash: {hash}. Expected SHA-256 hex string")]
    InvalidHash { hash: String },
}

/// Refresh scheduler lifecycle errors
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// Lifecycle operation invoked from the wrong state
    #[error("Invalid scheduler state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// Refresh loop did not confirm exit within the stop timeout
    #[error("Refresh scheduler shutdown timeout after {millis} ms")]
    ShutdownTimeout { millis: u128 },

    /// Refresh loop task panicked
    #[error("Refresh loop terminated unexpectedly: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}

/// HTTP server errors
#[derive(Error, Debug)]
pub enum ServerError {
    /// Listener could not be bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot could not be encoded to the wire format
    #[error("Failed to encode schedule: {0}")]
    Encode(#[from] serde_json::Error),

    /// Sponsor directory could not be listed
    #[error("Failed to read sponsor images from {path:?}: {source}")]
    SponsorListing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Server loop failed while serving
    #[error("HTTP server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path:?}")]
    NotFound { path: PathBuf },

    /// Configuration file could not be read or written
    #[error("Configuration file I/O failed for {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration format
    #[error("Invalid configuration format: {0}")]
    InvalidFormat(#[from] toml::de::Error),

    /// Listen port outside 1-65535
    #[error("Invalid port: {reason}")]
    InvalidPort { reason: String },

    /// Schedule URL failed validation
    #[error("Invalid schedule URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Refresh interval below the one-minute floor
    #[error("Invalid refresh interval: {reason}")]
    InvalidRefreshInterval { reason: String },

    /// Unknown feed format name
    #[error("Unknown feed format {value:?}. Expected auto, json or xml")]
    InvalidFormatName { value: String },

    /// User config directory could not be determined
    #[error("Could not determine user config directory")]
    NoConfigDir,
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if the error is recoverable (resolved by a later refresh tick)
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Fetch(_) | AppError::Decode(_) | AppError::Persistence(_) => true,
            AppError::Scheduler(SchedulerError::ShutdownTimeout { .. }) => true,
            _ => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Fetch(_) => "fetch",
            AppError::Decode(_) => "decode",
            AppError::Persistence(_) => "persistence",
            AppError::Scheduler(_) => "scheduler",
            AppError::Server(_) => "server",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Fetch result type alias
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Decode result type alias
pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

/// Persistence result type alias
pub type PersistenceResult<T> = std::result::Result<T, PersistenceError>;

/// Scheduler result type alias
pub type SchedulerResult<T> = std::result::Result<T, SchedulerError>;

/// Config result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let err = AppError::from(DecodeError::NoValidRecords { dropped: 3 });
        assert_eq!(err.category(), "decode");
        assert!(err.is_recoverable());

        let err = AppError::from(ConfigError::InvalidPort {
            reason: "port must be between 1 and 65535, got 0".to_string(),
        });
        assert_eq!(err.category(), "config");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_error_messages() {
        let err = DecodeError::NoValidRecords { dropped: 2 };
        assert_eq!(
            err.to_string(),
            "Feed contained no valid presentations (2 records dropped)"
        );

        let err = RecordError::EmptyField { field: "Name" };
        assert_eq!(err.to_string(), "empty Name");

        let err = FetchError::Status {
            status: 503,
            url: "http://localhost/signs".to_string(),
        };
        assert!(err.to_string().contains("503"));
        assert!(!err.is_timeout());
    }
}
