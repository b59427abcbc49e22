//! Prelude module for the signs library
//!
//! This module re-exports the most commonly used items from the library,
//! providing a convenient way to import everything needed for typical usage
//! with a single `use signs::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust
//! use signs::prelude::*;
//!
//! let cache = ScheduleCache::new();
//! let outcome = cache.try_update(b"[]", &FeedFormat::Auto);
//! assert!(outcome.is_err());
//! assert_eq!(cache.snapshot().session_count, 0);
//! ```

// Core result types
pub use crate::errors::{AppError, Result};

// Schedule pipeline
pub use crate::app::{
    AppState, AssetConfig, ClientConfig, ContentHash, FeedDecoder, FeedFormat, HttpFetcher,
    HttpServer, Presentation, RefreshConfig, RefreshScheduler, Schedule, ScheduleCache,
    ScheduleFetcher, SchedulerState, ServerConfig, SnapshotStore, UpdateOutcome,
};

// Configuration
pub use crate::config::AppConfig;

// Commonly used constants
pub use crate::constants::{DEFAULT_PORT, REFRESH_INTERVAL, USER_AGENT};
