//! Schedule cache and snapshot persistence
//!
//! # Module Organization
//!
//! - [`manager`] - The in-memory [`ScheduleCache`] with atomic replacement and
//!   content-hash change detection
//! - [`persistence`] - Optional on-disk [`SnapshotStore`] used to warm the
//!   cache at startup
//!
//! # Examples
//!
//! ```rust
//! use signs::app::cache::{ScheduleCache, UpdateOutcome};
//! use signs::app::feed::FeedFormat;
//!
//! let cache = ScheduleCache::new();
//! let feed = br#"[{"Name": "Keynote", "Description": "Welcome",
//!     "Location": "Ballroom", "StartTime": "2025-03-06T09:00:00-08:00",
//!     "EndTime": "2025-03-06T10:00:00-08:00", "Speakers": "Ada", "Topic": ""}]"#;
//!
//! assert!(cache.try_update(feed, &FeedFormat::Json).unwrap().changed());
//! assert_eq!(cache.try_update(feed, &FeedFormat::Json).unwrap(), UpdateOutcome::Unchanged);
//! assert_eq!(cache.snapshot().session_count, 1);
//! ```

pub mod manager;
pub mod persistence;

// Re-export main public API
pub use manager::{ScheduleCache, UpdateOutcome};
pub use persistence::SnapshotStore;
