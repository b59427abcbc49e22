//! Schedule cache with atomic snapshot replacement
//!
//! The cache owns the single live [`Schedule`]. Readers copy it out under a
//! shared lock; the presentation list is behind an `Arc`, so a copy costs a
//! reference-count bump and never aliases mutable state. Writers are
//! serialized by a separate mutex and take the exclusive lock only for the
//! final swap, never while decoding.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use crate::app::feed::FeedDecoder;
use crate::app::hash::ContentHash;
use crate::app::models::Schedule;
use crate::errors::{DecodeError, DecodeResult};

/// Result of a successful [`ScheduleCache::try_update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Payload was byte-identical to the cached one; only the refresh time moved
    Unchanged,
    /// Presentations were replaced
    Replaced {
        previous_count: usize,
        session_count: usize,
        hash: ContentHash,
    },
}

impl UpdateOutcome {
    pub fn changed(&self) -> bool {
        matches!(self, UpdateOutcome::Replaced { .. })
    }
}

/// Thread-safe holder of the current schedule snapshot
#[derive(Debug, Default)]
pub struct ScheduleCache {
    /// Live snapshot, replaced as one unit
    state: RwLock<Schedule>,
    /// Serializes writers so hash comparison and swap are not interleaved
    writer: Mutex<()>,
}

impl ScheduleCache {
    /// Create an empty cache (no presentations, no hash, no timestamps)
    pub fn new() -> Self {
        Self::default()
    }

    /// Consistent point-in-time copy of the schedule
    ///
    /// Blocks at most for the duration of a pointer swap.
    pub fn snapshot(&self) -> Schedule {
        self.state.read().clone()
    }

    /// Number of cached presentations
    pub fn session_count(&self) -> usize {
        self.state.read().session_count
    }

    /// Hash of the payload the current presentations were decoded from
    pub fn content_hash(&self) -> Option<ContentHash> {
        self.state.read().content_hash
    }

    /// Offer a freshly fetched payload to the cache
    ///
    /// Byte-identical payloads short-circuit without decoding. A payload that
    /// fails to decode, or decodes to zero presentations, leaves the current
    /// presentations in place. The refresh time advances in every case.
    ///
    /// # Errors
    ///
    /// Returns the `DecodeError` from `decoder`, or
    /// `DecodeError::NoValidRecords` for an empty result.
    pub fn try_update<D>(&self, raw: &[u8], decoder: &D) -> DecodeResult<UpdateOutcome>
    where
        D: FeedDecoder + ?Sized,
    {
        self.try_update_at(raw, decoder, Utc::now())
    }

    /// [`try_update`](Self::try_update) with an explicit clock reading
    pub fn try_update_at<D>(
        &self,
        raw: &[u8],
        decoder: &D,
        now: DateTime<Utc>,
    ) -> DecodeResult<UpdateOutcome>
    where
        D: FeedDecoder + ?Sized,
    {
        let _writer = self.writer.lock();
        let new_hash = ContentHash::of(raw);

        if self.state.read().content_hash == Some(new_hash) {
            self.state.write().last_refresh_time = Some(now);
            debug!(hash = %new_hash, "Feed unchanged since last refresh");
            return Ok(UpdateOutcome::Unchanged);
        }

        let presentations = match decoder.decode(raw) {
            Ok(presentations) if presentations.is_empty() => {
                self.state.write().last_refresh_time = Some(now);
                return Err(DecodeError::NoValidRecords { dropped: 0 });
            }
            Ok(presentations) => presentations,
            Err(e) => {
                self.state.write().last_refresh_time = Some(now);
                return Err(e);
            }
        };

        let session_count = presentations.len();
        let replacement = Schedule {
            presentations: Arc::new(presentations),
            last_update_time: Some(now),
            last_refresh_time: Some(now),
            content_hash: Some(new_hash),
            session_count,
        };

        let previous_count = {
            let mut state = self.state.write();
            let previous_count = state.session_count;
            *state = replacement;
            previous_count
        };

        info!(
            previous_count,
            session_count,
            hash = %new_hash,
            "Schedule replaced"
        );
        Ok(UpdateOutcome::Replaced {
            previous_count,
            session_count,
            hash: new_hash,
        })
    }

    /// Advance the refresh time without touching presentations
    ///
    /// Used when a refresh attempt fails before a payload is available.
    pub fn record_refresh_attempt(&self) {
        self.record_refresh_attempt_at(Utc::now());
    }

    pub fn record_refresh_attempt_at(&self, now: DateTime<Utc>) {
        let _writer = self.writer.lock();
        self.state.write().last_refresh_time = Some(now);
    }

    /// Seed the cache from a previously persisted snapshot
    ///
    /// The stored hash is kept so an unchanged upstream short-circuits on the
    /// first refresh. The refresh time is cleared since no refresh has been
    /// attempted by this process yet.
    pub fn restore(&self, schedule: Schedule) {
        let _writer = self.writer.lock();
        let mut restored = schedule.normalized();
        restored.last_refresh_time = None;

        info!(
            session_count = restored.session_count,
            "Restored schedule snapshot"
        );
        *self.state.write() = restored;
    }
}
