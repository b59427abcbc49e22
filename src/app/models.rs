//! Data models for the signs service
//!
//! This module defines the normalized schedule types shared by the feed
//! decoders, the schedule cache and the HTTP layer, together with the JSON
//! wire format served at `GET /schedule`.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::app::hash::ContentHash;

/// A scheduled block of time at one location
///
/// Timestamps keep the offset they were published with so the frontend can
/// render local conference time. `start_time <= end_time` is not enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Event {
    /// Session title
    pub name: String,
    /// Plain-text abstract
    pub description: String,
    /// Room or area
    pub location: String,
    /// Session start instant
    pub start_time: DateTime<FixedOffset>,
    /// Session end instant
    pub end_time: DateTime<FixedOffset>,
}

impl Event {
    /// Whether the event is in progress at `now`
    pub fn is_running_at(&self, now: DateTime<Utc>) -> bool {
        self.start_time <= now && now < self.end_time
    }
}

/// A talk: an event plus speakers and a topic track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presentation {
    #[serde(flatten)]
    pub event: Event,
    /// Speaker names, never blank, possibly empty
    #[serde(rename = "Speakers", default)]
    pub speakers: Vec<String>,
    /// Topic or track name, may be empty
    #[serde(rename = "Topic", default)]
    pub topic: String,
}

impl Presentation {
    /// Session title
    pub fn name(&self) -> &str {
        &self.event.name
    }

    pub fn start_time(&self) -> DateTime<FixedOffset> {
        self.event.start_time
    }

    pub fn end_time(&self) -> DateTime<FixedOffset> {
        self.event.end_time
    }
}

/// Point-in-time view of the cached schedule
///
/// Cloning a `Schedule` shares the presentation list behind an `Arc`, so
/// handing a snapshot to every request is cheap. The list itself is never
/// mutated after construction; the cache swaps in a new `Arc` instead.
///
/// Serializes to the wire format:
///
/// ```json
/// {
///   "Presentations": [ ... ],
///   "lastUpdateTime": "2025-03-06T09:00:00Z",
///   "lastRefreshTime": "2025-03-06T09:05:00Z",
///   "contentHash": "ba78...15ad",
///   "sessionCount": 42
/// }
/// ```
///
/// Absent timestamps and hashes are written as empty strings and read back
/// as `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    #[serde(rename = "Presentations", default)]
    pub presentations: Arc<Vec<Presentation>>,
    #[serde(rename = "lastUpdateTime", default, with = "optional_rfc3339")]
    pub last_update_time: Option<DateTime<Utc>>,
    #[serde(rename = "lastRefreshTime", default, with = "optional_rfc3339")]
    pub last_refresh_time: Option<DateTime<Utc>>,
    #[serde(rename = "contentHash", default, with = "optional_hash")]
    pub content_hash: Option<ContentHash>,
    #[serde(rename = "sessionCount", default)]
    pub session_count: usize,
}

impl Schedule {
    /// The empty schedule present before the first successful refresh
    pub fn empty() -> Self {
        Self {
            presentations: Arc::new(Vec::new()),
            last_update_time: None,
            last_refresh_time: None,
            content_hash: None,
            session_count: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.presentations.is_empty()
    }

    /// Recompute `session_count` from the presentation list
    ///
    /// Used when accepting externally produced snapshots whose count field
    /// may be missing or stale.
    pub fn normalized(mut self) -> Self {
        self.session_count = self.presentations.len();
        self
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::empty()
    }
}

/// Serde helpers for `Option<DateTime<Utc>>` encoded as RFC3339 or ""
mod optional_rfc3339 {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(time) => {
                serializer.serialize_str(&time.to_rfc3339_opts(SecondsFormat::Secs, true))
            }
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        if raw.trim().is_empty() {
            return Ok(None);
        }
        DateTime::parse_from_rfc3339(raw.trim())
            .map(|time| Some(time.with_timezone(&Utc)))
            .map_err(serde::de::Error::custom)
    }
}

/// Serde helpers for `Option<ContentHash>` encoded as hex or ""
mod optional_hash {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::app::hash::ContentHash;

    pub fn serialize<S>(value: &Option<ContentHash>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(hash) => serializer.serialize_str(&hash.to_hex()),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<ContentHash>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        if raw.is_empty() {
            return Ok(None);
        }
        ContentHash::from_hex(&raw)
            .map(Some)
            .map_err(serde::de::Error::custom)
    }
}
