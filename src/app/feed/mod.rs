//! Feed decoding
//!
//! Turns raw upstream bytes into an ordered list of validated
//! [`Presentation`]s. Two upstream schemas are understood:
//!
//! - **JSON**: an array of objects with `Name`, `Location`, `StartTime`,
//!   `EndTime`, `Speakers`, `Topic` and `Description` fields
//! - **XML**: a `<nodes>` document of `<node>` elements whose `Time` holds
//!   rendered markup carrying the instants in attributes
//!
//! Decoding is pure: no state, no I/O. Individual records that fail
//! validation are dropped and logged; a payload with no valid records at all
//! is an error, since publishing it would blank every sign.

pub mod json;
pub mod text;
pub mod xml;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::app::models::{Event, Presentation};
use crate::errors::{ConfigError, DecodeError, DecodeResult, RecordError};

pub use json::JsonFeed;
pub use xml::XmlFeed;

/// Converts a raw payload into presentations
///
/// Implementations must be pure so the cache can call them outside its lock
/// and the hash short-circuit stays sound.
pub trait FeedDecoder: Send + Sync {
    fn decode(&self, raw: &[u8]) -> DecodeResult<Vec<Presentation>>;
}

/// Upstream feed schema selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedFormat {
    /// Sniff the payload: `<` as first non-whitespace byte means XML
    #[default]
    Auto,
    Json,
    Xml,
}

impl FeedFormat {
    /// Resolve `Auto` against a concrete payload
    pub fn detect(self, raw: &[u8]) -> FeedFormat {
        match self {
            FeedFormat::Auto => match raw.iter().find(|b| !b.is_ascii_whitespace()) {
                Some(b'<') => FeedFormat::Xml,
                _ => FeedFormat::Json,
            },
            concrete => concrete,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedFormat::Auto => "auto",
            FeedFormat::Json => "json",
            FeedFormat::Xml => "xml",
        }
    }
}

impl fmt::Display for FeedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(FeedFormat::Auto),
            "json" => Ok(FeedFormat::Json),
            "xml" => Ok(FeedFormat::Xml),
            _ => Err(ConfigError::InvalidFormatName {
                value: s.to_string(),
            }),
        }
    }
}

impl FeedDecoder for FeedFormat {
    fn decode(&self, raw: &[u8]) -> DecodeResult<Vec<Presentation>> {
        match self.detect(raw) {
            FeedFormat::Xml => XmlFeed.decode(raw),
            _ => JsonFeed.decode(raw),
        }
    }
}

/// Schema-independent record fields, before validation
#[derive(Debug, Default, Clone)]
pub(crate) struct RecordDraft {
    pub name: String,
    pub description: String,
    pub location: String,
    pub start_time: String,
    pub end_time: String,
    pub speakers: Vec<String>,
    pub topic: String,
}

impl RecordDraft {
    /// Validate required fields and parse timestamps
    pub fn into_presentation(self) -> Result<Presentation, RecordError> {
        if self.name.is_empty() {
            return Err(RecordError::EmptyField { field: "Name" });
        }
        if self.description.is_empty() {
            return Err(RecordError::EmptyField {
                field: "Description",
            });
        }
        if self.location.is_empty() {
            return Err(RecordError::EmptyField { field: "Location" });
        }

        let start_time = text::parse_timestamp("StartTime", &self.start_time)?;
        let end_time = text::parse_timestamp("EndTime", &self.end_time)?;

        Ok(Presentation {
            event: Event {
                name: self.name,
                description: self.description,
                location: self.location,
                start_time,
                end_time,
            },
            speakers: self.speakers,
            topic: self.topic,
        })
    }
}

/// Keep valid records in document order, logging and dropping the rest
pub(crate) fn collect_valid<I>(records: I) -> DecodeResult<Vec<Presentation>>
where
    I: IntoIterator<Item = Result<Presentation, RecordError>>,
{
    let mut presentations = Vec::new();
    let mut dropped = 0usize;

    for (index, record) in records.into_iter().enumerate() {
        match record {
            Ok(presentation) => {
                if presentation.start_time() > presentation.end_time() {
                    warn!(
                        index,
                        name = %presentation.name(),
                        start = %presentation.start_time(),
                        end = %presentation.end_time(),
                        "Presentation ends before it starts"
                    );
                }
                presentations.push(presentation);
            }
            Err(e) => {
                dropped += 1;
                warn!(index, error = %e, "Dropping invalid feed record");
            }
        }
    }

    if presentations.is_empty() {
        return Err(DecodeError::NoValidRecords { dropped });
    }

    debug!(
        valid = presentations.len(),
        dropped, "Decoded feed records"
    );
    Ok(presentations)
}

/// Reject empty and whitespace-only payloads before schema decoding
pub(crate) fn ensure_not_blank(raw: &[u8]) -> DecodeResult<()> {
    if raw.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(DecodeError::EmptyPayload);
    }
    Ok(())
}
