//! JSON feed schema
//!
//! The payload is parsed as an array of loosely-typed values first, then
//! each element is converted on its own so a single malformed record only
//! costs that record.

use serde::Deserialize;
use serde_json::Value;

use super::text::{clean_speakers, clean_text, split_speakers};
use super::{collect_valid, ensure_not_blank, FeedDecoder, RecordDraft};
use crate::app::models::Presentation;
use crate::errors::{DecodeResult, RecordError};

/// Decoder for the JSON array schema
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFeed;

/// `Speakers` is published either as one comma-separated string or as a list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeakerField {
    FlatString(String),
    StringList(Vec<String>),
}

impl SpeakerField {
    /// Interpret a raw `Speakers` value
    ///
    /// Non-string list entries are skipped. Any other shape yields `None`,
    /// which reads as no speakers; it never rejects the record.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(flat) => Some(SpeakerField::FlatString(flat)),
            Value::Array(items) => Some(SpeakerField::StringList(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::String(name) => Some(name),
                        _ => None,
                    })
                    .collect(),
            )),
            _ => None,
        }
    }

    /// Normalize to clean, non-empty names
    pub fn into_names(self) -> Vec<String> {
        match self {
            SpeakerField::FlatString(flat) => split_speakers(&flat),
            SpeakerField::StringList(names) => clean_speakers(names),
        }
    }
}

/// One upstream JSON record; missing or null fields read as empty
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct JsonRecord {
    name: Option<String>,
    description: Option<String>,
    location: Option<String>,
    start_time: Option<String>,
    end_time: Option<String>,
    speakers: Option<Value>,
    topic: Option<String>,
}

impl JsonRecord {
    fn into_draft(self) -> RecordDraft {
        let text = |field: Option<String>| clean_text(field.as_deref().unwrap_or_default());

        RecordDraft {
            name: text(self.name),
            description: text(self.description),
            location: text(self.location),
            start_time: self.start_time.unwrap_or_default(),
            end_time: self.end_time.unwrap_or_default(),
            speakers: self
                .speakers
                .and_then(SpeakerField::from_value)
                .map(SpeakerField::into_names)
                .unwrap_or_default(),
            topic: text(self.topic),
        }
    }
}

fn decode_record(value: Value) -> Result<Presentation, RecordError> {
    let record: JsonRecord =
        serde_json::from_value(value).map_err(|e| RecordError::Malformed {
            reason: e.to_string(),
        })?;
    record.into_draft().into_presentation()
}

impl FeedDecoder for JsonFeed {
    fn decode(&self, raw: &[u8]) -> DecodeResult<Vec<Presentation>> {
        ensure_not_blank(raw)?;
        let values: Vec<Value> = serde_json::from_slice(raw)?;
        collect_valid(values.into_iter().map(decode_record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DecodeError;

    fn record(name: &str, speakers: Value) -> Value {
        serde_json::json!({
            "Name": name,
            "Description": "A talk about things",
            "Location": "Room 101",
            "StartTime": "2025-03-06T10:00:00-08:00",
            "EndTime": "2025-03-06T11:00:00-08:00",
            "Speakers": speakers,
            "Topic": "Security"
        })
    }

    fn decode(values: Vec<Value>) -> DecodeResult<Vec<Presentation>> {
        let raw = serde_json::to_vec(&values).unwrap();
        JsonFeed.decode(&raw)
    }

    #[test]
    fn test_empty_name_record_dropped() {
        let presentations = decode(vec![
            record("Keynote", Value::from("Ada")),
            record("", Value::from("Alan")),
        ])
        .unwrap();

        assert_eq!(presentations.len(), 1);
        assert_eq!(presentations[0].name(), "Keynote");
    }

    #[test]
    fn test_speaker_shapes() {
        let presentations = decode(vec![
            record("Flat", Value::from("Ada Lovelace, Alan Turing,")),
            record("List", serde_json::json!(["  Grace  Hopper", "", "Linus"])),
            record("Absent", Value::Null),
        ])
        .unwrap();

        assert_eq!(presentations[0].speakers, vec!["Ada Lovelace", "Alan Turing"]);
        assert_eq!(presentations[1].speakers, vec!["Grace Hopper", "Linus"]);
        assert!(presentations[2].speakers.is_empty());
    }

    #[test]
    fn test_odd_speaker_shapes_keep_record() {
        let presentations = decode(vec![
            record("Flat", Value::from("Ada")),
            record("Mixed", serde_json::json!(["Ada", 7, null, "Alan"])),
            record("Number", Value::from(7)),
            record("Object", serde_json::json!({"name": "Ada"})),
        ])
        .unwrap();

        assert_eq!(presentations.len(), 4);
        assert_eq!(presentations[0].speakers, vec!["Ada"]);
        assert_eq!(presentations[1].speakers, vec!["Ada", "Alan"]);
        assert!(presentations[2].speakers.is_empty());
        assert!(presentations[3].speakers.is_empty());
    }

    #[test]
    fn test_speaker_field_from_value() {
        assert_eq!(
            SpeakerField::from_value(Value::from("Ada, Alan")),
            Some(SpeakerField::FlatString("Ada, Alan".to_string()))
        );
        assert_eq!(
            SpeakerField::from_value(serde_json::json!([true, "Grace"])),
            Some(SpeakerField::StringList(vec!["Grace".to_string()]))
        );
        assert_eq!(SpeakerField::from_value(Value::Bool(true)), None);
    }

    #[test]
    fn test_entities_and_whitespace_cleaned() {
        let mut value = record("Rust &amp; WebAssembly", Value::from("O&#39;Brien"));
        value["Description"] = Value::from("Line one\n\n   line two");
        value["Location"] = Value::from("Hall&nbsp;B");

        let presentations = decode(vec![value]).unwrap();
        let p = &presentations[0];
        assert_eq!(p.name(), "Rust & WebAssembly");
        assert_eq!(p.event.description, "Line one line two");
        assert_eq!(p.speakers, vec!["O'Brien"]);
        // &nbsp; decodes to U+00A0, which split_whitespace treats as a separator
        assert_eq!(p.event.location, "Hall B");
    }

    #[test]
    fn test_invalid_timestamp_dropped() {
        let mut bad = record("Bad", Value::from("Ada"));
        bad["StartTime"] = Value::from("2025-03-06 10:00");

        let presentations = decode(vec![bad, record("Good", Value::from("Ada"))]).unwrap();
        assert_eq!(presentations.len(), 1);
        assert_eq!(presentations[0].name(), "Good");
    }

    #[test]
    fn test_document_order_preserved() {
        let names = ["Zeta", "Alpha", "Mu"];
        let values = names
            .iter()
            .map(|name| record(name, Value::from("Ada")))
            .collect();

        let decoded: Vec<String> = decode(values)
            .unwrap()
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(decoded, names);
    }

    #[test]
    fn test_payload_errors() {
        assert!(matches!(
            JsonFeed.decode(b"{not json"),
            Err(DecodeError::Json(_))
        ));
        assert!(matches!(
            JsonFeed.decode(b"{\"Name\": \"object not array\"}"),
            Err(DecodeError::Json(_))
        ));
        assert!(matches!(
            JsonFeed.decode(b"[]"),
            Err(DecodeError::NoValidRecords { dropped: 0 })
        ));
        assert!(matches!(
            JsonFeed.decode(b"[1, \"two\"]"),
            Err(DecodeError::NoValidRecords { dropped: 2 })
        ));
    }
}
