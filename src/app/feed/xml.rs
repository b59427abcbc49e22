//! XML feed schema
//!
//! ```xml
//! <nodes>
//!   <node>
//!     <Title>Keynote</Title>
//!     <Room>Ballroom</Room>
//!     <Time>&lt;span content="2025-03-06T09:00:00-08:00"&gt;...</Time>
//!     <Speakers>Ada Lovelace, Alan Turing</Speakers>
//!     <Topic>General</Topic>
//!     <Short-abstract>&lt;p&gt;Opening remarks&lt;/p&gt;</Short-abstract>
//!   </node>
//! </nodes>
//! ```

use serde::Deserialize;

use super::text::{
    clean_text, collapse_whitespace, extract_time_attributes, split_speakers, strip_tags,
};
use super::{collect_valid, ensure_not_blank, FeedDecoder, RecordDraft};
use crate::app::models::Presentation;
use crate::errors::{DecodeResult, RecordError};

/// Decoder for the `<nodes>` XML schema
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlFeed;

#[derive(Debug, Default, Deserialize)]
struct Nodes {
    #[serde(rename = "node", default)]
    nodes: Vec<Node>,
}

/// One `<node>`; elements not listed here are ignored
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Node {
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Room")]
    room: String,
    #[serde(rename = "Time")]
    time: String,
    #[serde(rename = "Speakers")]
    speakers: String,
    #[serde(rename = "Topic")]
    topic: String,
    #[serde(rename = "Short-abstract")]
    short_abstract: String,
}

impl Node {
    fn into_presentation(self) -> Result<Presentation, RecordError> {
        let mut instants = extract_time_attributes(&self.time)?.into_iter();

        RecordDraft {
            name: clean_text(&self.title),
            description: collapse_whitespace(&strip_tags(&self.short_abstract)),
            location: clean_text(&self.room),
            start_time: instants.next().unwrap_or_default(),
            end_time: instants.next().unwrap_or_default(),
            speakers: split_speakers(&self.speakers),
            topic: clean_text(&self.topic),
        }
        .into_presentation()
    }
}

impl FeedDecoder for XmlFeed {
    fn decode(&self, raw: &[u8]) -> DecodeResult<Vec<Presentation>> {
        ensure_not_blank(raw)?;
        let document = std::str::from_utf8(raw)?;
        let nodes: Nodes = quick_xml::de::from_str(document)?;
        collect_valid(nodes.nodes.into_iter().map(Node::into_presentation))
    }
}
