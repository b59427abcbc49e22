//! Text normalization shared by the feed decoders

use chrono::{DateTime, FixedOffset};
use quick_xml::escape::unescape;
use scraper::{Html, Selector};

use crate::constants::feed::{MAX_ENTITY_LEN, TIME_ATTRIBUTE_SELECTOR, TIME_ATTRIBUTES};
use crate::errors::RecordError;

/// Collapse newlines and runs of whitespace to single spaces and trim
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode HTML named and numeric character references
///
/// Stray ampersands that do not start a valid reference are kept verbatim,
/// so `"Q&A &amp; more"` becomes `"Q&A & more"`.
pub fn unescape_html(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    match unescape(s) {
        Ok(unescaped) => unescaped.into_owned(),
        Err(_) => unescape_lenient(s),
    }
}

fn unescape_lenient(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];

        let reference = tail
            .find(';')
            .filter(|&end| end <= MAX_ENTITY_LEN)
            .and_then(|end| {
                unescape(&tail[..=end])
                    .ok()
                    .map(|decoded| (decoded.into_owned(), end))
            });

        match reference {
            Some((decoded, end)) => {
                out.push_str(&decoded);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Unescape entities then collapse whitespace
pub fn clean_text(s: &str) -> String {
    collapse_whitespace(&unescape_html(s))
}

/// Remove HTML tags, keeping only text content
pub fn strip_tags(markup: &str) -> String {
    if !markup.contains('<') {
        return unescape_html(markup);
    }
    let fragment = Html::parse_fragment(markup);
    fragment.root_element().text().collect::<String>()
}

/// Split a comma-separated speaker list into clean, non-empty names
pub fn split_speakers(flat: &str) -> Vec<String> {
    flat.split(',')
        .map(clean_text)
        .filter(|name| !name.is_empty())
        .collect()
}

/// Clean every entry of a speaker list, dropping blanks
pub fn clean_speakers<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|name| clean_text(name.as_ref()))
        .filter(|name| !name.is_empty())
        .collect()
}

/// Parse an RFC3339 timestamp, keeping its published offset
pub fn parse_timestamp(
    field: &'static str,
    value: &str,
) -> Result<DateTime<FixedOffset>, RecordError> {
    DateTime::parse_from_rfc3339(value.trim()).map_err(|_| RecordError::InvalidTimestamp {
        field,
        value: value.to_string(),
    })
}

/// Pull the machine-readable instants out of a rendered time range
///
/// Upstream renders times as markup such as
/// `<span content="2025-03-06T10:00:00-08:00">10:00</span>`; the `content`
/// or `datetime` attributes are returned in document order.
pub fn extract_time_attributes(markup: &str) -> Result<Vec<String>, RecordError> {
    let selector = Selector::parse(TIME_ATTRIBUTE_SELECTOR).map_err(|e| RecordError::Malformed {
        reason: format!("invalid time selector: {}", e),
    })?;

    let fragment = Html::parse_fragment(markup);
    let values = fragment
        .select(&selector)
        .filter_map(|element| {
            TIME_ATTRIBUTES
                .iter()
                .find_map(|attr| element.value().attr(attr))
        })
        .map(|value| value.trim().to_string())
        .collect();

    Ok(values)
}
