//! Xtream HTTP API Types
//!
//! Wire types for `player_api.php` JSON responses. Panels disagree on whether ids
//! and timestamps are numbers or strings, so those fields accept both.

use base64::Engine as _;
use serde::{Deserialize, Deserializer};

/// Live category as returned by `get_live_categories`
#[derive(Debug, Clone, Deserialize)]
pub struct LiveCategory {
    #[serde(deserialize_with = "string_or_number")]
    pub category_id: String,
    pub category_name: String,
    #[serde(default)]
    pub parent_id: Option<serde_json::Value>,
}

/// Live stream as returned by `get_live_streams`
#[derive(Debug, Clone, Deserialize)]
pub struct LiveStream {
    #[serde(deserialize_with = "string_or_number")]
    pub stream_id: String,
    pub name: String,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub category_id: Option<String>,
    #[serde(default)]
    pub stream_icon: Option<String>,
    #[serde(default)]
    pub epg_channel_id: Option<String>,
}

/// `get_short_epg` envelope
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShortEpg {
    #[serde(default)]
    pub epg_listings: Vec<EpgListing>,
}

/// One program slot. `title`/`description` are base64 on most panels.
#[derive(Debug, Clone, Deserialize)]
pub struct EpgListing {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(deserialize_with = "timestamp")]
    pub start_timestamp: i64,
    #[serde(deserialize_with = "timestamp")]
    pub stop_timestamp: i64,
}

impl EpgListing {
    #[must_use]
    pub fn decoded_title(&self) -> String {
        decode_text(&self.title)
    }

    #[must_use]
    pub fn decoded_description(&self) -> String {
        decode_text(&self.description)
    }
}

/// Decode a base64 text field, falling back to the raw value for panels that
/// send plain text.
///
/// Plain titles can be valid base64 by accident ("AAAA"), so the decoded
/// bytes are only used when they form printable UTF-8 text.
#[must_use]
pub fn decode_text(raw: &str) -> String {
    base64::engine::general_purpose::STANDARD
        .decode(raw.trim())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .filter(|text| is_printable(text))
        .unwrap_or_else(|| raw.to_string())
}

fn is_printable(text: &str) -> bool {
    text.chars()
        .all(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Int(i64),
    Float(f64),
}

impl StringOrNumber {
    fn into_string(self) -> String {
        match self {
            Self::String(s) => s,
            Self::Int(n) => n.to_string(),
            Self::Float(f) => f.to_string(),
        }
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    StringOrNumber::deserialize(deserializer).map(StringOrNumber::into_string)
}

fn opt_string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<StringOrNumber>::deserialize(deserializer)?
        .map(StringOrNumber::into_string)
        .filter(|s| !s.is_empty()))
}

fn timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let raw = string_or_number(deserializer)?;
    raw.trim()
        .parse::<i64>()
        .map_err(|e| serde::de::Error::custom(format!("invalid timestamp {raw:?}: {e}")))
}
