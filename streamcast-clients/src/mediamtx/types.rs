//! MediaMTX HTTP API Types

use serde::{Deserialize, Serialize};

/// Path configuration (subset used for on-demand restreaming).
///
/// Unset fields are omitted on the wire, which makes the same type usable for
/// both `add` (full config) and `patch` (partial config).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathConf {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_on_demand: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_on_demand_start_timeout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_on_demand_close_after: Option<String>,
}

/// Runtime path status from `/v3/paths/get/{name}`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathStatus {
    pub name: String,
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub ready_time: Option<String>,
    #[serde(default)]
    pub readers: Vec<serde_json::Value>,
    #[serde(default)]
    pub source: Option<serde_json::Value>,
}

impl PathStatus {
    /// Number of attached readers (viewers)
    #[must_use]
    pub fn reader_count(&self) -> usize {
        self.readers.len()
    }
}

/// Paged path listing from `/v3/paths/list`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathList {
    #[serde(default)]
    pub item_count: u64,
    #[serde(default)]
    pub page_count: u64,
    #[serde(default)]
    pub items: Vec<PathStatus>,
}
