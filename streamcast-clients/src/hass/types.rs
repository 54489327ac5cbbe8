//! Home Assistant HTTP API Types

use serde::{Deserialize, Serialize};

/// Entity state from `GET /api/states`
#[derive(Debug, Clone, Deserialize)]
pub struct EntityState {
    pub entity_id: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl EntityState {
    /// Entity domain (`media_player` for `media_player.living_room`)
    #[must_use]
    pub fn domain(&self) -> &str {
        self.entity_id
            .split_once('.')
            .map_or(self.entity_id.as_str(), |(domain, _)| domain)
    }

    /// `friendly_name` attribute, falling back to the entity id
    #[must_use]
    pub fn friendly_name(&self) -> &str {
        self.attributes
            .get("friendly_name")
            .and_then(|v| v.as_str())
            .unwrap_or(&self.entity_id)
    }
}

/// Body of `POST /api/services/media_player/play_media`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayMediaRequest {
    pub entity_id: String,
    pub media_content_type: String,
    pub media_content_id: String,
}
