// External Collaborator Traits
//
// Interfaces the core consumes. Adapters over the vendor clients live next to
// this file; tests substitute in-memory fakes or mocks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::{CastTarget, Channel, EpgEntry, HubConnection, LiveTvServer};
use crate::Result;

/// Category as listed by a live-TV provider (counts are derived later)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCategory {
    pub id: String,
    pub name: String,
}

/// Live-TV provider
///
/// All network methods take the server record so one provider instance can
/// serve every configured server.
#[async_trait]
pub trait LiveTvProvider: Send + Sync {
    /// Provider type name (e.g., "xtream")
    fn name(&self) -> &'static str;

    async fn list_channels(&self, server: &LiveTvServer) -> Result<Vec<Channel>>;

    async fn list_categories(&self, server: &LiveTvServer) -> Result<Vec<ProviderCategory>>;

    /// Program guide for one channel, keyed by the channel's `external_id`
    async fn list_epg(&self, server: &LiveTvServer, external_id: &str) -> Result<Vec<EpgEntry>>;

    /// Playable URL with the server's auth parameters embedded.
    ///
    /// Must be pure: same server credentials and `external_id` give the same URL.
    fn build_stream_url(&self, server: &LiveTvServer, external_id: &str) -> Result<String>;
}

/// Desired configuration of an on-demand gateway path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathDefinition {
    pub source: String,
    pub source_on_demand: bool,
    pub start_timeout: String,
    pub close_after: String,
}

/// Runtime view of a gateway path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathRuntime {
    pub ready: bool,
    pub readers: usize,
}

/// RTSP to web transcoding gateway
#[async_trait]
pub trait TranscodeGateway: Send + Sync {
    /// Current configuration of a path, `None` if it does not exist
    async fn get_path(&self, name: &str) -> Result<Option<PathDefinition>>;

    async fn add_path(&self, name: &str, definition: &PathDefinition) -> Result<()>;

    async fn update_path(&self, name: &str, definition: &PathDefinition) -> Result<()>;

    /// Remove a path. `Ok(false)` when it was already absent.
    async fn delete_path(&self, name: &str) -> Result<bool>;

    /// Runtime status, `None` if the path is not configured
    async fn path_runtime(&self, name: &str) -> Result<Option<PathRuntime>>;

    /// Cheap reachability check
    async fn ping(&self) -> Result<()>;
}

/// Smart-home hub exposing remote media players and camera proxies
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaHub: Send + Sync {
    /// `media_player.*` entities as cast targets
    async fn media_players(&self, hub: &HubConnection) -> Result<Vec<CastTarget>>;

    async fn play_media(
        &self,
        hub: &HubConnection,
        entity_id: &str,
        content_type: &str,
        content_id: &str,
    ) -> Result<()>;

    /// Camera proxy URL for a hub camera entity. No request is made.
    fn camera_proxy_url(&self, hub: &HubConnection, entity_id: &str) -> Result<String>;
}
