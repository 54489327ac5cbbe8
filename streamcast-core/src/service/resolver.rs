//! Stream resolver: "what to play" to "a URL to play"
//!
//! Pure composition over the store, guide cache, provider, path registry and
//! hub. Holds no state of its own; its errors are its dependencies' errors.

use std::sync::Arc;

use tracing::debug;

use crate::cache::GuideCache;
use crate::models::{CameraRef, Channel, ChannelId, LiveTvServer, UserId};
use crate::provider::{LiveTvProvider, MediaHub};
use crate::repository::CastStore;
use crate::service::StreamPathRegistry;
use crate::{Error, Result};

#[derive(Clone)]
pub struct StreamResolver {
    store: Arc<dyn CastStore>,
    guide: GuideCache,
    provider: Arc<dyn LiveTvProvider>,
    paths: Arc<StreamPathRegistry>,
    hub: Arc<dyn MediaHub>,
}

impl StreamResolver {
    pub fn new(
        store: Arc<dyn CastStore>,
        guide: GuideCache,
        provider: Arc<dyn LiveTvProvider>,
        paths: Arc<StreamPathRegistry>,
        hub: Arc<dyn MediaHub>,
    ) -> Self {
        Self {
            store,
            guide,
            provider,
            paths,
            hub,
        }
    }

    /// Channel and its server, owned by `user_id`.
    ///
    /// Stored channels are tried first, then the cached guides of the user's servers.
    pub async fn find_channel(
        &self,
        user_id: &UserId,
        channel_id: &ChannelId,
    ) -> Result<(Channel, LiveTvServer)> {
        if let Some(channel) = self.store.get_channel(user_id, channel_id).await? {
            let server = self
                .store
                .get_server(user_id, &channel.server_id)
                .await?
                .ok_or_else(|| {
                    Error::NotFound(format!(
                        "Server {} for channel {channel_id}",
                        channel.server_id
                    ))
                })?;
            return Ok((channel, server));
        }

        let servers = self.store.list_servers().await?;
        servers
            .into_iter()
            .filter(|server| &server.user_id == user_id)
            .find_map(|server| {
                self.guide
                    .find_channel(&server.id, channel_id.as_str())
                    .map(|channel| (channel, server))
            })
            .ok_or_else(|| Error::NotFound(format!("Channel {channel_id}")))
    }

    /// Playable URL for a live-TV channel. Deterministic for fixed credentials.
    pub async fn resolve_channel_stream(
        &self,
        user_id: &UserId,
        channel_id: &ChannelId,
    ) -> Result<String> {
        let (channel, server) = self.find_channel(user_id, channel_id).await?;
        let url = self.provider.build_stream_url(&server, &channel.external_id)?;
        debug!(channel_id = %channel_id, server_id = %server.id, "Resolved channel stream");
        Ok(url)
    }

    /// Playable URL for a camera.
    ///
    /// Standalone cameras are registered (upserted) with the transcoding
    /// gateway and resolve to their HLS URL; hub cameras resolve to the hub's
    /// camera proxy.
    pub async fn resolve_camera_stream(
        &self,
        user_id: &UserId,
        camera: &CameraRef,
    ) -> Result<String> {
        match camera {
            CameraRef::Standalone { camera_id } => {
                let camera = self
                    .store
                    .get_camera(user_id, camera_id)
                    .await?
                    .ok_or_else(|| Error::NotFound(format!("Camera {camera_id}")))?;
                let registered = self
                    .paths
                    .register_camera(&camera.id, &camera.source_url, camera.credentials.as_ref())
                    .await?;
                Ok(registered.hls_url)
            }
            CameraRef::Hub { entity_id } => {
                let hub = self
                    .store
                    .get_hub(user_id)
                    .await?
                    .ok_or_else(|| Error::NotFound(format!("Hub connection for user {user_id}")))?;
                self.hub.camera_proxy_url(&hub, entity_id)
            }
        }
    }
}
