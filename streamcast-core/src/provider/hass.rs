//! Home Assistant media hub

use async_trait::async_trait;
use dashmap::DashMap;
use std::time::Duration;
use streamcast_clients::hass::PlayMediaRequest;
use streamcast_clients::{ClientError, HassClient};

use super::traits::MediaHub;
use crate::models::{CastTarget, HubConnection, UserId};
use crate::{Error, Result};

const MEDIA_PLAYER_DOMAIN: &str = "media_player";

/// `MediaHub` over the Home Assistant REST API.
///
/// One client per user's hub connection, rebuilt when its URL or token changes.
pub struct HassHub {
    clients: DashMap<UserId, HassClient>,
    timeout: Duration,
}

impl HassHub {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            clients: DashMap::new(),
            timeout,
        }
    }

    fn client(&self, hub: &HubConnection) -> Result<HassClient> {
        if let Some(client) = self.clients.get(&hub.user_id) {
            if client.base_url() == hub.base_url.trim_end_matches('/')
                && client.token() == hub.access_token
            {
                return Ok(client.clone());
            }
        }
        let client = HassClient::with_timeout(&hub.base_url, &hub.access_token, self.timeout)
            .map_err(|e| Error::InvalidInput(format!("Hub connection for {}: {e}", hub.user_id)))?;
        self.clients.insert(hub.user_id.clone(), client.clone());
        Ok(client)
    }
}

impl Default for HassHub {
    fn default() -> Self {
        Self::new(HassClient::DEFAULT_TIMEOUT)
    }
}

/// A rejected token is an authorization problem, not a dispatch failure
fn map_listing_error(err: ClientError) -> Error {
    match err.status().map(|s| s.as_u16()) {
        Some(401 | 403) => Error::Unauthorized("Hub rejected the access token".to_string()),
        _ => err.into(),
    }
}

#[async_trait]
impl MediaHub for HassHub {
    async fn media_players(&self, hub: &HubConnection) -> Result<Vec<CastTarget>> {
        let states = self
            .client(hub)?
            .states()
            .await
            .map_err(map_listing_error)?;

        Ok(states
            .iter()
            .filter(|s| s.domain() == MEDIA_PLAYER_DOMAIN)
            .map(|s| CastTarget::media_player(s.entity_id.as_str(), s.friendly_name()))
            .collect())
    }

    async fn play_media(
        &self,
        hub: &HubConnection,
        entity_id: &str,
        content_type: &str,
        content_id: &str,
    ) -> Result<()> {
        let request = PlayMediaRequest {
            entity_id: entity_id.to_string(),
            media_content_type: content_type.to_string(),
            media_content_id: content_id.to_string(),
        };
        self.client(hub)?.play_media(&request).await?;
        Ok(())
    }

    fn camera_proxy_url(&self, hub: &HubConnection, entity_id: &str) -> Result<String> {
        Ok(self.client(hub)?.camera_proxy_stream_url(entity_id))
    }
}
