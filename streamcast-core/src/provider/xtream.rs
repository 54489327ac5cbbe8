//! Xtream Codes live-TV provider
//!
//! One `XtreamClient` is kept per server and rebuilt when the server's URL or
//! credentials change.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use dashmap::DashMap;
use std::time::Duration;
use streamcast_clients::xtream::{EpgListing, LiveStream};
use streamcast_clients::XtreamClient;

use super::traits::{LiveTvProvider, ProviderCategory};
use crate::models::{Channel, ChannelId, EpgEntry, LiveTvServer, ServerId};
use crate::{Error, Result};

pub struct XtreamProvider {
    clients: DashMap<ServerId, XtreamClient>,
    timeout: Duration,
}

impl XtreamProvider {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            clients: DashMap::new(),
            timeout,
        }
    }

    fn client(&self, server: &LiveTvServer) -> Result<XtreamClient> {
        let (username, password) = server.credentials().ok_or_else(|| {
            Error::Unauthorized(format!("Server {} has no credentials configured", server.id))
        })?;
        if let Some(client) = self.clients.get(&server.id) {
            if client.is_account(&server.base_url, username, password) {
                return Ok(client.clone());
            }
        }

        let client = XtreamClient::with_timeout(&server.base_url, username, password, self.timeout)
            .map_err(|e| Error::InvalidInput(format!("Server {}: {e}", server.id)))?;
        self.clients.insert(server.id.clone(), client.clone());
        Ok(client)
    }
}

impl Default for XtreamProvider {
    fn default() -> Self {
        Self::new(XtreamClient::DEFAULT_TIMEOUT)
    }
}

fn to_channel(server: &LiveTvServer, stream: LiveStream) -> Channel {
    Channel {
        id: ChannelId::from(stream.stream_id.as_str()),
        server_id: server.id.clone(),
        external_id: stream.stream_id,
        name: stream.name,
        category_id: stream.category_id,
        logo_url: stream.stream_icon.filter(|icon| !icon.is_empty()),
    }
}

fn to_epg_entry(external_id: &str, listing: &EpgListing) -> Option<EpgEntry> {
    let start_time = Utc.timestamp_opt(listing.start_timestamp, 0).single()?;
    let end_time = Utc.timestamp_opt(listing.stop_timestamp, 0).single()?;
    Some(EpgEntry {
        channel_id: external_id.to_string(),
        title: listing.decoded_title(),
        description: listing.decoded_description(),
        start_time,
        end_time,
    })
}

#[async_trait]
impl LiveTvProvider for XtreamProvider {
    fn name(&self) -> &'static str {
        "xtream"
    }

    async fn list_channels(&self, server: &LiveTvServer) -> Result<Vec<Channel>> {
        let streams = self.client(server)?.live_streams().await?;
        Ok(streams.into_iter().map(|s| to_channel(server, s)).collect())
    }

    async fn list_categories(&self, server: &LiveTvServer) -> Result<Vec<ProviderCategory>> {
        let categories = self.client(server)?.live_categories().await?;
        Ok(categories
            .into_iter()
            .map(|c| ProviderCategory {
                id: c.category_id,
                name: c.category_name,
            })
            .collect())
    }

    async fn list_epg(&self, server: &LiveTvServer, external_id: &str) -> Result<Vec<EpgEntry>> {
        let epg = self.client(server)?.short_epg(external_id).await?;
        Ok(epg
            .epg_listings
            .iter()
            .filter_map(|listing| to_epg_entry(external_id, listing))
            .collect())
    }

    fn build_stream_url(&self, server: &LiveTvServer, external_id: &str) -> Result<String> {
        Ok(self.client(server)?.stream_url(external_id))
    }
}
