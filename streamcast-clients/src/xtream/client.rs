//! Xtream Codes HTTP Client

use std::time::Duration;

use reqwest::Client;

use super::types::{LiveCategory, LiveStream, ShortEpg};
use crate::error::{check_response, json_with_limit, ClientError};

/// Xtream Codes HTTP Client
///
/// Every API call authenticates with `username`/`password` query parameters,
/// and stream URLs carry the same pair.
#[derive(Clone)]
pub struct XtreamClient {
    host: String,
    username: String,
    password: String,
    client: Client,
}

impl std::fmt::Debug for XtreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XtreamClient")
            .field("host", &self.host)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl XtreamClient {
    /// Default request timeout for guide calls
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a new Xtream client
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ClientError> {
        Self::with_timeout(host, username, password, Self::DEFAULT_TIMEOUT)
    }

    /// Create a new Xtream client with an explicit request timeout
    pub fn with_timeout(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let host = host.into().trim_end_matches('/').to_string();
        if host.is_empty() {
            return Err(ClientError::InvalidConfig("Missing host".to_string()));
        }
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            host,
            username: username.into(),
            password: password.into(),
            client,
        })
    }

    /// Get current host
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Whether this client was built for the given panel account
    #[must_use]
    pub fn is_account(&self, host: &str, username: &str, password: &str) -> bool {
        self.host == host.trim_end_matches('/')
            && self.username == username
            && self.password == password
    }

    async fn player_api<T: serde::de::DeserializeOwned>(
        &self,
        action: &str,
        extra: &[(&str, &str)],
    ) -> Result<T, ClientError> {
        let url = format!("{}/player_api.php", self.host);
        let mut query: Vec<(&str, &str)> = vec![
            ("username", self.username.as_str()),
            ("password", self.password.as_str()),
            ("action", action),
        ];
        query.extend_from_slice(extra);

        tracing::debug!(host = %self.host, action, "Xtream API request");

        let response = self.client.get(&url).query(&query).send().await?;
        let response = check_response(response).await?;
        json_with_limit(response).await
    }

    /// List live categories
    pub async fn live_categories(&self) -> Result<Vec<LiveCategory>, ClientError> {
        self.player_api("get_live_categories", &[]).await
    }

    /// List all live streams (channels)
    pub async fn live_streams(&self) -> Result<Vec<LiveStream>, ClientError> {
        self.player_api("get_live_streams", &[]).await
    }

    /// Short EPG for one stream
    pub async fn short_epg(&self, stream_id: &str) -> Result<ShortEpg, ClientError> {
        self.player_api("get_short_epg", &[("stream_id", stream_id)]).await
    }

    /// Build the HLS playback URL for a live stream.
    ///
    /// Pure: the same credentials and stream id always give the same URL.
    #[must_use]
    pub fn stream_url(&self, stream_id: &str) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("username", &self.username)
            .append_pair("password", &self.password)
            .append_pair("stream", stream_id)
            .append_pair("extension", "m3u8")
            .finish();
        format!("{}/live.php?{query}", self.host)
    }
}
