//! Home Assistant HTTP Client

use std::time::Duration;

use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client,
};

use super::types::{EntityState, PlayMediaRequest};
use crate::error::{check_response, json_with_limit, ClientError};

/// Home Assistant REST client authenticated with a long-lived access token
#[derive(Clone)]
pub struct HassClient {
    base_url: String,
    token: String,
    client: Client,
}

impl std::fmt::Debug for HassClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HassClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HassClient {
    /// Default request timeout for service calls
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a new Home Assistant client
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, token, Self::DEFAULT_TIMEOUT)
    }

    /// Create a new Home Assistant client with an explicit request timeout
    pub fn with_timeout(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ClientError::InvalidConfig("Missing hub base url".to_string()));
        }
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            base_url,
            token: token.into(),
            client,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Build request headers
    fn build_headers(&self) -> Result<HeaderMap, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.token))?,
        );
        Ok(headers)
    }

    /// All entity states
    pub async fn states(&self) -> Result<Vec<EntityState>, ClientError> {
        let response = self
            .client
            .get(format!("{}/api/states", self.base_url))
            .headers(self.build_headers()?)
            .send()
            .await?;
        let response = check_response(response).await?;
        json_with_limit(response).await
    }

    /// Call `media_player.play_media`
    pub async fn play_media(&self, request: &PlayMediaRequest) -> Result<(), ClientError> {
        let response = self
            .client
            .post(format!("{}/api/services/media_player/play_media", self.base_url))
            .headers(self.build_headers()?)
            .json(request)
            .send()
            .await?;
        check_response(response).await?;
        tracing::debug!(
            entity_id = %request.entity_id,
            content_type = %request.media_content_type,
            "play_media accepted by hub"
        );
        Ok(())
    }

    /// MJPEG camera proxy URL for a camera entity. Pure, no request is made.
    #[must_use]
    pub fn camera_proxy_stream_url(&self, entity_id: &str) -> String {
        format!("{}/api/camera_proxy_stream/{entity_id}", self.base_url)
    }
}
