//! MediaMTX HTTP Client

use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Client;

use super::types::{PathConf, PathList, PathStatus};
use crate::error::{check_response, json_with_limit, ClientError};

/// Characters escaped inside a single path-name segment
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Encode a path name for use in a URL, keeping `/` separators intact.
///
/// Control API and playback URLs must agree on this encoding.
pub fn encode_path_name(name: &str) -> String {
    name.split('/')
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// MediaMTX control API client
#[derive(Debug, Clone)]
pub struct MediaMtxClient {
    api_url: String,
    client: Client,
}

impl MediaMtxClient {
    /// Default request timeout for configuration calls
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a new MediaMTX client
    pub fn new(api_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_timeout(api_url, Self::DEFAULT_TIMEOUT)
    }

    /// Create a new MediaMTX client with an explicit request timeout
    pub fn with_timeout(api_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        if api_url.is_empty() {
            return Err(ClientError::InvalidConfig("Missing MediaMTX API url".to_string()));
        }
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(timeout)
            .build()?;
        Ok(Self { api_url, client })
    }

    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn url(&self, endpoint: &str, name: &str) -> String {
        format!("{}/v3/{endpoint}/{}", self.api_url, encode_path_name(name))
    }

    /// Get the stored configuration of a path, `None` if it does not exist
    pub async fn get_path_config(&self, name: &str) -> Result<Option<PathConf>, ClientError> {
        let response = self
            .client
            .get(self.url("config/paths/get", name))
            .send()
            .await?;
        match check_response(response).await {
            Ok(response) => Ok(Some(json_with_limit(response).await?)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Create a new path
    pub async fn add_path(&self, name: &str, conf: &PathConf) -> Result<(), ClientError> {
        let response = self
            .client
            .post(self.url("config/paths/add", name))
            .json(conf)
            .send()
            .await?;
        check_response(response).await?;
        tracing::debug!(path = name, "MediaMTX path added");
        Ok(())
    }

    /// Patch an existing path (only set fields are changed)
    pub async fn patch_path(&self, name: &str, conf: &PathConf) -> Result<(), ClientError> {
        let response = self
            .client
            .patch(self.url("config/paths/patch", name))
            .json(conf)
            .send()
            .await?;
        check_response(response).await?;
        tracing::debug!(path = name, "MediaMTX path patched");
        Ok(())
    }

    /// Delete a path.
    ///
    /// Returns `false` when the path was already absent.
    pub async fn delete_path(&self, name: &str) -> Result<bool, ClientError> {
        let response = self
            .client
            .delete(self.url("config/paths/delete", name))
            .send()
            .await?;
        match check_response(response).await {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Runtime status of a path, `None` if it is not configured
    pub async fn path_status(
        &self,
        name: &str,
        timeout: Option<Duration>,
    ) -> Result<Option<PathStatus>, ClientError> {
        let mut request = self.client.get(self.url("paths/get", name));
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        match check_response(request.send().await?).await {
            Ok(response) => Ok(Some(json_with_limit(response).await?)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// List runtime paths
    pub async fn list_paths(&self, timeout: Option<Duration>) -> Result<PathList, ClientError> {
        let mut request = self.client.get(format!("{}/v3/paths/list", self.api_url));
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = check_response(request.send().await?).await?;
        json_with_limit(response).await
    }
}
