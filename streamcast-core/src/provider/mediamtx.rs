//! MediaMTX transcoding gateway
//!
//! Translates between the core's `PathDefinition` and the MediaMTX path config.
//! Runtime queries and pings use the short probe timeout.

use async_trait::async_trait;
use std::time::Duration;
use streamcast_clients::mediamtx::PathConf;
use streamcast_clients::MediaMtxClient;

use super::traits::{PathRuntime, PathDefinition, TranscodeGateway};
use crate::resilience::timeout::TimeoutConfig;
use crate::Result;

#[derive(Debug, Clone)]
pub struct MediaMtxGateway {
    client: MediaMtxClient,
    probe_timeout: Duration,
}

impl MediaMtxGateway {
    pub fn new(api_url: &str, timeouts: TimeoutConfig) -> Result<Self> {
        let client = MediaMtxClient::with_timeout(api_url, timeouts.request)?;
        Ok(Self {
            client,
            probe_timeout: timeouts.probe,
        })
    }

    #[must_use]
    pub fn api_url(&self) -> &str {
        self.client.api_url()
    }
}

fn to_conf(definition: &PathDefinition) -> PathConf {
    PathConf {
        name: None,
        source: Some(definition.source.clone()),
        source_on_demand: Some(definition.source_on_demand),
        source_on_demand_start_timeout: Some(definition.start_timeout.clone()),
        source_on_demand_close_after: Some(definition.close_after.clone()),
    }
}

fn from_conf(conf: PathConf) -> PathDefinition {
    PathDefinition {
        source: conf.source.unwrap_or_default(),
        source_on_demand: conf.source_on_demand.unwrap_or(false),
        start_timeout: conf.source_on_demand_start_timeout.unwrap_or_default(),
        close_after: conf.source_on_demand_close_after.unwrap_or_default(),
    }
}

#[async_trait]
impl TranscodeGateway for MediaMtxGateway {
    async fn get_path(&self, name: &str) -> Result<Option<PathDefinition>> {
        Ok(self.client.get_path_config(name).await?.map(from_conf))
    }

    async fn add_path(&self, name: &str, definition: &PathDefinition) -> Result<()> {
        self.client.add_path(name, &to_conf(definition)).await?;
        Ok(())
    }

    async fn update_path(&self, name: &str, definition: &PathDefinition) -> Result<()> {
        self.client.patch_path(name, &to_conf(definition)).await?;
        Ok(())
    }

    async fn delete_path(&self, name: &str) -> Result<bool> {
        Ok(self.client.delete_path(name).await?)
    }

    async fn path_runtime(&self, name: &str) -> Result<Option<PathRuntime>> {
        let status = self
            .client
            .path_status(name, Some(self.probe_timeout))
            .await?;
        Ok(status.map(|s| PathRuntime {
            ready: s.ready,
            readers: s.reader_count(),
        }))
    }

    async fn ping(&self) -> Result<()> {
        self.client.list_paths(Some(self.probe_timeout)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn definition() -> PathDefinition {
        PathDefinition {
            source: "rtsp://cam.local/stream".to_string(),
            source_on_demand: true,
            start_timeout: "10s".to_string(),
            close_after: "10s".to_string(),
        }
    }

    #[test]
    fn test_conf_mapping() {
        let conf = to_conf(&definition());
        assert_eq!(conf.source_on_demand, Some(true));
        assert_eq!(from_conf(conf), definition());
    }

    #[tokio::test]
    async fn test_add_path_sends_on_demand_config() {
        let mock = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/config/paths/add/camera/cam1"))
            .and(body_json(json!({
                "source": "rtsp://cam.local/stream",
                "sourceOnDemand": true,
                "sourceOnDemandStartTimeout": "10s",
                "sourceOnDemandCloseAfter": "10s"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock)
            .await;

        let gateway = MediaMtxGateway::new(&mock.uri(), TimeoutConfig::default()).unwrap();
        gateway.add_path("camera/cam1", &definition()).await.unwrap();
    }

    #[tokio::test]
    async fn test_path_runtime() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v3/paths/get/camera/cam1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "camera/cam1",
                "ready": true,
                "readers": [{"type": "hlsMuxer"}]
            })))
            .mount(&mock)
            .await;
        Mock::given(method("GET"))
            .and(path("/v3/paths/get/camera/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock)
            .await;

        let gateway = MediaMtxGateway::new(&mock.uri(), TimeoutConfig::default()).unwrap();
        assert_eq!(
            gateway.path_runtime("camera/cam1").await.unwrap(),
            Some(PathRuntime { ready: true, readers: 1 })
        );
        assert_eq!(gateway.path_runtime("camera/missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_ping_unreachable() {
        let gateway = MediaMtxGateway::new("http://127.0.0.1:1", TimeoutConfig::default()).unwrap();
        assert!(gateway.ping().await.unwrap_err().is_retryable());
    }
}
