//! Stream path registry
//!
//! Owns the on-demand RTSP to web transcoding path of every standalone
//! camera. Registration is an upsert, deletion is idempotent and URL
//! construction never touches the network.

use std::sync::Arc;

use dashmap::DashMap;
use streamcast_clients::mediamtx::encode_path_name;
use tracing::{debug, info};

use crate::config::GatewayConfig;
use crate::models::{
    camera_path_name, CameraCredentials, CameraId, RegisteredStream, StreamReadiness, StreamUrls,
    TranscodePath,
};
use crate::provider::{PathDefinition, TranscodeGateway};
use crate::resilience::timeout::{with_timeout, TimeoutConfig};
use crate::{Error, Result};

/// Outcome of [`StreamPathRegistry::ensure_path`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathChange {
    Created,
    Updated,
    Unchanged,
}

pub struct StreamPathRegistry {
    gateway: Arc<dyn TranscodeGateway>,
    hls_base_url: String,
    webrtc_base_url: String,
    start_timeout: String,
    close_after: String,
    timeouts: TimeoutConfig,
    /// Serializes upserts per camera; held across the gateway round-trips
    upsert_locks: DashMap<CameraId, Arc<tokio::sync::Mutex<()>>>,
    registered: DashMap<String, TranscodePath>,
}

impl StreamPathRegistry {
    pub fn new(
        gateway: Arc<dyn TranscodeGateway>,
        config: &GatewayConfig,
        timeouts: TimeoutConfig,
    ) -> Self {
        Self {
            gateway,
            hls_base_url: config.hls_base_url.trim_end_matches('/').to_string(),
            webrtc_base_url: config.webrtc_base_url.trim_end_matches('/').to_string(),
            start_timeout: config.source_on_demand_start_timeout.clone(),
            close_after: config.source_on_demand_close_after.clone(),
            timeouts,
            upsert_locks: DashMap::new(),
            registered: DashMap::new(),
        }
    }

    fn upsert_lock(&self, camera_id: &CameraId) -> Arc<tokio::sync::Mutex<()>> {
        Arc::clone(self.upsert_locks.entry(camera_id.clone()).or_default().value())
    }

    /// Create or update the camera's on-demand path.
    ///
    /// Repeating the call with the same source is a no-op on the gateway.
    pub async fn register_camera(
        &self,
        camera_id: &CameraId,
        source_url: &str,
        credentials: Option<&CameraCredentials>,
    ) -> Result<RegisteredStream> {
        let source = embed_credentials(source_url, credentials)?;
        let path_name = camera_path_name(camera_id);
        let desired = PathDefinition {
            source: source.clone(),
            source_on_demand: true,
            start_timeout: self.start_timeout.clone(),
            close_after: self.close_after.clone(),
        };

        let lock = self.upsert_lock(camera_id);
        let _guard = lock.lock().await;

        let change = with_timeout(
            self.timeouts.request,
            "register camera path",
            self.ensure_path(&path_name, &desired),
        )
        .await?;

        match change {
            PathChange::Unchanged => {
                debug!(camera_id = %camera_id, path = %path_name, "Camera path already up to date");
            }
            _ => info!(camera_id = %camera_id, path = %path_name, change = ?change, "Camera path registered"),
        }

        self.registered
            .entry(path_name.clone())
            .and_modify(|path| {
                if path.source_url != source {
                    path.source_url.clone_from(&source);
                    path.ready = false;
                    path.readers = 0;
                }
            })
            .or_insert_with(|| TranscodePath {
                path_name: path_name.clone(),
                source_url: source,
                ready: false,
                readers: 0,
            });

        let urls = self.get_stream_urls(camera_id);
        Ok(RegisteredStream {
            path_name,
            webrtc_url: urls.webrtc_url,
            hls_url: urls.hls_url,
        })
    }

    /// Single upsert over the gateway's separate add and update calls
    async fn ensure_path(&self, name: &str, desired: &PathDefinition) -> Result<PathChange> {
        match self.gateway.get_path(name).await? {
            None => {
                self.gateway.add_path(name, desired).await?;
                Ok(PathChange::Created)
            }
            Some(current) if current == *desired => Ok(PathChange::Unchanged),
            Some(_) => {
                self.gateway.update_path(name, desired).await?;
                Ok(PathChange::Updated)
            }
        }
    }

    /// Remove the camera's path. A path that is already gone is not an error.
    pub async fn unregister_camera(&self, camera_id: &CameraId) -> Result<()> {
        let path_name = camera_path_name(camera_id);
        let lock = self.upsert_lock(camera_id);
        let guard = lock.lock().await;

        let existed = with_timeout(
            self.timeouts.request,
            "unregister camera path",
            self.gateway.delete_path(&path_name),
        )
        .await?;
        self.registered.remove(&path_name);
        drop(guard);
        // Only drop the lock entry when no other caller is waiting on it
        self.upsert_locks
            .remove_if(camera_id, |_, lock| Arc::strong_count(lock) <= 2);

        if existed {
            info!(camera_id = %camera_id, path = %path_name, "Camera path removed");
        } else {
            debug!(camera_id = %camera_id, path = %path_name, "Camera path was already absent");
        }
        Ok(())
    }

    /// `true` only when the path exists and its upstream source is connected
    pub async fn is_stream_ready(&self, camera_id: &CameraId) -> Result<bool> {
        Ok(self.path_status(camera_id).await?.is_ready())
    }

    /// Three-state readiness, distinguishing a missing path from a connecting one
    pub async fn path_status(&self, camera_id: &CameraId) -> Result<StreamReadiness> {
        let path_name = camera_path_name(camera_id);
        let runtime = with_timeout(
            self.timeouts.probe,
            "probe camera path",
            self.gateway.path_runtime(&path_name),
        )
        .await?;

        let Some(runtime) = runtime else {
            self.registered.remove(&path_name);
            return Ok(StreamReadiness::NotRegistered);
        };
        if let Some(mut path) = self.registered.get_mut(&path_name) {
            path.ready = runtime.ready;
            path.readers = runtime.readers;
        }

        Ok(if runtime.ready {
            StreamReadiness::Ready
        } else {
            StreamReadiness::Connecting
        })
    }

    /// Browser-playable URLs for a camera. Pure; valid before registration.
    #[must_use]
    pub fn get_stream_urls(&self, camera_id: &CameraId) -> StreamUrls {
        let path_name = encode_path_name(&camera_path_name(camera_id));
        StreamUrls {
            webrtc_url: format!("{}/{path_name}/", self.webrtc_base_url),
            hls_url: format!("{}/{path_name}/index.m3u8", self.hls_base_url),
        }
    }

    /// Whether the gateway answers within the probe timeout. Never errors.
    pub async fn is_available(&self) -> bool {
        match with_timeout(self.timeouts.probe, "gateway ping", self.gateway.ping()).await {
            Ok(()) => true,
            Err(err) => {
                debug!(error = %err, "Transcoding gateway unavailable");
                false
            }
        }
    }

    /// Paths registered through this registry, by name
    #[must_use]
    pub fn registered_paths(&self) -> Vec<TranscodePath> {
        let mut paths: Vec<_> = self.registered.iter().map(|p| p.value().clone()).collect();
        paths.sort_by(|a, b| a.path_name.cmp(&b.path_name));
        paths
    }
}

/// Put camera credentials into the userinfo of the source URL (percent-encoded).
///
/// Without credentials the source is only validated and returned as given.
fn embed_credentials(source_url: &str, credentials: Option<&CameraCredentials>) -> Result<String> {
    let mut url = url::Url::parse(source_url)
        .map_err(|e| Error::InvalidInput(format!("Invalid camera source URL: {e}")))?;

    let Some(credentials) = credentials else {
        return Ok(source_url.to_string());
    };

    let invalid = |()| Error::InvalidInput("Camera source URL cannot carry credentials".to_string());
    url.set_username(&credentials.username).map_err(invalid)?;
    url.set_password(Some(&credentials.password)).map_err(invalid)?;
    Ok(url.to_string())
}
