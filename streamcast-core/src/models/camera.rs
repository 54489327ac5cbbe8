//! Standalone cameras and their transcoding paths

use serde::{Deserialize, Serialize};

use super::{CameraId, UserId};

/// Credentials embedded into an RTSP source URL
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for CameraCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraCredentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Standalone camera owned by a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Camera {
    pub id: CameraId,
    pub user_id: UserId,
    pub name: String,
    pub source_url: String,
    pub credentials: Option<CameraCredentials>,
}

/// Browser-playable URLs for a camera path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamUrls {
    pub webrtc_url: String,
    pub hls_url: String,
}

/// Result of registering a camera with the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredStream {
    pub path_name: String,
    pub webrtc_url: String,
    pub hls_url: String,
}

/// Local mirror of one gateway path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscodePath {
    pub path_name: String,
    pub source_url: String,
    pub ready: bool,
    pub readers: usize,
}

/// Three-state path readiness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamReadiness {
    /// The gateway has no path for this camera
    NotRegistered,
    /// Path exists but no upstream source is connected yet
    Connecting,
    Ready,
}

impl StreamReadiness {
    #[must_use]
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Canonical gateway path name for a camera
#[must_use]
pub fn camera_path_name(camera_id: &CameraId) -> String {
    format!("camera/{camera_id}")
}
