//! Cast targets, cast requests and the compatibility rule between them

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{CameraId, ChannelId};
use crate::{Error, Result};

/// Kind of playback target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Kiosk,
    MediaPlayer,
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Kiosk => "kiosk",
            Self::MediaPlayer => "media_player",
        })
    }
}

/// What a cast request asks to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Iptv,
    Camera,
    Multiview,
}

impl ContentType {
    /// Capability a target must have to show this content
    #[must_use]
    pub const fn required_capability(self) -> Capability {
        match self {
            Self::Iptv => Capability::Iptv,
            Self::Camera => Capability::Cameras,
            Self::Multiview => Capability::Multiview,
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Iptv => "iptv",
            Self::Camera => "camera",
            Self::Multiview => "multiview",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Iptv,
    Cameras,
    Multiview,
}

/// Whether a target kind can ever render a content type.
///
/// A remote media player plays a single URL, so it cannot show a composed
/// multi-view layout.
#[must_use]
pub const fn kind_supports(kind: TargetKind, content: ContentType) -> bool {
    !matches!(
        (kind, content),
        (TargetKind::MediaPlayer, ContentType::Multiview)
    )
}

/// The single compatibility check used by the dispatcher.
///
/// The kind rule is checked first so that multiview to a media player fails the
/// same way no matter what capabilities were reported.
pub fn ensure_castable(
    kind: TargetKind,
    capabilities: &BTreeSet<Capability>,
    content: ContentType,
) -> Result<()> {
    if !kind_supports(kind, content) || !capabilities.contains(&content.required_capability()) {
        return Err(Error::UnsupportedCombination {
            content,
            target: kind,
        });
    }
    Ok(())
}

/// Anything a user can cast to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastTarget {
    pub id: String,
    pub name: String,
    pub kind: TargetKind,
    pub capabilities: BTreeSet<Capability>,
}

impl CastTarget {
    /// Hub media players support IPTV and cameras, never multiview
    #[must_use]
    pub fn media_player(entity_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: entity_id.into(),
            name: name.into(),
            kind: TargetKind::MediaPlayer,
            capabilities: [Capability::Iptv, Capability::Cameras].into_iter().collect(),
        }
    }

    #[must_use]
    pub fn supports(&self, content: ContentType) -> bool {
        ensure_castable(self.kind, &self.capabilities, content).is_ok()
    }
}

/// Which camera to show and through which system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "via", rename_all = "snake_case")]
pub enum CameraRef {
    /// RTSP camera restreamed through the transcoding gateway
    Standalone { camera_id: CameraId },
    /// Camera entity owned by the smart-home hub
    Hub { entity_id: String },
}

/// One tile of a multi-view layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MultiviewItem {
    Iptv { channel_id: ChannelId },
    Camera { camera: CameraRef },
}

/// One-shot cast command, never persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastRequest {
    pub target_id: String,
    pub target_kind: TargetKind,
    pub content_type: ContentType,
    #[serde(default)]
    pub channel_ref: Option<ChannelId>,
    #[serde(default)]
    pub camera_ref: Option<CameraRef>,
    #[serde(default)]
    pub multiview_items: Option<Vec<MultiviewItem>>,
}

impl CastRequest {
    #[must_use]
    pub fn iptv(target_kind: TargetKind, target_id: impl Into<String>, channel: ChannelId) -> Self {
        Self {
            target_id: target_id.into(),
            target_kind,
            content_type: ContentType::Iptv,
            channel_ref: Some(channel),
            camera_ref: None,
            multiview_items: None,
        }
    }

    #[must_use]
    pub fn camera(target_kind: TargetKind, target_id: impl Into<String>, camera: CameraRef) -> Self {
        Self {
            target_id: target_id.into(),
            target_kind,
            content_type: ContentType::Camera,
            channel_ref: None,
            camera_ref: Some(camera),
            multiview_items: None,
        }
    }

    #[must_use]
    pub fn multiview(
        target_kind: TargetKind,
        target_id: impl Into<String>,
        items: Vec<MultiviewItem>,
    ) -> Self {
        Self {
            target_id: target_id.into(),
            target_kind,
            content_type: ContentType::Multiview,
            channel_ref: None,
            camera_ref: None,
            multiview_items: Some(items),
        }
    }

    /// Check that the payload needed by `content_type` is present
    pub fn validate_shape(&self) -> Result<()> {
        if self.target_id.trim().is_empty() {
            return Err(Error::InvalidInput("targetId is required".to_string()));
        }
        match self.content_type {
            ContentType::Iptv if self.channel_ref.is_none() => Err(Error::InvalidInput(
                "channelRef is required for iptv casts".to_string(),
            )),
            ContentType::Camera if self.camera_ref.is_none() => Err(Error::InvalidInput(
                "cameraRef is required for camera casts".to_string(),
            )),
            ContentType::Multiview
                if self.multiview_items.as_ref().is_none_or(Vec::is_empty) =>
            {
                Err(Error::InvalidInput(
                    "multiviewItems must not be empty".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }
}
