//! Kiosk displays and the commands queued for them

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Capability, CastTarget, KioskId, TargetKind, UserId};

/// Feature flags enabled on a kiosk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KioskFeatures {
    pub iptv: bool,
    pub cameras: bool,
    pub multiview: bool,
}

impl KioskFeatures {
    #[must_use]
    pub fn capabilities(self) -> BTreeSet<Capability> {
        [
            (self.iptv, Capability::Iptv),
            (self.cameras, Capability::Cameras),
            (self.multiview, Capability::Multiview),
        ]
        .into_iter()
        .filter_map(|(enabled, cap)| enabled.then_some(cap))
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kiosk {
    pub id: KioskId,
    pub user_id: UserId,
    pub name: String,
    pub features: KioskFeatures,
}

impl Kiosk {
    #[must_use]
    pub fn as_target(&self) -> CastTarget {
        CastTarget {
            id: self.id.to_string(),
            name: self.name.clone(),
            kind: TargetKind::Kiosk,
            capabilities: self.features.capabilities(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KioskCommandType {
    Navigate,
    IptvPlay,
    CameraView,
    MultiviewSet,
}

impl std::fmt::Display for KioskCommandType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Navigate => "navigate",
            Self::IptvPlay => "iptv-play",
            Self::CameraView => "camera-view",
            Self::MultiviewSet => "multiview-set",
        })
    }
}

/// Command appended to a kiosk's queue; the kiosk client polls and drains it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KioskCommand {
    pub kiosk_id: KioskId,
    #[serde(rename = "type")]
    pub command_type: KioskCommandType,
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
}

impl KioskCommand {
    #[must_use]
    pub fn new(kiosk_id: KioskId, command_type: KioskCommandType, payload: Value) -> Self {
        Self {
            kiosk_id,
            command_type,
            payload,
            timestamp: Utc::now(),
        }
    }
}
