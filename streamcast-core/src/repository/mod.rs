//! Read-only ownership store and the kiosk command queue
//!
//! Persistence of user-owned entities lives in a sibling subsystem. The core
//! only needs the lookups below; every per-user lookup returns `None` when the
//! entity does not exist *or* belongs to another user.

pub mod memory;

use async_trait::async_trait;

use crate::models::{
    Camera, CameraId, Channel, ChannelId, HubConnection, Kiosk, KioskCommand, KioskId,
    LiveTvServer, ServerId, UserId,
};
use crate::Result;

pub use memory::{MemoryKioskQueue, MemoryStore};

#[async_trait]
pub trait CastStore: Send + Sync {
    async fn get_kiosk(&self, user_id: &UserId, kiosk_id: &KioskId) -> Result<Option<Kiosk>>;

    async fn list_kiosks(&self, user_id: &UserId) -> Result<Vec<Kiosk>>;

    async fn get_channel(&self, user_id: &UserId, channel_id: &ChannelId)
        -> Result<Option<Channel>>;

    async fn get_server(&self, user_id: &UserId, server_id: &ServerId)
        -> Result<Option<LiveTvServer>>;

    /// Every live-TV server regardless of owner (used by the guide sweeper)
    async fn list_servers(&self) -> Result<Vec<LiveTvServer>>;

    async fn get_camera(&self, user_id: &UserId, camera_id: &CameraId) -> Result<Option<Camera>>;

    async fn get_hub(&self, user_id: &UserId) -> Result<Option<HubConnection>>;
}

/// Append-only per-kiosk command queue
#[async_trait]
pub trait KioskQueue: Send + Sync {
    /// Append `commands` in order. The batch must land contiguously: no other
    /// producer may interleave with it on the same kiosk.
    async fn append(&self, kiosk_id: &KioskId, commands: Vec<KioskCommand>) -> Result<()>;
}
