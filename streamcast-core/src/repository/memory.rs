//! In-process store and kiosk queue
//!
//! Used by tests and by embedders that keep their entities in memory.

use async_trait::async_trait;
use dashmap::DashMap;

use super::{CastStore, KioskQueue};
use crate::models::{
    Camera, CameraId, Channel, ChannelId, HubConnection, Kiosk, KioskCommand, KioskId,
    LiveTvServer, ServerId, UserId,
};
use crate::Result;

#[derive(Debug, Default)]
pub struct MemoryStore {
    kiosks: DashMap<KioskId, Kiosk>,
    channels: DashMap<ChannelId, Channel>,
    servers: DashMap<ServerId, LiveTvServer>,
    cameras: DashMap<CameraId, Camera>,
    hubs: DashMap<UserId, HubConnection>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_kiosk(&self, kiosk: Kiosk) {
        self.kiosks.insert(kiosk.id.clone(), kiosk);
    }

    pub fn insert_channel(&self, channel: Channel) {
        self.channels.insert(channel.id.clone(), channel);
    }

    pub fn insert_server(&self, server: LiveTvServer) {
        self.servers.insert(server.id.clone(), server);
    }

    pub fn insert_camera(&self, camera: Camera) {
        self.cameras.insert(camera.id.clone(), camera);
    }

    pub fn insert_hub(&self, hub: HubConnection) {
        self.hubs.insert(hub.user_id.clone(), hub);
    }

    pub fn remove_hub(&self, user_id: &UserId) {
        self.hubs.remove(user_id);
    }

    fn owns_server(&self, user_id: &UserId, server_id: &ServerId) -> bool {
        self.servers
            .get(server_id)
            .is_some_and(|s| &s.user_id == user_id)
    }
}

#[async_trait]
impl CastStore for MemoryStore {
    async fn get_kiosk(&self, user_id: &UserId, kiosk_id: &KioskId) -> Result<Option<Kiosk>> {
        Ok(self
            .kiosks
            .get(kiosk_id)
            .filter(|k| &k.user_id == user_id)
            .map(|k| k.value().clone()))
    }

    async fn list_kiosks(&self, user_id: &UserId) -> Result<Vec<Kiosk>> {
        let mut kiosks: Vec<Kiosk> = self
            .kiosks
            .iter()
            .filter(|k| &k.user_id == user_id)
            .map(|k| k.value().clone())
            .collect();
        kiosks.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(kiosks)
    }

    async fn get_channel(
        &self,
        user_id: &UserId,
        channel_id: &ChannelId,
    ) -> Result<Option<Channel>> {
        let Some(channel) = self.channels.get(channel_id).map(|c| c.value().clone()) else {
            return Ok(None);
        };
        // Channels are owned through their server
        Ok(self
            .owns_server(user_id, &channel.server_id)
            .then_some(channel))
    }

    async fn get_server(
        &self,
        user_id: &UserId,
        server_id: &ServerId,
    ) -> Result<Option<LiveTvServer>> {
        Ok(self
            .servers
            .get(server_id)
            .filter(|s| &s.user_id == user_id)
            .map(|s| s.value().clone()))
    }

    async fn list_servers(&self) -> Result<Vec<LiveTvServer>> {
        Ok(self.servers.iter().map(|s| s.value().clone()).collect())
    }

    async fn get_camera(&self, user_id: &UserId, camera_id: &CameraId) -> Result<Option<Camera>> {
        Ok(self
            .cameras
            .get(camera_id)
            .filter(|c| &c.user_id == user_id)
            .map(|c| c.value().clone()))
    }

    async fn get_hub(&self, user_id: &UserId) -> Result<Option<HubConnection>> {
        Ok(self.hubs.get(user_id).map(|h| h.value().clone()))
    }
}

/// Per-kiosk FIFO queues
#[derive(Debug, Default)]
pub struct MemoryKioskQueue {
    queues: DashMap<KioskId, Vec<KioskCommand>>,
}

impl MemoryKioskQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every pending command for a kiosk, oldest first
    #[must_use]
    pub fn drain(&self, kiosk_id: &KioskId) -> Vec<KioskCommand> {
        self.queues
            .get_mut(kiosk_id)
            .map(|mut queue| std::mem::take(&mut *queue))
            .unwrap_or_default()
    }

    /// Pending commands for a kiosk, oldest first
    #[must_use]
    pub fn pending(&self, kiosk_id: &KioskId) -> Vec<KioskCommand> {
        self.queues
            .get(kiosk_id)
            .map(|queue| queue.value().clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn len(&self, kiosk_id: &KioskId) -> usize {
        self.queues.get(kiosk_id).map_or(0, |queue| queue.len())
    }

    #[must_use]
    pub fn is_empty(&self, kiosk_id: &KioskId) -> bool {
        self.len(kiosk_id) == 0
    }
}

#[async_trait]
impl KioskQueue for MemoryKioskQueue {
    async fn append(&self, kiosk_id: &KioskId, commands: Vec<KioskCommand>) -> Result<()> {
        // The entry guard holds the shard lock for the whole batch
        self.queues
            .entry(kiosk_id.clone())
            .or_default()
            .extend(commands);
        Ok(())
    }
}
