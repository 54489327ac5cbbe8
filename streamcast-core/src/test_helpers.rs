//! Test helpers and fixtures for streamcast-core tests
//!
//! Fixture builders for the stored entities plus in-memory fakes for the
//! live-TV provider and transcoding gateway seams.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;

use crate::models::{
    Camera, CameraCredentials, CameraId, Channel, ChannelId, EpgEntry, HubConnection, Kiosk,
    KioskFeatures, KioskId, LiveTvServer, ServerId, UserId,
};
use crate::provider::{LiveTvProvider, PathRuntime, PathDefinition, ProviderCategory, TranscodeGateway};
use crate::{Error, Result};

/// Create a test user ID
pub fn test_user_id(id: &str) -> UserId {
    UserId::from(id)
}

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap()
}

pub fn test_hub(user: &str, base_url: &str) -> HubConnection {
    HubConnection {
        user_id: test_user_id(user),
        base_url: base_url.to_string(),
        access_token: "hub-token".to_string(),
    }
}

/// Test fixture builder for LiveTvServer
pub struct ServerFixture {
    id: ServerId,
    owner: UserId,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
}

impl ServerFixture {
    pub fn new(id: &str) -> Self {
        Self {
            id: ServerId::from(id),
            owner: test_user_id("alice"),
            base_url: "http://iptv.example.com".to_string(),
            username: Some("u".to_string()),
            password: Some("p".to_string()),
        }
    }

    pub fn with_owner(mut self, owner: &str) -> Self {
        self.owner = test_user_id(owner);
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    pub fn without_credentials(mut self) -> Self {
        self.username = None;
        self.password = None;
        self
    }

    pub fn build(self) -> LiveTvServer {
        LiveTvServer {
            name: format!("Server {}", self.id),
            id: self.id,
            user_id: self.owner,
            base_url: self.base_url,
            username: self.username,
            password: self.password,
        }
    }
}

/// Stored channel `id` pointing at provider stream `external_id`
pub fn test_channel(id: &str, server_id: &str, external_id: &str) -> Channel {
    Channel {
        id: ChannelId::from(id),
        server_id: ServerId::from(server_id),
        external_id: external_id.to_string(),
        name: format!("Channel {external_id}"),
        category_id: None,
        logo_url: None,
    }
}

/// Channel as a provider would list it
pub fn provider_channel(server_id: &str, external_id: &str, category: Option<&str>) -> Channel {
    Channel {
        category_id: category.map(str::to_string),
        ..test_channel(external_id, server_id, external_id)
    }
}

pub fn test_epg(external_id: &str, start: i64, end: i64, title: &str) -> EpgEntry {
    EpgEntry {
        channel_id: external_id.to_string(),
        title: title.to_string(),
        description: String::new(),
        start_time: at(start),
        end_time: at(end),
    }
}

/// Test fixture builder for Camera
pub struct CameraFixture {
    id: CameraId,
    owner: UserId,
    source_url: String,
    credentials: Option<CameraCredentials>,
}

impl CameraFixture {
    pub fn new(id: &str) -> Self {
        Self {
            id: CameraId::from(id),
            owner: test_user_id("alice"),
            source_url: format!("rtsp://192.168.1.20:554/{id}"),
            credentials: None,
        }
    }

    pub fn with_owner(mut self, owner: &str) -> Self {
        self.owner = test_user_id(owner);
        self
    }

    pub fn with_source(mut self, source_url: &str) -> Self {
        self.source_url = source_url.to_string();
        self
    }

    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.credentials = Some(CameraCredentials {
            username: username.to_string(),
            password: password.to_string(),
        });
        self
    }

    pub fn build(self) -> Camera {
        Camera {
            name: format!("Camera {}", self.id),
            id: self.id,
            user_id: self.owner,
            source_url: self.source_url,
            credentials: self.credentials,
        }
    }
}

/// Kiosk with every feature enabled unless overridden
pub fn test_kiosk(id: &str, owner: &str) -> Kiosk {
    test_kiosk_with(
        id,
        owner,
        KioskFeatures {
            iptv: true,
            cameras: true,
            multiview: true,
        },
    )
}

pub fn test_kiosk_with(id: &str, owner: &str, features: KioskFeatures) -> Kiosk {
    Kiosk {
        id: KioskId::from(id),
        user_id: test_user_id(owner),
        name: format!("Kiosk {id}"),
        features,
    }
}

#[derive(Default)]
struct LiveTvState {
    channels: Vec<Channel>,
    categories: Vec<ProviderCategory>,
    epg: HashMap<String, Vec<EpgEntry>>,
    failing_epg: HashSet<String>,
}

/// In-memory live-TV provider
#[derive(Default)]
pub struct FakeLiveTv {
    state: Mutex<LiveTvState>,
    failing: AtomicBool,
    delay: Mutex<Option<Duration>>,
    pub channel_calls: AtomicUsize,
    pub epg_calls: AtomicUsize,
}

impl FakeLiveTv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_channels(&self, channels: Vec<Channel>) {
        self.state.lock().channels = channels;
    }

    pub fn set_categories(&self, categories: &[(&str, &str)]) {
        self.state.lock().categories = categories
            .iter()
            .map(|(id, name)| ProviderCategory {
                id: (*id).to_string(),
                name: (*name).to_string(),
            })
            .collect();
    }

    pub fn set_epg(&self, external_id: &str, entries: Vec<EpgEntry>) {
        self.state.lock().epg.insert(external_id.to_string(), entries);
    }

    pub fn fail_epg_for(&self, external_id: &str) {
        self.state.lock().failing_epg.insert(external_id.to_string());
    }

    /// Every list call fails with a provider-side 500
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    async fn simulate(&self) -> Result<()> {
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::DispatchFailed {
                status: 500,
                body: "internal server error".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl LiveTvProvider for FakeLiveTv {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn list_channels(&self, server: &LiveTvServer) -> Result<Vec<Channel>> {
        self.channel_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate().await?;
        let channels = self.state.lock().channels.clone();
        Ok(channels
            .into_iter()
            .map(|c| Channel {
                server_id: server.id.clone(),
                ..c
            })
            .collect())
    }

    async fn list_categories(&self, _server: &LiveTvServer) -> Result<Vec<ProviderCategory>> {
        self.simulate().await?;
        Ok(self.state.lock().categories.clone())
    }

    async fn list_epg(&self, _server: &LiveTvServer, external_id: &str) -> Result<Vec<EpgEntry>> {
        self.epg_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate().await?;
        let state = self.state.lock();
        if state.failing_epg.contains(external_id) {
            return Err(Error::Unavailable(format!("epg for {external_id} timed out")));
        }
        Ok(state.epg.get(external_id).cloned().unwrap_or_default())
    }

    fn build_stream_url(&self, server: &LiveTvServer, external_id: &str) -> Result<String> {
        let (username, password) = server
            .credentials()
            .ok_or_else(|| Error::Unauthorized(format!("server {} has no credentials", server.id)))?;
        Ok(format!(
            "{}/live.php?username={username}&password={password}&stream={external_id}&extension=m3u8",
            server.base_url
        ))
    }
}

/// In-memory transcoding gateway
#[derive(Default)]
pub struct FakeGateway {
    paths: Mutex<HashMap<String, (PathDefinition, PathRuntime)>>,
    unreachable: AtomicBool,
    write_delay: Mutex<Option<Duration>>,
    pub add_calls: AtomicUsize,
    pub update_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(&self, name: &str) -> Option<PathDefinition> {
        self.paths.lock().get(name).map(|(definition, _)| definition.clone())
    }

    pub fn path_count(&self) -> usize {
        self.paths.lock().len()
    }

    /// Simulate an upstream source connecting (or dropping)
    pub fn set_ready(&self, name: &str, ready: bool, readers: usize) {
        if let Some((_, runtime)) = self.paths.lock().get_mut(name) {
            *runtime = PathRuntime { ready, readers };
        }
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Delay applied between reading and writing, to widen race windows
    pub fn set_write_delay(&self, delay: Duration) {
        *self.write_delay.lock() = Some(delay);
    }

    fn check_reachable(&self) -> Result<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(Error::Unavailable("gateway connection refused".to_string()));
        }
        Ok(())
    }

    async fn write_pause(&self) {
        let delay = *self.write_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl TranscodeGateway for FakeGateway {
    async fn get_path(&self, name: &str) -> Result<Option<PathDefinition>> {
        self.check_reachable()?;
        Ok(self.path(name))
    }

    async fn add_path(&self, name: &str, definition: &PathDefinition) -> Result<()> {
        self.check_reachable()?;
        self.add_calls.fetch_add(1, Ordering::SeqCst);
        self.write_pause().await;
        let mut paths = self.paths.lock();
        if paths.contains_key(name) {
            return Err(Error::DispatchFailed {
                status: 400,
                body: "path already exists".to_string(),
            });
        }
        paths.insert(
            name.to_string(),
            (definition.clone(), PathRuntime { ready: false, readers: 0 }),
        );
        Ok(())
    }

    async fn update_path(&self, name: &str, definition: &PathDefinition) -> Result<()> {
        self.check_reachable()?;
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        self.write_pause().await;
        match self.paths.lock().get_mut(name) {
            Some((current, _)) => {
                *current = definition.clone();
                Ok(())
            }
            None => Err(Error::DispatchFailed {
                status: 404,
                body: "path not found".to_string(),
            }),
        }
    }

    async fn delete_path(&self, name: &str) -> Result<bool> {
        self.check_reachable()?;
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.paths.lock().remove(name).is_some())
    }

    async fn path_runtime(&self, name: &str) -> Result<Option<PathRuntime>> {
        self.check_reachable()?;
        Ok(self.paths.lock().get(name).map(|(_, runtime)| *runtime))
    }

    async fn ping(&self) -> Result<()> {
        self.check_reachable()
    }
}
