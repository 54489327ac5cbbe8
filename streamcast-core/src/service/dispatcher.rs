//! Cast dispatcher
//!
//! Validates a [`CastRequest`] and executes it against a kiosk queue or a hub
//! media player. Every validation failure is raised before the first side
//! effect. Nothing is retried and nothing is tracked past dispatch.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, info_span, warn, Instrument};

use crate::models::{
    ensure_castable, kind_supports, CameraRef, CastRequest, ChannelId, ContentType,
    KioskCommand, KioskCommandType, KioskId, MultiviewItem, TargetKind, UserId,
};
use crate::provider::MediaHub;
use crate::repository::{CastStore, KioskQueue};
use crate::resilience::timeout::{with_timeout, TimeoutConfig};
use crate::service::StreamResolver;
use crate::{Error, Result};

/// Content type the hub is told to expect for HLS and proxied camera streams
pub const MEDIA_CONTENT_TYPE: &str = "video";

const MEDIA_PLAYER_PREFIX: &str = "media_player.";

/// Per-request lifecycle, logged as the request moves through it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CastState {
    Received,
    Validated,
    Dispatched,
    Succeeded,
    Failed,
}

/// What a successful dispatch did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// Commands appended to a kiosk queue
    Enqueued { kiosk_id: KioskId, commands: usize },
    /// Hub accepted a play_media call
    Played { entity_id: String, media_content_id: String },
}

pub struct CastDispatcher {
    store: Arc<dyn CastStore>,
    queue: Arc<dyn KioskQueue>,
    resolver: StreamResolver,
    hub: Arc<dyn MediaHub>,
    timeouts: TimeoutConfig,
}

impl CastDispatcher {
    pub fn new(
        store: Arc<dyn CastStore>,
        queue: Arc<dyn KioskQueue>,
        resolver: StreamResolver,
        hub: Arc<dyn MediaHub>,
        timeouts: TimeoutConfig,
    ) -> Self {
        Self {
            store,
            queue,
            resolver,
            hub,
            timeouts,
        }
    }

    /// Validate and execute one cast request for `user_id`
    pub async fn dispatch(&self, user_id: &UserId, request: CastRequest) -> Result<DispatchOutcome> {
        let span = info_span!(
            "cast",
            user_id = %user_id,
            target_kind = %request.target_kind,
            target_id = %request.target_id,
            content = %request.content_type,
        );
        async move {
            debug!(state = ?CastState::Received, "Cast request received");
            let result = self.run(user_id, &request).await;
            match &result {
                Ok(outcome) => info!(state = ?CastState::Succeeded, outcome = ?outcome, "Cast succeeded"),
                Err(err) if err.is_validation() => {
                    info!(state = ?CastState::Failed, error = %err, "Cast rejected");
                }
                Err(err) => warn!(state = ?CastState::Failed, error = %err, "Cast failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run(&self, user_id: &UserId, request: &CastRequest) -> Result<DispatchOutcome> {
        // The kind rule comes first so it wins over every other field
        if !kind_supports(request.target_kind, request.content_type) {
            return Err(Error::UnsupportedCombination {
                content: request.content_type,
                target: request.target_kind,
            });
        }
        request.validate_shape()?;

        match request.target_kind {
            TargetKind::Kiosk => self.dispatch_to_kiosk(user_id, request).await,
            TargetKind::MediaPlayer => self.dispatch_to_media_player(user_id, request).await,
        }
    }

    async fn dispatch_to_kiosk(
        &self,
        user_id: &UserId,
        request: &CastRequest,
    ) -> Result<DispatchOutcome> {
        let kiosk_id = KioskId::from(request.target_id.as_str());
        let kiosk = self
            .store
            .get_kiosk(user_id, &kiosk_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Kiosk {kiosk_id}")))?;
        let target = kiosk.as_target();
        ensure_castable(target.kind, &target.capabilities, request.content_type)?;
        self.check_content(user_id, request).await?;
        debug!(state = ?CastState::Validated, "Cast validated");

        let (path, command_type, payload) = match request.content_type {
            ContentType::Iptv => {
                let channel_id = required(request.channel_ref.as_ref(), "channelRef")?;
                ("iptv", KioskCommandType::IptvPlay, json!({ "channelId": channel_id }))
            }
            ContentType::Camera => {
                let camera = required(request.camera_ref.as_ref(), "cameraRef")?;
                let payload = self.camera_payload(user_id, camera).await?;
                ("cameras", KioskCommandType::CameraView, payload)
            }
            ContentType::Multiview => {
                let items = required(request.multiview_items.as_ref(), "multiviewItems")?;
                let mut resolved = Vec::with_capacity(items.len());
                for item in items {
                    resolved.push(match item {
                        MultiviewItem::Iptv { channel_id } => {
                            json!({ "type": "iptv", "channelId": channel_id })
                        }
                        MultiviewItem::Camera { camera } => {
                            let mut payload = self.camera_payload(user_id, camera).await?;
                            payload["type"] = json!("camera");
                            payload
                        }
                    });
                }
                ("multiview", KioskCommandType::MultiviewSet, json!({ "items": resolved }))
            }
        };

        let commands = vec![
            KioskCommand::new(kiosk_id.clone(), KioskCommandType::Navigate, json!({ "path": path })),
            KioskCommand::new(kiosk_id.clone(), command_type, payload),
        ];
        let count = commands.len();
        with_timeout(
            self.timeouts.request,
            "enqueue kiosk commands",
            self.queue.append(&kiosk_id, commands),
        )
        .await?;
        debug!(state = ?CastState::Dispatched, commands = count, "Kiosk commands enqueued");

        Ok(DispatchOutcome::Enqueued {
            kiosk_id,
            commands: count,
        })
    }

    async fn dispatch_to_media_player(
        &self,
        user_id: &UserId,
        request: &CastRequest,
    ) -> Result<DispatchOutcome> {
        let hub = self
            .store
            .get_hub(user_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Hub connection for user {user_id}")))?;
        if !request.target_id.starts_with(MEDIA_PLAYER_PREFIX) {
            return Err(Error::NotFound(format!("Media player {}", request.target_id)));
        }
        let target = with_timeout(
            self.timeouts.request,
            "list hub media players",
            self.hub.media_players(&hub),
        )
        .await?
        .into_iter()
        .find(|player| player.id == request.target_id)
        .ok_or_else(|| Error::NotFound(format!("Media player {}", request.target_id)))?;
        ensure_castable(target.kind, &target.capabilities, request.content_type)?;
        self.check_content(user_id, request).await?;
        debug!(state = ?CastState::Validated, "Cast validated");

        let url = match request.content_type {
            ContentType::Iptv => {
                let channel_id = required(request.channel_ref.as_ref(), "channelRef")?;
                self.resolver.resolve_channel_stream(user_id, channel_id).await?
            }
            ContentType::Camera => {
                let camera = required(request.camera_ref.as_ref(), "cameraRef")?;
                self.resolver.resolve_camera_stream(user_id, camera).await?
            }
            ContentType::Multiview => {
                return Err(Error::UnsupportedCombination {
                    content: request.content_type,
                    target: TargetKind::MediaPlayer,
                })
            }
        };

        with_timeout(
            self.timeouts.request,
            "hub play_media",
            self.hub
                .play_media(&hub, &request.target_id, MEDIA_CONTENT_TYPE, &url),
        )
        .await?;
        debug!(state = ?CastState::Dispatched, "play_media accepted");

        Ok(DispatchOutcome::Played {
            entity_id: request.target_id.clone(),
            media_content_id: url,
        })
    }

    /// Ownership checks for everything the request references. Store reads only.
    async fn check_content(&self, user_id: &UserId, request: &CastRequest) -> Result<()> {
        if let Some(channel_id) = &request.channel_ref {
            self.check_channel(user_id, channel_id).await?;
        }
        if let Some(camera) = &request.camera_ref {
            self.check_camera(user_id, camera).await?;
        }
        for item in request.multiview_items.iter().flatten() {
            match item {
                MultiviewItem::Iptv { channel_id } => self.check_channel(user_id, channel_id).await?,
                MultiviewItem::Camera { camera } => self.check_camera(user_id, camera).await?,
            }
        }
        Ok(())
    }

    async fn check_channel(&self, user_id: &UserId, channel_id: &ChannelId) -> Result<()> {
        self.resolver.find_channel(user_id, channel_id).await.map(|_| ())
    }

    async fn check_camera(&self, user_id: &UserId, camera: &CameraRef) -> Result<()> {
        match camera {
            CameraRef::Standalone { camera_id } => {
                self.store
                    .get_camera(user_id, camera_id)
                    .await?
                    .ok_or_else(|| Error::NotFound(format!("Camera {camera_id}")))?;
            }
            CameraRef::Hub { .. } => {
                self.store
                    .get_hub(user_id)
                    .await?
                    .ok_or_else(|| Error::NotFound(format!("Hub connection for user {user_id}")))?;
            }
        }
        Ok(())
    }

    /// Camera reference plus a URL the kiosk can play directly
    async fn camera_payload(&self, user_id: &UserId, camera: &CameraRef) -> Result<Value> {
        let stream_url = self.resolver.resolve_camera_stream(user_id, camera).await?;
        let mut payload = serde_json::to_value(camera)
            .map_err(|e| Error::Internal(format!("Failed to encode camera reference: {e}")))?;
        payload["streamUrl"] = json!(stream_url);
        Ok(payload)
    }
}

fn required<'a, T>(value: Option<&'a T>, field: &str) -> Result<&'a T> {
    value.ok_or_else(|| Error::InvalidInput(format!("{field} is required")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::GuideCache;
    use crate::config::{GatewayConfig, GuideConfig};
    use crate::models::{CameraId, CastTarget, KioskFeatures};
    use crate::provider::MockMediaHub;
    use crate::repository::{MemoryKioskQueue, MemoryStore};
    use crate::service::StreamPathRegistry;
    use crate::test_helpers::{
        test_channel, test_hub, test_kiosk, test_kiosk_with, test_user_id, CameraFixture,
        FakeGateway, FakeLiveTv, ServerFixture,
    };
    use std::sync::atomic::Ordering;

    struct Fixture {
        store: Arc<MemoryStore>,
        queue: Arc<MemoryKioskQueue>,
        gateway: Arc<FakeGateway>,
        dispatcher: CastDispatcher,
    }

    fn fixture(hub: MockMediaHub) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let queue = Arc::new(MemoryKioskQueue::new());
        let provider = Arc::new(FakeLiveTv::new());
        let gateway = Arc::new(FakeGateway::new());
        let hub: Arc<dyn MediaHub> = Arc::new(hub);
        let timeouts = TimeoutConfig::default();

        let guide = GuideCache::new(provider.clone(), &GuideConfig::default(), timeouts);
        let paths = Arc::new(StreamPathRegistry::new(
            gateway.clone(),
            &GatewayConfig::default(),
            timeouts,
        ));
        let resolver = StreamResolver::new(store.clone(), guide, provider, paths, hub.clone());
        let dispatcher = CastDispatcher::new(store.clone(), queue.clone(), resolver, hub, timeouts);

        store.insert_server(ServerFixture::new("srv1").build());
        store.insert_channel(test_channel("ch1", "srv1", "101"));
        store.insert_kiosk(test_kiosk("k1", "alice"));
        store.insert_camera(CameraFixture::new("cam1").with_source("rtsp://cam/1").build());

        Fixture {
            store,
            queue,
            gateway,
            dispatcher,
        }
    }

    fn alice() -> UserId {
        test_user_id("alice")
    }

    fn hub_with_players(entity_ids: &'static [&'static str]) -> MockMediaHub {
        let mut hub = MockMediaHub::new();
        hub.expect_media_players().returning(move |_| {
            Ok(entity_ids
                .iter()
                .map(|id| CastTarget::media_player(*id, *id))
                .collect())
        });
        hub
    }

    fn standalone(id: &str) -> CameraRef {
        CameraRef::Standalone { camera_id: CameraId::from(id) }
    }

    #[tokio::test]
    async fn test_iptv_to_kiosk_enqueues_navigate_then_play() {
        let f = fixture(MockMediaHub::new());
        let request = CastRequest::iptv(TargetKind::Kiosk, "k1", ChannelId::from("ch1"));

        let outcome = f.dispatcher.dispatch(&alice(), request).await.unwrap();
        assert_eq!(
            outcome,
            DispatchOutcome::Enqueued { kiosk_id: KioskId::from("k1"), commands: 2 }
        );

        let commands = f.queue.drain(&KioskId::from("k1"));
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].command_type, KioskCommandType::Navigate);
        assert_eq!(commands[0].payload, json!({"path": "iptv"}));
        assert_eq!(commands[1].command_type, KioskCommandType::IptvPlay);
        assert_eq!(commands[1].payload, json!({"channelId": "ch1"}));
    }

    #[tokio::test]
    async fn test_camera_to_kiosk_carries_stream_url() {
        let f = fixture(MockMediaHub::new());
        let request = CastRequest::camera(TargetKind::Kiosk, "k1", standalone("cam1"));

        f.dispatcher.dispatch(&alice(), request).await.unwrap();

        let commands = f.queue.drain(&KioskId::from("k1"));
        assert_eq!(commands[0].payload, json!({"path": "cameras"}));
        assert_eq!(commands[1].command_type, KioskCommandType::CameraView);
        assert_eq!(commands[1].payload["camera_id"], "cam1");
        assert_eq!(
            commands[1].payload["streamUrl"],
            "http://127.0.0.1:8888/camera/cam1/index.m3u8"
        );
        assert!(f.gateway.path("camera/cam1").is_some());
    }

    #[tokio::test]
    async fn test_multiview_to_kiosk() {
        let f = fixture(MockMediaHub::new());
        let request = CastRequest::multiview(
            TargetKind::Kiosk,
            "k1",
            vec![
                MultiviewItem::Iptv { channel_id: ChannelId::from("ch1") },
                MultiviewItem::Camera { camera: standalone("cam1") },
            ],
        );

        f.dispatcher.dispatch(&alice(), request).await.unwrap();

        let commands = f.queue.drain(&KioskId::from("k1"));
        assert_eq!(commands[0].payload, json!({"path": "multiview"}));
        assert_eq!(commands[1].command_type, KioskCommandType::MultiviewSet);
        let items = commands[1].payload["items"].as_array().unwrap();
        assert_eq!(items[0], json!({"type": "iptv", "channelId": "ch1"}));
        assert_eq!(items[1]["type"], "camera");
    }

    #[tokio::test]
    async fn test_multiview_to_media_player_always_unsupported() {
        let f = fixture(MockMediaHub::new());
        let requests = vec![
            CastRequest::multiview(TargetKind::MediaPlayer, "media_player.tv", vec![]),
            CastRequest::multiview(
                TargetKind::MediaPlayer,
                "",
                vec![MultiviewItem::Iptv { channel_id: ChannelId::from("missing") }],
            ),
            CastRequest {
                channel_ref: Some(ChannelId::from("ch1")),
                ..CastRequest::multiview(TargetKind::MediaPlayer, "unknown", vec![])
            },
        ];

        for request in requests {
            let err = f.dispatcher.dispatch(&alice(), request).await.unwrap_err();
            assert_eq!(
                err,
                Error::UnsupportedCombination {
                    content: ContentType::Multiview,
                    target: TargetKind::MediaPlayer
                }
            );
        }
    }

    #[tokio::test]
    async fn test_kiosk_owned_by_someone_else_is_not_found() {
        let f = fixture(MockMediaHub::new());
        let request = CastRequest::iptv(TargetKind::Kiosk, "k1", ChannelId::from("ch1"));

        let err = f.dispatcher.dispatch(&test_user_id("bob"), request).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(f.queue.is_empty(&KioskId::from("k1")));
    }

    #[tokio::test]
    async fn test_kiosk_feature_disabled_is_unsupported() {
        let f = fixture(MockMediaHub::new());
        f.store.insert_kiosk(test_kiosk_with(
            "k2",
            "alice",
            KioskFeatures { iptv: true, ..Default::default() },
        ));
        let request = CastRequest::camera(TargetKind::Kiosk, "k2", standalone("cam1"));

        let err = f.dispatcher.dispatch(&alice(), request).await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedCombination { .. }));
        assert_eq!(f.gateway.path_count(), 0);
    }

    #[tokio::test]
    async fn test_validation_precedes_side_effects() {
        let f = fixture(MockMediaHub::new());
        // Second item is unknown, so the first camera must not be registered
        let request = CastRequest::multiview(
            TargetKind::Kiosk,
            "k1",
            vec![
                MultiviewItem::Camera { camera: standalone("cam1") },
                MultiviewItem::Camera { camera: standalone("cam-missing") },
            ],
        );

        let err = f.dispatcher.dispatch(&alice(), request).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(f.gateway.add_calls.load(Ordering::SeqCst), 0);
        assert!(f.queue.is_empty(&KioskId::from("k1")));
    }

    #[tokio::test]
    async fn test_missing_payload_is_invalid_input() {
        let f = fixture(MockMediaHub::new());
        let request = CastRequest {
            channel_ref: None,
            ..CastRequest::iptv(TargetKind::Kiosk, "k1", ChannelId::from("ch1"))
        };
        let err = f.dispatcher.dispatch(&alice(), request).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_camera_to_media_player_registers_then_plays_hls() {
        let mut hub = hub_with_players(&["media_player.tv"]);
        hub.expect_play_media()
            .withf(|_, entity, content_type, content_id| {
                entity == "media_player.tv"
                    && content_type == "video"
                    && content_id == "http://127.0.0.1:8888/camera/cam1/index.m3u8"
            })
            .times(1)
            .returning(|_, _, _, _| Ok(()));
        let f = fixture(hub);
        f.store.insert_hub(test_hub("alice", "http://hass.local:8123"));

        let request = CastRequest::camera(TargetKind::MediaPlayer, "media_player.tv", standalone("cam1"));
        let outcome = f.dispatcher.dispatch(&alice(), request).await.unwrap();

        assert_eq!(
            outcome,
            DispatchOutcome::Played {
                entity_id: "media_player.tv".to_string(),
                media_content_id: "http://127.0.0.1:8888/camera/cam1/index.m3u8".to_string(),
            }
        );
        assert_eq!(f.gateway.add_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_iptv_to_media_player_plays_provider_url() {
        let mut hub = hub_with_players(&["media_player.tv"]);
        hub.expect_play_media()
            .withf(|_, _, _, content_id| content_id.contains("stream=101"))
            .times(1)
            .returning(|_, _, _, _| Ok(()));
        let f = fixture(hub);
        f.store.insert_hub(test_hub("alice", "http://hass.local:8123"));

        let request = CastRequest::iptv(TargetKind::MediaPlayer, "media_player.tv", ChannelId::from("ch1"));
        f.dispatcher.dispatch(&alice(), request).await.unwrap();
    }

    #[tokio::test]
    async fn test_hub_rejection_is_dispatch_failed_without_retry() {
        let mut hub = hub_with_players(&["media_player.tv"]);
        hub.expect_play_media().times(1).returning(|_, _, _, _| {
            Err(Error::DispatchFailed {
                status: 400,
                body: "Entity not found".to_string(),
            })
        });
        let f = fixture(hub);
        f.store.insert_hub(test_hub("alice", "http://hass.local:8123"));

        let request = CastRequest::iptv(TargetKind::MediaPlayer, "media_player.tv", ChannelId::from("ch1"));
        let err = f.dispatcher.dispatch(&alice(), request).await.unwrap_err();
        assert_eq!(
            err,
            Error::DispatchFailed {
                status: 400,
                body: "Entity not found".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_media_player_without_hub_is_not_found() {
        let f = fixture(MockMediaHub::new());
        let request = CastRequest::iptv(TargetKind::MediaPlayer, "media_player.tv", ChannelId::from("ch1"));
        let err = f.dispatcher.dispatch(&alice(), request).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        f.store.insert_hub(test_hub("alice", "http://hass.local:8123"));
        let request = CastRequest::iptv(TargetKind::MediaPlayer, "light.kitchen", ChannelId::from("ch1"));
        let err = f.dispatcher.dispatch(&alice(), request).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_unknown_media_player_is_not_found() {
        let mut hub = hub_with_players(&["media_player.tv"]);
        hub.expect_play_media().never();
        let f = fixture(hub);
        f.store.insert_hub(test_hub("alice", "http://hass.local:8123"));

        let request = CastRequest::iptv(TargetKind::MediaPlayer, "media_player.ghost", ChannelId::from("ch1"));
        let err = f.dispatcher.dispatch(&alice(), request).await.unwrap_err();
        assert_eq!(err, Error::NotFound("Media player media_player.ghost".to_string()));

        let request = CastRequest::camera(TargetKind::MediaPlayer, "media_player.ghost", standalone("cam1"));
        let err = f.dispatcher.dispatch(&alice(), request).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(f.gateway.add_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unreachable_hub_fails_before_side_effects() {
        let mut hub = MockMediaHub::new();
        hub.expect_media_players()
            .returning(|_| Err(Error::Unavailable("connection refused".to_string())));
        hub.expect_play_media().never();
        let f = fixture(hub);
        f.store.insert_hub(test_hub("alice", "http://hass.local:8123"));

        let request = CastRequest::camera(TargetKind::MediaPlayer, "media_player.tv", standalone("cam1"));
        let err = f.dispatcher.dispatch(&alice(), request).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(f.gateway.path_count(), 0);
    }
}
