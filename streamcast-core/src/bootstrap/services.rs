//! Service initialization and dependency injection

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::info;

use crate::{
    cache::GuideCache,
    provider::{HassHub, LiveTvProvider, MediaHub, MediaMtxGateway, TranscodeGateway, XtreamProvider},
    repository::{CastStore, KioskQueue},
    resilience::timeout::TimeoutConfig,
    service::{CastDispatcher, CastTargetService, GuideSweeper, StreamPathRegistry, StreamResolver},
    logging, Config,
};

/// Container for all initialized services
#[derive(Clone)]
pub struct Services {
    /// Per-server guide snapshots
    pub guide: GuideCache,
    /// Camera transcoding paths
    pub stream_paths: Arc<StreamPathRegistry>,
    pub resolver: StreamResolver,
    pub dispatcher: Arc<CastDispatcher>,
    pub targets: Arc<CastTargetService>,
    /// Background guide refresh; call `start()` once the runtime is up
    pub sweeper: Arc<GuideSweeper>,
}

/// Build every service over the real vendor adapters.
///
/// The store and kiosk queue belong to the embedding application.
pub fn init_services(
    config: &Config,
    store: Arc<dyn CastStore>,
    queue: Arc<dyn KioskQueue>,
) -> anyhow::Result<Services> {
    let timeouts = TimeoutConfig::from(&config.timeouts);

    let provider: Arc<dyn LiveTvProvider> = Arc::new(XtreamProvider::new(timeouts.request));
    let gateway: Arc<dyn TranscodeGateway> =
        Arc::new(MediaMtxGateway::new(&config.gateway.api_url, timeouts)?);
    let hub: Arc<dyn MediaHub> = Arc::new(HassHub::new(timeouts.request));
    info!(
        provider = provider.name(),
        gateway = %config.gateway.api_url,
        "External adapters initialized"
    );

    Ok(build_services(config, store, queue, provider, gateway, hub))
}

/// Process entry point: install logging, build services and start the guide sweeper.
///
/// Must run inside a tokio runtime. The handle is `None` when sweeping is disabled.
pub fn start(
    config: &Config,
    store: Arc<dyn CastStore>,
    queue: Arc<dyn KioskQueue>,
) -> anyhow::Result<(Services, Option<JoinHandle<()>>)> {
    logging::init_logging(&config.logging)?;
    let services = init_services(config, store, queue)?;
    let sweeper = services.sweeper.start();
    info!(sweeper = sweeper.is_some(), "Streamcast started");
    Ok((services, sweeper))
}

/// Wire services over arbitrary adapters
pub fn build_services(
    config: &Config,
    store: Arc<dyn CastStore>,
    queue: Arc<dyn KioskQueue>,
    provider: Arc<dyn LiveTvProvider>,
    gateway: Arc<dyn TranscodeGateway>,
    hub: Arc<dyn MediaHub>,
) -> Services {
    let timeouts = TimeoutConfig::from(&config.timeouts);

    let guide = GuideCache::new(Arc::clone(&provider), &config.guide, timeouts);
    let stream_paths = Arc::new(StreamPathRegistry::new(gateway, &config.gateway, timeouts));
    let resolver = StreamResolver::new(
        Arc::clone(&store),
        guide.clone(),
        provider,
        Arc::clone(&stream_paths),
        Arc::clone(&hub),
    );
    let dispatcher = Arc::new(CastDispatcher::new(
        Arc::clone(&store),
        queue,
        resolver.clone(),
        Arc::clone(&hub),
        timeouts,
    ));
    let targets = Arc::new(CastTargetService::new(Arc::clone(&store), hub, timeouts));
    let sweeper = Arc::new(GuideSweeper::new(
        guide.clone(),
        store,
        config.guide.sweep_interval(),
    ));

    info!("Cast services initialized");
    Services {
        guide,
        stream_paths,
        resolver,
        dispatcher,
        targets,
        sweeper,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{MemoryKioskQueue, MemoryStore};

    #[tokio::test]
    async fn test_init_services_with_defaults() {
        let services = init_services(
            &Config::default(),
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryKioskQueue::new()),
        )
        .unwrap();

        let urls = services
            .stream_paths
            .get_stream_urls(&crate::models::CameraId::from("cam1"));
        assert_eq!(urls.hls_url, "http://127.0.0.1:8888/camera/cam1/index.m3u8");
        assert!(!services.guide.get(&crate::models::ServerId::from("srv1")).cached);
    }

    #[test]
    fn test_invalid_gateway_url_fails() {
        let mut config = Config::default();
        config.gateway.api_url = String::new();
        let result = init_services(
            &config,
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryKioskQueue::new()),
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_start_installs_logging_and_honours_disabled_sweeper() {
        let mut config = Config::default();
        config.guide.sweep_interval_secs = 0;
        config.logging.level = "debug".to_string();

        let (services, sweeper) = start(
            &config,
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryKioskQueue::new()),
        )
        .unwrap();
        assert!(sweeper.is_none());
        assert!(services.stream_paths.registered_paths().is_empty());
    }
}
