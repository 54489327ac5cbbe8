//! Live-TV guide cache
//!
//! One immutable [`GuideSnapshot`] per server, swapped in whole after each
//! successful refresh. Readers clone an `Arc` under a short read lock and
//! never wait on the network.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use parking_lot::RwLock;
use tracing::{info, warn};

use super::SingleFlight;
use crate::config::GuideConfig;
use crate::models::{normalize_epg, Channel, EpgEntry, GuideSnapshot, LiveTvServer, ServerId};
use crate::provider::LiveTvProvider;
use crate::resilience::timeout::{with_timeout, TimeoutConfig};
use crate::{Error, Result};

/// What `get` hands back: the snapshot plus whether it came from a refresh
#[derive(Debug, Clone)]
pub struct GuideView {
    pub snapshot: Arc<GuideSnapshot>,
    /// `false` when no refresh has succeeded yet and `snapshot` is the empty placeholder
    pub cached: bool,
    pub last_updated: Option<DateTime<Utc>>,
}

impl GuideView {
    /// Staleness hint for callers; `get` itself never refreshes
    #[must_use]
    pub fn is_stale(&self, freshness_window: Duration, now: DateTime<Utc>) -> bool {
        if !self.cached {
            return true;
        }
        self.snapshot
            .age(now)
            .to_std()
            .is_ok_and(|age| age > freshness_window)
    }
}

#[derive(Clone)]
pub struct GuideCache {
    provider: Arc<dyn LiveTvProvider>,
    snapshots: Arc<RwLock<HashMap<ServerId, Arc<GuideSnapshot>>>>,
    flights: SingleFlight<ServerId, Arc<GuideSnapshot>>,
    freshness_window: Duration,
    epg_concurrency: usize,
    request_timeout: Duration,
}

impl GuideCache {
    pub fn new(
        provider: Arc<dyn LiveTvProvider>,
        config: &GuideConfig,
        timeouts: TimeoutConfig,
    ) -> Self {
        Self {
            provider,
            snapshots: Arc::new(RwLock::new(HashMap::new())),
            flights: SingleFlight::new(),
            freshness_window: config.freshness_window(),
            epg_concurrency: config.epg_concurrency.max(1),
            request_timeout: timeouts.request,
        }
    }

    #[must_use]
    pub const fn freshness_window(&self) -> Duration {
        self.freshness_window
    }

    /// Upper bound on concurrent provider fetches
    #[must_use]
    pub const fn epg_concurrency(&self) -> usize {
        self.epg_concurrency
    }

    /// Current snapshot for a server, the empty placeholder before the first refresh
    #[must_use]
    pub fn get(&self, server_id: &ServerId) -> GuideView {
        match self.snapshots.read().get(server_id) {
            Some(snapshot) => GuideView {
                last_updated: Some(snapshot.fetched_at),
                snapshot: Arc::clone(snapshot),
                cached: true,
            },
            None => GuideView {
                snapshot: Arc::new(GuideSnapshot::empty()),
                cached: false,
                last_updated: None,
            },
        }
    }

    /// Whether the server's snapshot is missing or older than the freshness window
    #[must_use]
    pub fn needs_refresh(&self, server_id: &ServerId, now: DateTime<Utc>) -> bool {
        self.get(server_id).is_stale(self.freshness_window, now)
    }

    /// Channel from the cached guide by provider id
    #[must_use]
    pub fn find_channel(&self, server_id: &ServerId, external_id: &str) -> Option<Channel> {
        self.snapshots
            .read()
            .get(server_id)
            .and_then(|snapshot| snapshot.channel(external_id).cloned())
    }

    /// Fetch a fresh guide and swap it in.
    ///
    /// Concurrent calls for the same server share one fetch. On failure the
    /// previous snapshot stays in place and the caller gets `Unavailable`.
    pub async fn refresh(&self, server: &LiveTvServer) -> Result<Arc<GuideSnapshot>> {
        let cache = self.clone();
        let server = server.clone();
        self.flights
            .run(server.id.clone(), async move { cache.refresh_now(server).await })
            .await
    }

    async fn refresh_now(&self, server: LiveTvServer) -> Result<Arc<GuideSnapshot>> {
        let started = Instant::now();
        let snapshot = match self.fetch(&server).await {
            Ok(snapshot) => Arc::new(snapshot),
            Err(err) => {
                let err = as_unavailable(err);
                warn!(server_id = %server.id, error = %err, "Guide refresh failed, keeping previous snapshot");
                return Err(err);
            }
        };

        self.snapshots
            .write()
            .insert(server.id.clone(), Arc::clone(&snapshot));

        info!(
            server_id = %server.id,
            provider = self.provider.name(),
            channels = snapshot.channels.len(),
            categories = snapshot.categories.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Guide refreshed"
        );
        Ok(snapshot)
    }

    async fn fetch(&self, server: &LiveTvServer) -> Result<GuideSnapshot> {
        let provider = self.provider.as_ref();
        let limit = self.request_timeout;

        let (channels, categories) = tokio::try_join!(
            with_timeout(limit, "list channels", provider.list_channels(server)),
            with_timeout(limit, "list categories", provider.list_categories(server)),
        )?;

        let external_ids: Vec<String> = channels.iter().map(|c| c.external_id.clone()).collect();
        let epg_by_channel: HashMap<String, Vec<EpgEntry>> =
            stream::iter(external_ids)
                .map(move |external_id| async move {
                    let result =
                        with_timeout(limit, "list epg", provider.list_epg(server, &external_id))
                            .await;
                    (external_id, result)
                })
                .buffer_unordered(self.epg_concurrency)
                .map(|(external_id, result)| match result {
                    Ok(entries) => (external_id, normalize_epg(entries)),
                    Err(err) => {
                        // One broken channel should not cost the whole guide
                        warn!(server_id = %server.id, channel = %external_id, error = %err, "EPG fetch failed");
                        (external_id, Vec::new())
                    }
                })
                .collect()
                .await;

        Ok(GuideSnapshot::build(
            channels,
            categories.into_iter().map(|c| (c.id, c.name)).collect(),
            epg_by_channel,
            Utc::now(),
        ))
    }
}

fn as_unavailable(err: Error) -> Error {
    match err {
        Error::Unavailable(_) => err,
        other => Error::Unavailable(format!("Guide provider error: {other}")),
    }
}
