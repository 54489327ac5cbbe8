//! Periodic guide staleness sweep
//!
//! Refreshes every server whose guide is missing or older than the freshness
//! window, at most `epg_concurrency` servers at a time. Failures are logged
//! and left for the next tick. Shutdown interrupts a sweep in progress.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::{stream, StreamExt};
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::cache::GuideCache;
use crate::repository::CastStore;
use crate::Result;

/// Counts from one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub refreshed: usize,
    pub failed: usize,
    pub fresh: usize,
}

pub struct GuideSweeper {
    guide: GuideCache,
    store: Arc<dyn CastStore>,
    sweep_interval: Duration,
    cancel_token: CancellationToken,
}

impl GuideSweeper {
    pub fn new(guide: GuideCache, store: Arc<dyn CastStore>, sweep_interval: Duration) -> Self {
        Self {
            guide,
            store,
            sweep_interval,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Spawn the sweep loop. `None` when the interval is zero (sweeping disabled).
    ///
    /// The first sweep runs immediately. Use `shutdown()` to stop the loop.
    #[must_use]
    pub fn start(&self) -> Option<tokio::task::JoinHandle<()>> {
        if self.sweep_interval.is_zero() {
            tracing::info!("Guide sweeper disabled");
            return None;
        }

        let guide = self.guide.clone();
        let store = Arc::clone(&self.store);
        let cancel_token = self.cancel_token.clone();
        let mut timer = interval(self.sweep_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Some(tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = cancel_token.cancelled() => {
                        tracing::info!("Guide sweeper shutting down");
                        return;
                    }
                    _ = timer.tick() => {}
                }

                tokio::select! {
                    () = cancel_token.cancelled() => {
                        tracing::info!("Guide sweeper shutting down mid-sweep");
                        return;
                    }
                    result = Self::sweep(&guide, store.as_ref()) => {
                        if let Err(e) = result {
                            tracing::warn!(error = %e, "Guide sweep could not list servers");
                        }
                    }
                }
            }
        }))
    }

    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }

    /// Run one sweep now
    pub async fn sweep_once(&self) -> Result<SweepReport> {
        Self::sweep(&self.guide, self.store.as_ref()).await
    }

    async fn sweep(guide: &GuideCache, store: &dyn CastStore) -> Result<SweepReport> {
        let now = Utc::now();
        let servers = store.list_servers().await?;
        let (stale, fresh): (Vec<_>, Vec<_>) = servers
            .into_iter()
            .partition(|server| guide.needs_refresh(&server.id, now));

        let results: Vec<_> = stream::iter(stale)
            .map(|server| async move {
                let result = guide.refresh(&server).await;
                (server, result)
            })
            .buffer_unordered(guide.epg_concurrency())
            .collect()
            .await;

        let mut report = SweepReport {
            fresh: fresh.len(),
            ..SweepReport::default()
        };
        for (server, result) in results {
            match result {
                Ok(_) => report.refreshed += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(server_id = %server.id, error = %e, "Stale guide refresh failed");
                }
            }
        }

        tracing::debug!(
            refreshed = report.refreshed,
            failed = report.failed,
            fresh = report.fresh,
            "Guide sweep finished"
        );
        Ok(report)
    }
}
