//! Cast target listing

use std::sync::Arc;

use tracing::debug;

use crate::models::{CastTarget, UserId};
use crate::provider::MediaHub;
use crate::repository::CastStore;
use crate::resilience::timeout::{with_timeout, TimeoutConfig};
use crate::Result;

pub struct CastTargetService {
    store: Arc<dyn CastStore>,
    hub: Arc<dyn MediaHub>,
    timeouts: TimeoutConfig,
}

impl CastTargetService {
    pub fn new(store: Arc<dyn CastStore>, hub: Arc<dyn MediaHub>, timeouts: TimeoutConfig) -> Self {
        Self {
            store,
            hub,
            timeouts,
        }
    }

    /// The user's kiosks followed by their hub's media players.
    ///
    /// A user without a hub connection gets kiosks only. A configured hub that
    /// cannot be reached is an error, not an empty list.
    pub async fn list_targets(&self, user_id: &UserId) -> Result<Vec<CastTarget>> {
        let mut targets: Vec<CastTarget> = self
            .store
            .list_kiosks(user_id)
            .await?
            .iter()
            .map(|kiosk| kiosk.as_target())
            .collect();

        if let Some(hub) = self.store.get_hub(user_id).await? {
            let mut players = with_timeout(
                self.timeouts.request,
                "list hub media players",
                self.hub.media_players(&hub),
            )
            .await?;
            players.sort_by(|a, b| a.name.cmp(&b.name));
            targets.extend(players);
        }

        debug!(user_id = %user_id, targets = targets.len(), "Listed cast targets");
        Ok(targets)
    }
}
