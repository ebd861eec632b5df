use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument};

use crate::{
    db::DbPool,
    errors::ServiceError,
    events::{ChangeFeed, EntityClass},
    models::wip::WipSnapshot,
    queries::{wip_queries::GetWipSnapshotQuery, Query},
};

/// Read-side WIP aggregation. Holds the latest snapshot and rebuilds it
/// from scratch whenever the change feed reports a row change in one of
/// the record classes the aggregation is derived from.
#[derive(Clone)]
pub struct WipService {
    db: Arc<DbPool>,
    snapshot: Arc<RwLock<Option<WipSnapshot>>>,
}

impl WipService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self {
            db,
            snapshot: Arc::new(RwLock::new(None)),
        }
    }

    /// Recomputes the snapshot and publishes it as current.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<WipSnapshot, ServiceError> {
        let snapshot = GetWipSnapshotQuery.execute(&self.db).await?;
        *self.snapshot.write().await = Some(snapshot.clone());
        metrics::counter!("shopfloor.wip.recomputes", 1);
        Ok(snapshot)
    }

    /// Current snapshot, computing the first one on demand.
    pub async fn snapshot(&self) -> Result<WipSnapshot, ServiceError> {
        if let Some(snapshot) = self.snapshot.read().await.clone() {
            return Ok(snapshot);
        }
        self.refresh().await
    }

    fn affects_wip(class: EntityClass) -> bool {
        matches!(
            class,
            EntityClass::Batch | EntityClass::ExternalMove | EntityClass::Carton
        )
    }

    /// Spawns the notification-driven refresher. Runs until the feed is
    /// dropped. A lagged receiver simply triggers a recompute, which is
    /// always safe because the recompute reads current state, not the
    /// missed notices.
    pub fn spawn_refresher(&self, feed: &ChangeFeed) -> JoinHandle<()> {
        let service = self.clone();
        let mut rx = feed.subscribe();
        tokio::spawn(async move {
            info!("WIP refresher started");
            loop {
                match rx.recv().await {
                    Ok(change) if Self::affects_wip(change.class) => {
                        debug!(class = ?change.class, id = %change.id, "change notice, recomputing WIP");
                        if let Err(e) = service.refresh().await {
                            error!(error = %e, "WIP recompute failed");
                        }
                    }
                    Ok(_) => {}
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "WIP refresher lagged, recomputing");
                        if let Err(e) = service.refresh().await {
                            error!(error = %e, "WIP recompute failed");
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
            info!("WIP refresher stopped");
        })
    }
}
