use async_trait::async_trait;
use chrono::Utc;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    commands::Command,
    db::DbPool,
    entities::production_batch::{self, BatchStatus},
    errors::ServiceError,
    events::{Event, EventSender},
};

use super::{apply_versioned_update, ensure_open, load_batch};

/// Narrow sibling of `MoveBatchToStageCommand`: updates the within-stage
/// status without touching the stage itself.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateBatchStatusCommand {
    pub batch_id: Uuid,
    pub new_status: BatchStatus,
}

#[async_trait]
impl Command for UpdateBatchStatusCommand {
    type Result = production_batch::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(batch_id = %self.batch_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let db = &*db_pool;
        let batch = load_batch(db, self.batch_id).await?;
        ensure_open(&batch)?;

        let active = production_batch::ActiveModel {
            batch_status: Set(self.new_status),
            row_version: Set(batch.row_version + 1),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        apply_versioned_update(db, &batch, active).await?;

        event_sender
            .send_or_log(Event::BatchStatusChanged { batch_id: batch.id })
            .await;

        let updated = load_batch(db, self.batch_id).await?;
        info!(status = ?self.new_status, "batch status updated");
        Ok(updated)
    }
}
