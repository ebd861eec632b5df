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
    entities::production_batch,
    errors::ServiceError,
    events::{Event, EventSender},
};

use super::{apply_versioned_update, ensure_open, load_batch};

/// Narrow sibling of `MoveBatchToStageCommand`: adjusts the batch quantity
/// without touching stage or status.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateBatchQuantityCommand {
    pub batch_id: Uuid,
    pub quantity: i32,
}

#[async_trait]
impl Command for UpdateBatchQuantityCommand {
    type Result = production_batch::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(batch_id = %self.batch_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        if self.quantity < 0 {
            return Err(ServiceError::InvalidInput(format!(
                "Batch quantity cannot be negative, got: {}",
                self.quantity
            )));
        }

        let db = &*db_pool;
        let batch = load_batch(db, self.batch_id).await?;
        ensure_open(&batch)?;

        let active = production_batch::ActiveModel {
            batch_quantity: Set(self.quantity),
            row_version: Set(batch.row_version + 1),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        apply_versioned_update(db, &batch, active).await?;

        event_sender
            .send_or_log(Event::BatchQuantityChanged {
                batch_id: batch.id,
                quantity: self.quantity,
            })
            .await;

        let updated = load_batch(db, self.batch_id).await?;
        info!(quantity = self.quantity, "batch quantity updated");
        Ok(updated)
    }
}
