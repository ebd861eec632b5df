use async_trait::async_trait;
use chrono::Utc;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    commands::Command,
    db::DbPool,
    entities::production_batch::{self, BatchStatus, StageType},
    errors::ServiceError,
    events::{Event, EventSender},
    models::pipeline,
};

use super::{apply_versioned_update, ensure_open, load_batch};

/// Moves a batch to another pipeline stage, enforcing the allowed stage
/// edges and the per-stage validity of the external fields.
#[derive(Debug, Serialize, Deserialize)]
pub struct MoveBatchToStageCommand {
    pub batch_id: Uuid,
    pub new_stage: StageType,
    /// Defaults to `in_queue` when omitted.
    pub new_status: Option<BatchStatus>,
    pub external_process_type: Option<String>,
    pub external_partner_id: Option<Uuid>,
    /// Whether the batch must be re-inspected when it comes back from the
    /// partner; only meaningful when moving to `external`.
    pub requires_qc_on_return: Option<bool>,
}

#[async_trait]
impl Command for MoveBatchToStageCommand {
    type Result = production_batch::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(batch_id = %self.batch_id, new_stage = ?self.new_stage))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let db = &*db_pool;
        let batch = load_batch(db, self.batch_id).await?;
        ensure_open(&batch)?;

        if !pipeline::is_transition_allowed(batch.stage_type, self.new_stage) {
            return Err(ServiceError::InvalidOperation(format!(
                "Cannot move batch from {} to {}; allowed: {:?}",
                batch.stage_type.as_str(),
                self.new_stage.as_str(),
                pipeline::allowed_successors(batch.stage_type)
                    .iter()
                    .map(StageType::as_str)
                    .collect::<Vec<_>>()
            )));
        }

        let now = Utc::now();
        let mut active = production_batch::ActiveModel {
            stage_type: Set(self.new_stage),
            batch_status: Set(self.new_status.unwrap_or(BatchStatus::InQueue)),
            stage_entered_at: Set(now),
            row_version: Set(batch.row_version + 1),
            updated_at: Set(now),
            ..Default::default()
        };

        if self.new_stage == StageType::External {
            if self.external_process_type.is_none() || self.external_partner_id.is_none() {
                // Tolerated caller error; the batch still moves, but the
                // external views will not be able to attribute it.
                warn!(batch_id = %batch.id, "moving to external without process/partner");
            }
            active.external_process_type = Set(self.external_process_type.clone());
            active.external_partner_id = Set(self.external_partner_id);
            active.external_sent_at = Set(Some(now));
            active.external_returned_at = Set(None);
            if let Some(requires_qc) = self.requires_qc_on_return {
                active.requires_qc_on_return = Set(requires_qc);
            }
        } else {
            active.external_process_type = Set(None);
            active.external_partner_id = Set(None);
            if batch.stage_type == StageType::External {
                active.external_returned_at = Set(Some(now));
            }
        }

        apply_versioned_update(db, &batch, active).await?;
        metrics::counter!("shopfloor.batches.stage_moves", 1);

        event_sender
            .send_or_log(Event::BatchStageChanged {
                batch_id: batch.id,
                from: batch.stage_type,
                to: self.new_stage,
            })
            .await;

        let updated = load_batch(db, self.batch_id).await?;
        info!(from = ?batch.stage_type, to = ?self.new_stage, "batch stage changed");
        Ok(updated)
    }
}
