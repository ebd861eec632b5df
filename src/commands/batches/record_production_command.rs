use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    commands::Command,
    db::DbPool,
    entities::{production_batch, production_log},
    errors::ServiceError,
    events::{Event, EventSender},
};

use super::{apply_versioned_update, ensure_open, load_batch};

/// Appends a production event against a batch. The log row is the primary
/// write; the batch's `produced_qty`/`qc_rejected_qty` totals are mirrored
/// summary fields updated best-effort afterwards.
#[derive(Debug, Serialize, Deserialize)]
pub struct RecordProductionCommand {
    pub batch_id: Uuid,
    pub quantity: i32,
    pub rejected_qty: i32,
    /// Defaults to now; backdated entries feed the gap policy correctly.
    pub logged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductionRecordOutcome {
    pub log_id: Uuid,
    pub batch_id: Uuid,
    /// False when the log row landed but the batch totals could not be
    /// mirrored; the totals catch up on the next successful write.
    pub totals_mirrored: bool,
}

#[async_trait]
impl Command for RecordProductionCommand {
    type Result = ProductionRecordOutcome;

    #[instrument(skip(self, db_pool, event_sender), fields(batch_id = %self.batch_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        if self.quantity < 0 || self.rejected_qty < 0 {
            return Err(ServiceError::InvalidInput(
                "Produced and rejected quantities cannot be negative".to_string(),
            ));
        }

        let db = &*db_pool;
        let batch = load_batch(db, self.batch_id).await?;
        ensure_open(&batch)?;

        let now = Utc::now();
        let log = production_log::ActiveModel {
            id: Set(Uuid::new_v4()),
            batch_id: Set(batch.id),
            work_order_id: Set(batch.work_order_id),
            quantity: Set(self.quantity),
            rejected_qty: Set(self.rejected_qty),
            logged_at: Set(self.logged_at.unwrap_or(now)),
            created_at: Set(now),
        };
        let inserted = log.insert(db).await.map_err(ServiceError::db_error)?;
        metrics::counter!("shopfloor.production.events", 1);

        // Mirrored summary fields; failure is logged and left for a later
        // write to repair, never surfaced as an overall failure.
        let active = production_batch::ActiveModel {
            produced_qty: Set(batch.produced_qty.saturating_add(self.quantity)),
            qc_rejected_qty: Set(batch.qc_rejected_qty.saturating_add(self.rejected_qty)),
            row_version: Set(batch.row_version + 1),
            updated_at: Set(now),
            ..Default::default()
        };
        let totals_mirrored = match apply_versioned_update(db, &batch, active).await {
            Ok(()) => true,
            Err(e) => {
                warn!(batch_id = %batch.id, error = %e, "failed to mirror production totals onto batch");
                metrics::counter!("shopfloor.production.mirror_failures", 1);
                false
            }
        };

        event_sender
            .send_or_log(Event::ProductionRecorded {
                batch_id: batch.id,
                quantity: self.quantity,
                rejected_qty: self.rejected_qty,
            })
            .await;

        info!(
            quantity = self.quantity,
            rejected = self.rejected_qty,
            totals_mirrored,
            "production recorded"
        );
        Ok(ProductionRecordOutcome {
            log_id: inserted.id,
            batch_id: batch.id,
            totals_mirrored,
        })
    }
}
