use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    commands::Command,
    db::DbPool,
    entities::{
        production_batch::{self, BatchStatus, QcGateStatus, StageType, TriggerReason},
        production_log, work_order,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

use super::apply_versioned_update;

/// Resolves the batch new production activity on a work order should be
/// booked against: reuses the open batch while production is continuous,
/// restarts after a gap, and starts a follow-up batch after a dispatch
/// closed the previous one.
#[derive(Debug, Serialize, Deserialize)]
pub struct GetOrCreateBatchCommand {
    pub work_order_id: Uuid,
    /// Days of production inactivity after which the open batch is closed
    /// and a gap-restart batch begins.
    pub gap_threshold_days: i64,
}

#[derive(Debug, Serialize)]
pub struct BatchResolution {
    pub batch: production_batch::Model,
    /// False when an open batch was reused unchanged.
    pub created: bool,
}

#[async_trait]
impl Command for GetOrCreateBatchCommand {
    type Result = BatchResolution;

    #[instrument(skip(self, db_pool, event_sender), fields(work_order_id = %self.work_order_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        if self.gap_threshold_days < 1 {
            return Err(ServiceError::InvalidInput(format!(
                "Gap threshold must be at least one day, got: {}",
                self.gap_threshold_days
            )));
        }

        let db = &*db_pool;
        let work_order = work_order::Entity::find_by_id(self.work_order_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Work order {} not found", self.work_order_id))
            })?;

        if let Some(open) = self.find_open_batch(db).await? {
            let gap_days = self.production_gap_days(db, &open).await?;
            if gap_days <= self.gap_threshold_days {
                info!(batch_id = %open.id, gap_days, "reusing open batch");
                return Ok(BatchResolution {
                    batch: open,
                    created: false,
                });
            }

            warn!(
                batch_id = %open.id,
                gap_days,
                threshold = self.gap_threshold_days,
                "production gap exceeded threshold, restarting batch"
            );
            self.close_batch(db, &open).await?;
            event_sender
                .send_or_log(Event::BatchClosed {
                    batch_id: open.id,
                    work_order_id: open.work_order_id,
                })
                .await;
            let created = self
                .create_batch(
                    db,
                    &work_order,
                    open.batch_number + 1,
                    TriggerReason::GapRestart,
                    Some(open.id),
                )
                .await?;
            self.announce(&event_sender, &created).await;
            return Ok(BatchResolution {
                batch: created,
                created: true,
            });
        }

        // No open batch: either nothing exists yet, or the last one was
        // closed by a dispatch and production is resuming.
        let latest = production_batch::Entity::find()
            .filter(production_batch::Column::WorkOrderId.eq(self.work_order_id))
            .order_by_desc(production_batch::Column::BatchNumber)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;

        let (number, reason, previous) = match &latest {
            None => (1, TriggerReason::Initial, None),
            Some(prior) => (
                prior.batch_number + 1,
                TriggerReason::PostDispatch,
                Some(prior.id),
            ),
        };
        let created = self
            .create_batch(db, &work_order, number, reason, previous)
            .await?;
        self.announce(&event_sender, &created).await;
        Ok(BatchResolution {
            batch: created,
            created: true,
        })
    }
}

impl GetOrCreateBatchCommand {
    async fn find_open_batch(
        &self,
        db: &DatabaseConnection,
    ) -> Result<Option<production_batch::Model>, ServiceError> {
        production_batch::Entity::find()
            .filter(production_batch::Column::WorkOrderId.eq(self.work_order_id))
            .filter(production_batch::Column::EndedAt.is_null())
            .order_by_desc(production_batch::Column::BatchNumber)
            .one(db)
            .await
            .map_err(ServiceError::db_error)
    }

    /// Whole days since the batch's last production event, falling back to
    /// its start when nothing has been logged yet.
    async fn production_gap_days(
        &self,
        db: &DatabaseConnection,
        batch: &production_batch::Model,
    ) -> Result<i64, ServiceError> {
        let last_log = production_log::Entity::find()
            .filter(production_log::Column::BatchId.eq(batch.id))
            .order_by_desc(production_log::Column::LoggedAt)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;

        let last_activity = last_log.map(|l| l.logged_at).unwrap_or(batch.started_at);
        Ok(Utc::now().signed_duration_since(last_activity).num_days())
    }

    async fn close_batch(
        &self,
        db: &DatabaseConnection,
        batch: &production_batch::Model,
    ) -> Result<(), ServiceError> {
        let now = Utc::now();
        let active = production_batch::ActiveModel {
            ended_at: Set(Some(now)),
            row_version: Set(batch.row_version + 1),
            updated_at: Set(now),
            ..Default::default()
        };
        apply_versioned_update(db, batch, active).await
    }

    async fn create_batch(
        &self,
        db: &DatabaseConnection,
        work_order: &work_order::Model,
        batch_number: i32,
        trigger_reason: TriggerReason,
        previous_batch_id: Option<Uuid>,
    ) -> Result<production_batch::Model, ServiceError> {
        let quantity = self.remaining_quantity(db, work_order).await?;
        let now = Utc::now();
        // The unique (work_order_id, batch_number) index turns racing
        // creates into a retryable storage conflict instead of duplicates.
        let batch = production_batch::ActiveModel {
            id: Set(Uuid::new_v4()),
            work_order_id: Set(work_order.id),
            batch_number: Set(batch_number),
            trigger_reason: Set(trigger_reason),
            previous_batch_id: Set(previous_batch_id),
            started_at: Set(now),
            ended_at: Set(None),
            stage_type: Set(StageType::Cutting),
            batch_status: Set(BatchStatus::InQueue),
            stage_entered_at: Set(now),
            external_process_type: Set(None),
            external_partner_id: Set(None),
            external_sent_at: Set(None),
            external_returned_at: Set(None),
            requires_qc_on_return: Set(false),
            post_external_qc_status: Set(None),
            batch_quantity: Set(quantity),
            produced_qty: Set(0),
            qc_rejected_qty: Set(0),
            qc_approved_qty: Set(0),
            qc_material_status: Set(QcGateStatus::Pending),
            qc_material_approved_by: Set(None),
            qc_material_approved_at: Set(None),
            qc_first_piece_status: Set(QcGateStatus::Pending),
            qc_first_piece_approved_by: Set(None),
            qc_first_piece_approved_at: Set(None),
            qc_final_status: Set(QcGateStatus::Pending),
            qc_final_approved_by: Set(None),
            qc_final_approved_at: Set(None),
            production_allowed: Set(false),
            dispatch_allowed: Set(false),
            row_version: Set(1),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let created = batch.insert(db).await.map_err(ServiceError::db_error)?;
        metrics::counter!("shopfloor.batches.created", 1);
        info!(
            batch_id = %created.id,
            batch_number = created.batch_number,
            reason = ?created.trigger_reason,
            "batch created"
        );
        Ok(created)
    }

    /// New batches default to the work-order quantity not yet cleared by
    /// earlier batches, floored at zero.
    async fn remaining_quantity(
        &self,
        db: &DatabaseConnection,
        work_order: &work_order::Model,
    ) -> Result<i32, ServiceError> {
        let prior = production_batch::Entity::find()
            .filter(production_batch::Column::WorkOrderId.eq(work_order.id))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        let cleared: i64 = prior.iter().map(|b| i64::from(b.qc_approved_qty)).sum();
        let remaining = i64::from(work_order.quantity) - cleared;
        Ok(remaining.clamp(0, i64::from(i32::MAX)) as i32)
    }

    async fn announce(&self, event_sender: &EventSender, batch: &production_batch::Model) {
        event_sender
            .send_or_log(Event::BatchCreated {
                batch_id: batch.id,
                work_order_id: batch.work_order_id,
                batch_number: batch.batch_number,
                trigger_reason: batch.trigger_reason,
            })
            .await;
    }
}
