use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use crate::{
    commands::{
        batches::{
            BatchResolution, GetOrCreateBatchCommand, MoveBatchToStageCommand,
            ProductionRecordOutcome, QcSubmissionOutcome, RecordProductionCommand,
            SubmitBatchQcCommand, UpdateBatchQuantityCommand, UpdateBatchStatusCommand,
        },
        Command,
    },
    db::DbPool,
    entities::production_batch,
    errors::ServiceError,
    events::EventSender,
    models::quality::BatchQcData,
    queries::{
        batch_queries::{
            GetBatchQcDataQuery, GetBatchQcHistoryQuery, GetWorkOrderBatchesQuery,
            GetWorkOrderQcHistoryQuery,
        },
        Query,
    },
};

/// Service for the batch lifecycle: creation policy, QC gates, stage
/// transitions and the narrow field updates.
#[derive(Clone)]
pub struct BatchService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    default_gap_threshold_days: i64,
}

impl BatchService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        default_gap_threshold_days: i64,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            default_gap_threshold_days,
        }
    }

    /// Resolves the batch production should be booked against, creating or
    /// restarting one when the policy calls for it. Repeated calls within
    /// the gap window return the same batch.
    #[instrument(skip(self))]
    pub async fn get_or_create_batch(
        &self,
        work_order_id: Uuid,
        gap_threshold_days: Option<i64>,
    ) -> Result<BatchResolution, ServiceError> {
        let command = GetOrCreateBatchCommand {
            work_order_id,
            gap_threshold_days: gap_threshold_days.unwrap_or(self.default_gap_threshold_days),
        };
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self, command))]
    pub async fn submit_qc(
        &self,
        command: SubmitBatchQcCommand,
    ) -> Result<QcSubmissionOutcome, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self, command))]
    pub async fn move_to_stage(
        &self,
        command: MoveBatchToStageCommand,
    ) -> Result<production_batch::Model, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self, command))]
    pub async fn update_status(
        &self,
        command: UpdateBatchStatusCommand,
    ) -> Result<production_batch::Model, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self, command))]
    pub async fn update_quantity(
        &self,
        command: UpdateBatchQuantityCommand,
    ) -> Result<production_batch::Model, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self, command))]
    pub async fn record_production(
        &self,
        command: RecordProductionCommand,
    ) -> Result<ProductionRecordOutcome, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self))]
    pub async fn batch_qc_data(&self, batch_id: Uuid) -> Result<BatchQcData, ServiceError> {
        GetBatchQcDataQuery { batch_id }.execute(&self.db_pool).await
    }

    #[instrument(skip(self))]
    pub async fn batch_qc_history(
        &self,
        batch_id: Uuid,
    ) -> Result<Vec<crate::entities::qc_record::Model>, ServiceError> {
        GetBatchQcHistoryQuery { batch_id }
            .execute(&self.db_pool)
            .await
    }

    #[instrument(skip(self))]
    pub async fn work_order_qc_history(
        &self,
        work_order_id: Uuid,
    ) -> Result<Vec<crate::entities::qc_record::Model>, ServiceError> {
        GetWorkOrderQcHistoryQuery { work_order_id }
            .execute(&self.db_pool)
            .await
    }

    #[instrument(skip(self))]
    pub async fn work_order_batches(
        &self,
        work_order_id: Uuid,
        include_closed: bool,
    ) -> Result<Vec<production_batch::Model>, ServiceError> {
        GetWorkOrderBatchesQuery {
            work_order_id,
            include_closed,
        }
        .execute(&self.db_pool)
        .await
    }
}
