pub mod get_or_create_batch_command;
pub mod move_batch_to_stage_command;
pub mod record_production_command;
pub mod submit_batch_qc_command;
pub mod update_batch_quantity_command;
pub mod update_batch_status_command;

pub use get_or_create_batch_command::{BatchResolution, GetOrCreateBatchCommand};
pub use move_batch_to_stage_command::MoveBatchToStageCommand;
pub use record_production_command::{ProductionRecordOutcome, RecordProductionCommand};
pub use submit_batch_qc_command::{QcResultInput, QcSubmissionOutcome, SubmitBatchQcCommand};
pub use update_batch_quantity_command::UpdateBatchQuantityCommand;
pub use update_batch_status_command::UpdateBatchStatusCommand;

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::entities::production_batch;
use crate::errors::ServiceError;

/// Loads a batch or fails with a uniform not-found error.
pub(crate) async fn load_batch(
    db: &DatabaseConnection,
    batch_id: Uuid,
) -> Result<production_batch::Model, ServiceError> {
    production_batch::Entity::find_by_id(batch_id)
        .one(db)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("Batch {} not found", batch_id)))
}

/// Closed batches are immutable except for QC history.
pub(crate) fn ensure_open(batch: &production_batch::Model) -> Result<(), ServiceError> {
    if batch.is_closed() {
        return Err(ServiceError::InvalidOperation(format!(
            "Batch {} is closed and can no longer be modified",
            batch.id
        )));
    }
    Ok(())
}

/// Applies a field update conditioned on the version the caller loaded.
/// The active model must already carry `row_version = loaded + 1`; a stale
/// loaded version matches no row and surfaces as a conflict, so two
/// concurrent inspectors can never silently overwrite one another.
pub(crate) async fn apply_versioned_update(
    db: &DatabaseConnection,
    loaded: &production_batch::Model,
    active: production_batch::ActiveModel,
) -> Result<(), ServiceError> {
    let result = production_batch::Entity::update_many()
        .set(active)
        .filter(production_batch::Column::Id.eq(loaded.id))
        .filter(production_batch::Column::RowVersion.eq(loaded.row_version))
        .exec(db)
        .await
        .map_err(ServiceError::db_error)?;

    if result.rows_affected == 0 {
        return Err(ServiceError::ConcurrentModification(loaded.id));
    }
    Ok(())
}
