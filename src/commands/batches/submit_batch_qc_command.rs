use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    commands::Command,
    db::DbPool,
    entities::{production_batch, qc_record, qc_record::QcType},
    errors::ServiceError,
    events::{Event, EventSender},
    models::quality::{approved_quantity, BatchQcData, GateSnapshot, QcOutcome},
    services::instruments::{self, CalibrationStatus},
};

use super::{apply_versioned_update, ensure_open, load_batch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum QcResultInput {
    Pass,
    Fail,
    Waived,
}

/// Records a quality-gate outcome against a batch and recomputes the
/// derived permission flags from the full set of persisted gate statuses.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitBatchQcCommand {
    pub batch_id: Uuid,
    pub qc_type: QcType,
    pub result: QcResultInput,
    pub waive_reason: Option<String>,
    pub remarks: Option<String>,
    pub inspected_quantity: Option<i32>,
    /// Required for first-piece QC; must reference an instrument whose
    /// calibration is current.
    pub instrument_id: Option<Uuid>,
    pub approved_by: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QcSubmissionOutcome {
    pub batch: BatchQcData,
    /// False when the batch update landed but the audit record insert
    /// failed. The submission still counts; the gap is logged.
    pub audit_recorded: bool,
}

#[async_trait]
impl Command for SubmitBatchQcCommand {
    type Result = QcSubmissionOutcome;

    #[instrument(skip(self, db_pool, event_sender), fields(batch_id = %self.batch_id, qc_type = ?self.qc_type))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let db = &*db_pool;
        let outcome = self.validated_outcome()?;

        let batch = load_batch(db, self.batch_id).await?;
        ensure_open(&batch)?;
        self.check_gate_preconditions(db, &batch).await?;

        let status = outcome.stored_status();
        let snapshot = GateSnapshot::of(&batch).with_gate(self.qc_type, status);
        let production_allowed = snapshot.production_allowed();
        let dispatch_allowed = snapshot.dispatch_allowed();

        let now = Utc::now();
        let mut active = production_batch::ActiveModel {
            production_allowed: Set(production_allowed),
            dispatch_allowed: Set(dispatch_allowed),
            row_version: Set(batch.row_version + 1),
            updated_at: Set(now),
            ..Default::default()
        };
        match self.qc_type {
            QcType::Material => {
                active.qc_material_status = Set(status);
                active.qc_material_approved_by = Set(self.approved_by);
                active.qc_material_approved_at = Set(Some(now));
            }
            QcType::FirstPiece => {
                active.qc_first_piece_status = Set(status);
                active.qc_first_piece_approved_by = Set(self.approved_by);
                active.qc_first_piece_approved_at = Set(Some(now));
            }
            QcType::Final => {
                active.qc_final_status = Set(status);
                active.qc_final_approved_by = Set(self.approved_by);
                active.qc_final_approved_at = Set(Some(now));
                if status.is_satisfied() {
                    active.qc_approved_qty =
                        Set(approved_quantity(batch.produced_qty, batch.qc_rejected_qty));
                }
            }
            QcType::PostExternal => {
                active.post_external_qc_status = Set(Some(status));
                // The "needs re-inspection" condition is considered
                // resolved once inspected, whatever the outcome.
                active.requires_qc_on_return = Set(false);
            }
        }

        apply_versioned_update(db, &batch, active).await?;
        metrics::counter!("shopfloor.qc.submissions", 1);

        // Audit append is best-effort after the primary write: a failure
        // here must not roll back or fail the submission.
        let audit_recorded = self.append_audit_record(db, &batch, &outcome).await;

        event_sender
            .send_or_log(Event::BatchQcSubmitted {
                batch_id: batch.id,
                qc_type: self.qc_type,
                production_allowed,
                dispatch_allowed,
            })
            .await;

        let updated = load_batch(db, self.batch_id).await?;
        info!(
            status = ?status,
            production_allowed,
            dispatch_allowed,
            audit_recorded,
            "QC gate recorded"
        );
        Ok(QcSubmissionOutcome {
            batch: BatchQcData::from(&updated),
            audit_recorded,
        })
    }
}

impl SubmitBatchQcCommand {
    /// Input validation; rejects before any write occurs.
    fn validated_outcome(&self) -> Result<QcOutcome, ServiceError> {
        if self.inspected_quantity.is_some_and(|q| q < 0) {
            return Err(ServiceError::InvalidInput(
                "Inspected quantity cannot be negative".to_string(),
            ));
        }
        match self.result {
            QcResultInput::Pass => Ok(QcOutcome::Pass),
            QcResultInput::Fail => Ok(QcOutcome::Fail),
            QcResultInput::Waived => {
                let reason = [self.waive_reason.as_deref(), self.remarks.as_deref()]
                    .into_iter()
                    .flatten()
                    .map(str::trim)
                    .find(|r| !r.is_empty());
                match reason {
                    Some(reason) => Ok(QcOutcome::Waived {
                        reason: reason.to_string(),
                    }),
                    None => Err(ServiceError::ValidationError(
                        "A waived result requires a waive reason or remarks".to_string(),
                    )),
                }
            }
        }
    }

    async fn check_gate_preconditions(
        &self,
        db: &DatabaseConnection,
        batch: &production_batch::Model,
    ) -> Result<(), ServiceError> {
        match self.qc_type {
            QcType::FirstPiece => {
                let instrument_id = self.instrument_id.ok_or_else(|| {
                    ServiceError::ValidationError(
                        "First-piece QC requires a measurement instrument".to_string(),
                    )
                })?;
                match instruments::calibration_status(db, instrument_id).await? {
                    CalibrationStatus::Valid => Ok(()),
                    CalibrationStatus::Overdue => Err(ServiceError::ValidationError(format!(
                        "Instrument {} calibration is overdue",
                        instrument_id
                    ))),
                }
            }
            QcType::PostExternal => {
                if !batch.requires_qc_on_return {
                    return Err(ServiceError::ValidationError(format!(
                        "Batch {} has no return inspection pending",
                        batch.id
                    )));
                }
                Ok(())
            }
            // The final gate is not hard-blocked on upstream gates; an
            // early submission simply leaves dispatch_allowed false.
            QcType::Material | QcType::Final => Ok(()),
        }
    }

    async fn append_audit_record(
        &self,
        db: &DatabaseConnection,
        batch: &production_batch::Model,
        outcome: &QcOutcome,
    ) -> bool {
        let now = Utc::now();
        let record = qc_record::ActiveModel {
            id: Set(Uuid::new_v4()),
            batch_id: Set(Some(batch.id)),
            work_order_id: Set(batch.work_order_id),
            qc_type: Set(self.qc_type),
            result: Set(outcome.stored_result()),
            inspected_quantity: Set(self.inspected_quantity),
            waive_reason: Set(outcome.waive_reason().map(str::to_string)),
            remarks: Set(self.remarks.clone()),
            approved_by: Set(self.approved_by),
            approved_at: Set(now),
            created_at: Set(now),
        };
        match record.insert(db).await {
            Ok(_) => true,
            Err(e) => {
                warn!(batch_id = %batch.id, error = %e, "QC audit record write failed after batch update");
                metrics::counter!("shopfloor.qc.audit_write_failures", 1);
                false
            }
        }
    }
}
