use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::production_batch::{self, QcGateStatus};
use crate::entities::qc_record::{QcResult, QcType};

/// Inspection outcome as submitted. A waiver carries its reason as data so
/// that gating logic never has to re-derive "pass with a reason string"
/// from the flattened stored form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum QcOutcome {
    Pass,
    Fail,
    Waived { reason: String },
}

impl QcOutcome {
    pub fn stored_status(&self) -> QcGateStatus {
        match self {
            QcOutcome::Pass => QcGateStatus::Passed,
            QcOutcome::Fail => QcGateStatus::Failed,
            QcOutcome::Waived { .. } => QcGateStatus::Waived,
        }
    }

    /// Flattened two-valued result for the audit row. Waivers store `Pass`
    /// plus the reason; `waive_reason` keeps them audit-distinct.
    pub fn stored_result(&self) -> QcResult {
        match self {
            QcOutcome::Pass | QcOutcome::Waived { .. } => QcResult::Pass,
            QcOutcome::Fail => QcResult::Fail,
        }
    }

    pub fn waive_reason(&self) -> Option<&str> {
        match self {
            QcOutcome::Waived { reason } => Some(reason.as_str()),
            _ => None,
        }
    }
}

/// Current value of every gate on a batch, used to recompute the derived
/// permission flags from persisted state rather than from any cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateSnapshot {
    pub material: QcGateStatus,
    pub first_piece: QcGateStatus,
    pub final_qc: QcGateStatus,
    pub post_external: Option<QcGateStatus>,
}

impl GateSnapshot {
    pub fn of(batch: &production_batch::Model) -> Self {
        Self {
            material: batch.qc_material_status,
            first_piece: batch.qc_first_piece_status,
            final_qc: batch.qc_final_status,
            post_external: batch.post_external_qc_status,
        }
    }

    /// Snapshot with one gate replaced by a just-written value.
    pub fn with_gate(mut self, gate: QcType, status: QcGateStatus) -> Self {
        match gate {
            QcType::Material => self.material = status,
            QcType::FirstPiece => self.first_piece = status,
            QcType::Final => self.final_qc = status,
            QcType::PostExternal => self.post_external = Some(status),
        }
        self
    }

    /// `production_allowed` ⇔ material and first-piece both passed or
    /// waived.
    pub fn production_allowed(&self) -> bool {
        self.material.is_satisfied() && self.first_piece.is_satisfied()
    }

    /// `dispatch_allowed` additionally requires the final gate; it can
    /// never hold without `production_allowed`.
    pub fn dispatch_allowed(&self) -> bool {
        self.production_allowed() && self.final_qc.is_satisfied()
    }
}

/// Quantity cleared by final QC. Floored at zero so transient out-of-order
/// rejection updates never produce a negative figure.
pub fn approved_quantity(produced_qty: i32, rejected_qty: i32) -> i32 {
    (produced_qty - rejected_qty).max(0)
}

/// Per-batch aggregate of gate statuses and permission flags exposed to
/// dashboards and forms.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct BatchQcData {
    pub batch_id: Uuid,
    pub work_order_id: Uuid,
    pub batch_number: i32,
    pub qc_material_status: QcGateStatus,
    pub qc_material_approved_by: Option<Uuid>,
    pub qc_material_approved_at: Option<DateTime<Utc>>,
    pub qc_first_piece_status: QcGateStatus,
    pub qc_first_piece_approved_by: Option<Uuid>,
    pub qc_first_piece_approved_at: Option<DateTime<Utc>>,
    pub qc_final_status: QcGateStatus,
    pub qc_final_approved_by: Option<Uuid>,
    pub qc_final_approved_at: Option<DateTime<Utc>>,
    pub post_external_qc_status: Option<QcGateStatus>,
    pub requires_qc_on_return: bool,
    pub production_allowed: bool,
    pub dispatch_allowed: bool,
    pub produced_qty: i32,
    pub qc_rejected_qty: i32,
    pub qc_approved_qty: i32,
}

impl From<&production_batch::Model> for BatchQcData {
    fn from(batch: &production_batch::Model) -> Self {
        Self {
            batch_id: batch.id,
            work_order_id: batch.work_order_id,
            batch_number: batch.batch_number,
            qc_material_status: batch.qc_material_status,
            qc_material_approved_by: batch.qc_material_approved_by,
            qc_material_approved_at: batch.qc_material_approved_at,
            qc_first_piece_status: batch.qc_first_piece_status,
            qc_first_piece_approved_by: batch.qc_first_piece_approved_by,
            qc_first_piece_approved_at: batch.qc_first_piece_approved_at,
            qc_final_status: batch.qc_final_status,
            qc_final_approved_by: batch.qc_final_approved_by,
            qc_final_approved_at: batch.qc_final_approved_at,
            post_external_qc_status: batch.post_external_qc_status,
            requires_qc_on_return: batch.requires_qc_on_return,
            production_allowed: batch.production_allowed,
            dispatch_allowed: batch.dispatch_allowed,
            produced_qty: batch.produced_qty,
            qc_rejected_qty: batch.qc_rejected_qty,
            qc_approved_qty: batch.qc_approved_qty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(
        material: QcGateStatus,
        first_piece: QcGateStatus,
        final_qc: QcGateStatus,
    ) -> GateSnapshot {
        GateSnapshot {
            material,
            first_piece,
            final_qc,
            post_external: None,
        }
    }

    #[test]
    fn production_requires_material_and_first_piece() {
        use QcGateStatus::*;
        assert!(!snapshot(Pending, Pending, Pending).production_allowed());
        assert!(!snapshot(Passed, Pending, Pending).production_allowed());
        assert!(!snapshot(Pending, Passed, Pending).production_allowed());
        assert!(snapshot(Passed, Passed, Pending).production_allowed());
        assert!(snapshot(Passed, Waived, Pending).production_allowed());
        assert!(snapshot(Waived, Waived, Pending).production_allowed());
        assert!(!snapshot(Failed, Passed, Pending).production_allowed());
    }

    #[test]
    fn dispatch_implies_production() {
        use QcGateStatus::*;
        // Final passed but upstream gates unmet: dispatch stays blocked.
        let s = snapshot(Pending, Pending, Passed);
        assert!(!s.production_allowed());
        assert!(!s.dispatch_allowed());

        let s = snapshot(Passed, Passed, Passed);
        assert!(s.dispatch_allowed());
        let s = snapshot(Passed, Waived, Waived);
        assert!(s.dispatch_allowed());
        let s = snapshot(Passed, Passed, Failed);
        assert!(s.production_allowed());
        assert!(!s.dispatch_allowed());
    }

    #[test]
    fn with_gate_overlays_only_the_submitted_gate() {
        use QcGateStatus::*;
        let s = snapshot(Passed, Pending, Pending).with_gate(QcType::FirstPiece, Waived);
        assert_eq!(s.material, Passed);
        assert_eq!(s.first_piece, Waived);
        assert!(s.production_allowed());

        let s = s.with_gate(QcType::PostExternal, Failed);
        assert_eq!(s.post_external, Some(Failed));
    }

    #[test]
    fn approved_quantity_floors_at_zero() {
        assert_eq!(approved_quantity(1000, 20), 980);
        assert_eq!(approved_quantity(480, 10), 470);
        assert_eq!(approved_quantity(5, 20), 0);
        assert_eq!(approved_quantity(0, 0), 0);
    }

    #[test]
    fn waiver_flattens_to_pass_with_reason() {
        let waived = QcOutcome::Waived {
            reason: "urgent override".into(),
        };
        assert_eq!(waived.stored_status(), QcGateStatus::Waived);
        assert_eq!(waived.stored_result(), QcResult::Pass);
        assert_eq!(waived.waive_reason(), Some("urgent override"));

        assert_eq!(QcOutcome::Pass.stored_result(), QcResult::Pass);
        assert_eq!(QcOutcome::Pass.waive_reason(), None);
        assert_eq!(QcOutcome::Fail.stored_result(), QcResult::Fail);
        assert_eq!(QcOutcome::Fail.stored_status(), QcGateStatus::Failed);
    }
}
