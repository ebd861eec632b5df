//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use chrono::{Duration, Utc};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use shopfloor_api::entities::{
    instrument,
    production_batch::{self, BatchStatus, QcGateStatus, StageType, TriggerReason},
    production_log, qc_record,
    qc_record::{QcResult, QcType},
    work_order,
};
use shopfloor_api::events::{Event, EventSender};

/// EventSender wired to an in-memory channel so tests can assert on the
/// events a command emitted.
pub fn event_channel() -> (Arc<EventSender>, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(16);
    (Arc::new(EventSender::new(tx)), rx)
}

pub fn test_work_order(id: Uuid, quantity: i32) -> work_order::Model {
    let now = Utc::now();
    work_order::Model {
        id,
        order_number: "WO-1001".to_string(),
        customer: Some("Acme Industries".to_string()),
        item_code: Some("ITM-42".to_string()),
        quantity,
        due_date: Some(now + Duration::days(30)),
        gross_weight_per_pc: None,
        created_at: now - Duration::days(10),
        updated_at: now,
    }
}

/// An open batch in the given stage with all gates pending.
pub fn open_batch(id: Uuid, work_order_id: Uuid, stage: StageType) -> production_batch::Model {
    let now = Utc::now();
    production_batch::Model {
        id,
        work_order_id,
        batch_number: 1,
        trigger_reason: TriggerReason::Initial,
        previous_batch_id: None,
        started_at: now - Duration::days(2),
        ended_at: None,
        stage_type: stage,
        batch_status: BatchStatus::InProgress,
        stage_entered_at: now - Duration::hours(4),
        external_process_type: None,
        external_partner_id: None,
        external_sent_at: None,
        external_returned_at: None,
        requires_qc_on_return: false,
        post_external_qc_status: None,
        batch_quantity: 500,
        produced_qty: 0,
        qc_rejected_qty: 0,
        qc_approved_qty: 0,
        qc_material_status: QcGateStatus::Pending,
        qc_material_approved_by: None,
        qc_material_approved_at: None,
        qc_first_piece_status: QcGateStatus::Pending,
        qc_first_piece_approved_by: None,
        qc_first_piece_approved_at: None,
        qc_final_status: QcGateStatus::Pending,
        qc_final_approved_by: None,
        qc_final_approved_at: None,
        production_allowed: false,
        dispatch_allowed: false,
        row_version: 3,
        created_at: now - Duration::days(2),
        updated_at: now,
    }
}

pub fn closed_batch(id: Uuid, work_order_id: Uuid) -> production_batch::Model {
    let mut batch = open_batch(id, work_order_id, StageType::Dispatched);
    batch.ended_at = Some(Utc::now() - Duration::days(1));
    batch
}

pub fn valid_instrument(id: Uuid) -> instrument::Model {
    let now = Utc::now();
    instrument::Model {
        id,
        name: "Height gauge".to_string(),
        serial_number: Some("HG-009".to_string()),
        calibration_due: (now + Duration::days(90)).date_naive(),
        created_at: now - Duration::days(300),
        updated_at: now,
    }
}

pub fn overdue_instrument(id: Uuid) -> instrument::Model {
    let mut instrument = valid_instrument(id);
    instrument.calibration_due = (Utc::now() - Duration::days(5)).date_naive();
    instrument
}

pub fn production_log_row(
    batch_id: Uuid,
    work_order_id: Uuid,
    days_ago: i64,
) -> production_log::Model {
    let now = Utc::now();
    production_log::Model {
        id: Uuid::new_v4(),
        batch_id,
        work_order_id,
        quantity: 120,
        rejected_qty: 2,
        logged_at: now - Duration::days(days_ago),
        created_at: now - Duration::days(days_ago),
    }
}

pub fn qc_record_row(batch_id: Uuid, work_order_id: Uuid, qc_type: QcType) -> qc_record::Model {
    let now = Utc::now();
    qc_record::Model {
        id: Uuid::new_v4(),
        batch_id: Some(batch_id),
        work_order_id,
        qc_type,
        result: QcResult::Pass,
        inspected_quantity: Some(10),
        waive_reason: None,
        remarks: None,
        approved_by: Some(Uuid::new_v4()),
        approved_at: now,
        created_at: now,
    }
}
