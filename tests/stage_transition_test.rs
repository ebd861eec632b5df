//! Stage transition manager tests: the allowed-edge table, external field
//! handling, the narrow status/quantity siblings, and production
//! recording with its best-effort mirrored totals.

mod common;

use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
use std::sync::Arc;
use uuid::Uuid;

use common::{closed_batch, event_channel, open_batch, production_log_row};
use shopfloor_api::{
    commands::{
        batches::{
            MoveBatchToStageCommand, RecordProductionCommand, UpdateBatchQuantityCommand,
            UpdateBatchStatusCommand,
        },
        Command,
    },
    entities::production_batch::{BatchStatus, StageType},
    errors::ServiceError,
    events::Event,
};

fn ok_exec() -> MockExecResult {
    MockExecResult {
        last_insert_id: 0,
        rows_affected: 1,
    }
}

fn move_to(batch_id: Uuid, new_stage: StageType) -> MoveBatchToStageCommand {
    MoveBatchToStageCommand {
        batch_id,
        new_stage,
        new_status: None,
        external_process_type: None,
        external_partner_id: None,
        requires_qc_on_return: None,
    }
}

#[tokio::test]
async fn skipping_the_pipeline_is_rejected() {
    let wo_id = Uuid::new_v4();
    let batch_id = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![open_batch(batch_id, wo_id, StageType::Cutting)]])
        .into_connection();
    let (events, _rx) = event_channel();

    let result = move_to(batch_id, StageType::Dispatched)
        .execute(Arc::new(db), events)
        .await;
    assert!(matches!(result, Err(ServiceError::InvalidOperation(_))));
}

#[tokio::test]
async fn closed_batches_cannot_move() {
    let wo_id = Uuid::new_v4();
    let batch_id = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![closed_batch(batch_id, wo_id)]])
        .into_connection();
    let (events, _rx) = event_channel();

    let result = move_to(batch_id, StageType::Production)
        .execute(Arc::new(db), events)
        .await;
    assert!(matches!(result, Err(ServiceError::InvalidOperation(_))));
}

#[tokio::test]
async fn moving_to_external_sets_the_external_fields() {
    let wo_id = Uuid::new_v4();
    let batch_id = Uuid::new_v4();
    let partner_id = Uuid::new_v4();
    let batch = open_batch(batch_id, wo_id, StageType::Production);

    let mut updated = batch.clone();
    updated.stage_type = StageType::External;
    updated.external_process_type = Some("Plating".to_string());
    updated.external_partner_id = Some(partner_id);
    updated.requires_qc_on_return = true;

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![batch]])
        .append_exec_results(vec![ok_exec()])
        .append_query_results(vec![vec![updated]])
        .into_connection();
    let (events, mut rx) = event_channel();

    let mut command = move_to(batch_id, StageType::External);
    command.external_process_type = Some("Plating".to_string());
    command.external_partner_id = Some(partner_id);
    command.requires_qc_on_return = Some(true);

    let moved = command
        .execute(Arc::new(db), events)
        .await
        .expect("move to external should succeed");

    assert_eq!(moved.stage_type, StageType::External);
    assert_eq!(moved.external_process_type.as_deref(), Some("Plating"));
    assert_eq!(moved.external_partner_id, Some(partner_id));
    assert!(moved.requires_qc_on_return);

    match rx.try_recv().expect("stage event") {
        Event::BatchStageChanged { from, to, .. } => {
            assert_eq!(from, StageType::Production);
            assert_eq!(to, StageType::External);
        }
        other => panic!("expected BatchStageChanged, got {:?}", other),
    }
}

#[tokio::test]
async fn leaving_external_clears_process_and_partner() {
    let wo_id = Uuid::new_v4();
    let batch_id = Uuid::new_v4();
    let mut batch = open_batch(batch_id, wo_id, StageType::External);
    batch.external_process_type = Some("Plating".to_string());
    batch.external_partner_id = Some(Uuid::new_v4());

    let mut updated = batch.clone();
    updated.stage_type = StageType::Qc;
    updated.external_process_type = None;
    updated.external_partner_id = None;

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![batch]])
        .append_exec_results(vec![ok_exec()])
        .append_query_results(vec![vec![updated]])
        .into_connection();
    let (events, _rx) = event_channel();

    let moved = move_to(batch_id, StageType::Qc)
        .execute(Arc::new(db), events)
        .await
        .expect("move back from external should succeed");

    assert_eq!(moved.stage_type, StageType::Qc);
    assert!(moved.external_process_type.is_none());
    assert!(moved.external_partner_id.is_none());
}

#[tokio::test]
async fn concurrent_stage_moves_conflict() {
    let wo_id = Uuid::new_v4();
    let batch_id = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![open_batch(batch_id, wo_id, StageType::Production)]])
        .append_exec_results(vec![MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();
    let (events, _rx) = event_channel();

    let result = move_to(batch_id, StageType::Qc)
        .execute(Arc::new(db), events)
        .await;
    assert!(matches!(
        result,
        Err(ServiceError::ConcurrentModification(id)) if id == batch_id
    ));
}

#[tokio::test]
async fn status_update_touches_only_the_status() {
    let wo_id = Uuid::new_v4();
    let batch_id = Uuid::new_v4();
    let batch = open_batch(batch_id, wo_id, StageType::Production);

    let mut updated = batch.clone();
    updated.batch_status = BatchStatus::Completed;

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![batch]])
        .append_exec_results(vec![ok_exec()])
        .append_query_results(vec![vec![updated]])
        .into_connection();
    let (events, mut rx) = event_channel();

    let result = UpdateBatchStatusCommand {
        batch_id,
        new_status: BatchStatus::Completed,
    }
    .execute(Arc::new(db), events)
    .await
    .expect("status update should succeed");

    assert_eq!(result.batch_status, BatchStatus::Completed);
    assert_eq!(result.stage_type, StageType::Production);
    assert!(matches!(
        rx.try_recv().expect("status event"),
        Event::BatchStatusChanged { .. }
    ));
}

#[tokio::test]
async fn negative_quantity_is_rejected_before_any_read() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let (events, _rx) = event_channel();

    let result = UpdateBatchQuantityCommand {
        batch_id: Uuid::new_v4(),
        quantity: -5,
    }
    .execute(Arc::new(db), events)
    .await;
    assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
}

#[tokio::test]
async fn production_event_is_recorded_with_mirrored_totals() {
    let wo_id = Uuid::new_v4();
    let batch_id = Uuid::new_v4();
    let batch = open_batch(batch_id, wo_id, StageType::Production);
    let log = production_log_row(batch_id, wo_id, 0);
    let log_id = log.id;

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![batch]])
        .append_query_results(vec![vec![log]])
        .append_exec_results(vec![ok_exec()])
        .into_connection();
    let (events, mut rx) = event_channel();

    let outcome = RecordProductionCommand {
        batch_id,
        quantity: 120,
        rejected_qty: 2,
        logged_at: None,
    }
    .execute(Arc::new(db), events)
    .await
    .expect("production should be recorded");

    assert_eq!(outcome.log_id, log_id);
    assert!(outcome.totals_mirrored);
    assert!(matches!(
        rx.try_recv().expect("production event"),
        Event::ProductionRecorded { .. }
    ));
}

#[tokio::test]
async fn failed_total_mirror_still_records_the_event() {
    let wo_id = Uuid::new_v4();
    let batch_id = Uuid::new_v4();
    let batch = open_batch(batch_id, wo_id, StageType::Production);
    let log = production_log_row(batch_id, wo_id, 0);

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![batch]])
        .append_query_results(vec![vec![log]])
        // Another writer bumped the version between load and mirror.
        .append_exec_results(vec![MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();
    let (events, _rx) = event_channel();

    let outcome = RecordProductionCommand {
        batch_id,
        quantity: 50,
        rejected_qty: 0,
        logged_at: None,
    }
    .execute(Arc::new(db), events)
    .await
    .expect("log append must survive a failed mirror");

    assert!(!outcome.totals_mirrored);
}
