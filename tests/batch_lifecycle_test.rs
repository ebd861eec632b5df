//! Batch creation policy tests: idempotent reuse within the gap window,
//! gap-restart with linkage to the closed batch, and post-dispatch
//! follow-up batches.

mod common;

use chrono::{Duration, Utc};
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
use std::sync::Arc;
use uuid::Uuid;

use common::{closed_batch, event_channel, open_batch, production_log_row, test_work_order};
use shopfloor_api::{
    commands::{
        batches::GetOrCreateBatchCommand,
        Command,
    },
    entities::production_batch::{StageType, TriggerReason},
    errors::ServiceError,
    events::Event,
};

#[tokio::test]
async fn unknown_work_order_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![Vec::<shopfloor_api::entities::work_order::Model>::new()])
        .into_connection();
    let (events, _rx) = event_channel();

    let result = GetOrCreateBatchCommand {
        work_order_id: Uuid::new_v4(),
        gap_threshold_days: 7,
    }
    .execute(Arc::new(db), events)
    .await;

    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn zero_gap_threshold_is_rejected_before_any_read() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let (events, _rx) = event_channel();

    let result = GetOrCreateBatchCommand {
        work_order_id: Uuid::new_v4(),
        gap_threshold_days: 0,
    }
    .execute(Arc::new(db), events)
    .await;

    assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
}

#[tokio::test]
async fn open_batch_within_gap_window_is_reused() {
    let wo_id = Uuid::new_v4();
    let batch_id = Uuid::new_v4();
    let batch = open_batch(batch_id, wo_id, StageType::Production);

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![test_work_order(wo_id, 1000)]])
        .append_query_results(vec![vec![batch.clone()]])
        // Latest production event: yesterday, well inside the window.
        .append_query_results(vec![vec![production_log_row(batch_id, wo_id, 1)]])
        .into_connection();
    let (events, mut rx) = event_channel();

    let resolution = GetOrCreateBatchCommand {
        work_order_id: wo_id,
        gap_threshold_days: 7,
    }
    .execute(Arc::new(db), events)
    .await
    .expect("reuse should succeed");

    assert!(!resolution.created);
    assert_eq!(resolution.batch.id, batch_id);
    // Idempotent reuse emits no lifecycle events.
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn stale_open_batch_is_closed_and_restarted() {
    let wo_id = Uuid::new_v4();
    let old_id = Uuid::new_v4();
    let new_id = Uuid::new_v4();

    let mut stale = open_batch(old_id, wo_id, StageType::Production);
    stale.started_at = Utc::now() - Duration::days(12);

    let mut restarted = open_batch(new_id, wo_id, StageType::Cutting);
    restarted.batch_number = 2;
    restarted.trigger_reason = TriggerReason::GapRestart;
    restarted.previous_batch_id = Some(old_id);

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![test_work_order(wo_id, 1000)]])
        .append_query_results(vec![vec![stale.clone()]])
        // No production has ever been logged; the gap runs from started_at.
        .append_query_results(vec![Vec::<shopfloor_api::entities::production_log::Model>::new()])
        .append_exec_results(vec![MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        // Prior batches for the remaining-quantity default.
        .append_query_results(vec![vec![stale.clone()]])
        // Insert of the restarted batch.
        .append_query_results(vec![vec![restarted.clone()]])
        .into_connection();
    let (events, mut rx) = event_channel();

    let resolution = GetOrCreateBatchCommand {
        work_order_id: wo_id,
        gap_threshold_days: 7,
    }
    .execute(Arc::new(db), events)
    .await
    .expect("gap restart should succeed");

    assert!(resolution.created);
    assert_eq!(resolution.batch.trigger_reason, TriggerReason::GapRestart);
    assert_eq!(resolution.batch.previous_batch_id, Some(old_id));
    assert_eq!(resolution.batch.batch_number, 2);

    match rx.try_recv().expect("close event") {
        Event::BatchClosed { batch_id, .. } => assert_eq!(batch_id, old_id),
        other => panic!("expected BatchClosed, got {:?}", other),
    }
    match rx.try_recv().expect("create event") {
        Event::BatchCreated {
            batch_id,
            trigger_reason,
            ..
        } => {
            assert_eq!(batch_id, new_id);
            assert_eq!(trigger_reason, TriggerReason::GapRestart);
        }
        other => panic!("expected BatchCreated, got {:?}", other),
    }
}

#[tokio::test]
async fn recent_production_log_keeps_an_old_batch_alive() {
    let wo_id = Uuid::new_v4();
    let batch_id = Uuid::new_v4();
    // Started a month ago, but the line produced yesterday.
    let mut batch = open_batch(batch_id, wo_id, StageType::Production);
    batch.started_at = Utc::now() - Duration::days(30);

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![test_work_order(wo_id, 1000)]])
        .append_query_results(vec![vec![batch]])
        .append_query_results(vec![vec![production_log_row(batch_id, wo_id, 1)]])
        .into_connection();
    let (events, _rx) = event_channel();

    let resolution = GetOrCreateBatchCommand {
        work_order_id: wo_id,
        gap_threshold_days: 7,
    }
    .execute(Arc::new(db), events)
    .await
    .expect("reuse should succeed");

    assert!(!resolution.created);
    assert_eq!(resolution.batch.id, batch_id);
}

#[tokio::test]
async fn production_after_dispatch_starts_a_linked_batch() {
    let wo_id = Uuid::new_v4();
    let prior_id = Uuid::new_v4();
    let new_id = Uuid::new_v4();

    let prior = closed_batch(prior_id, wo_id);
    let mut follow_up = open_batch(new_id, wo_id, StageType::Cutting);
    follow_up.batch_number = 2;
    follow_up.trigger_reason = TriggerReason::PostDispatch;
    follow_up.previous_batch_id = Some(prior_id);

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![test_work_order(wo_id, 1000)]])
        // No open batch.
        .append_query_results(vec![Vec::<shopfloor_api::entities::production_batch::Model>::new()])
        .append_query_results(vec![vec![prior.clone()]])
        .append_query_results(vec![vec![prior]])
        .append_query_results(vec![vec![follow_up]])
        .into_connection();
    let (events, mut rx) = event_channel();

    let resolution = GetOrCreateBatchCommand {
        work_order_id: wo_id,
        gap_threshold_days: 7,
    }
    .execute(Arc::new(db), events)
    .await
    .expect("post-dispatch batch should be created");

    assert!(resolution.created);
    assert_eq!(resolution.batch.trigger_reason, TriggerReason::PostDispatch);
    assert_eq!(resolution.batch.previous_batch_id, Some(prior_id));

    match rx.try_recv().expect("create event") {
        Event::BatchCreated { trigger_reason, .. } => {
            assert_eq!(trigger_reason, TriggerReason::PostDispatch)
        }
        other => panic!("expected BatchCreated, got {:?}", other),
    }
}

#[tokio::test]
async fn first_batch_is_number_one_with_initial_trigger() {
    let wo_id = Uuid::new_v4();
    let new_id = Uuid::new_v4();
    let first = open_batch(new_id, wo_id, StageType::Cutting);

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![test_work_order(wo_id, 1000)]])
        .append_query_results(vec![Vec::<shopfloor_api::entities::production_batch::Model>::new()])
        .append_query_results(vec![Vec::<shopfloor_api::entities::production_batch::Model>::new()])
        .append_query_results(vec![Vec::<shopfloor_api::entities::production_batch::Model>::new()])
        .append_query_results(vec![vec![first]])
        .into_connection();
    let (events, mut rx) = event_channel();

    let resolution = GetOrCreateBatchCommand {
        work_order_id: wo_id,
        gap_threshold_days: 7,
    }
    .execute(Arc::new(db), events)
    .await
    .expect("initial batch should be created");

    assert!(resolution.created);
    assert_eq!(resolution.batch.batch_number, 1);
    assert_eq!(resolution.batch.trigger_reason, TriggerReason::Initial);
    assert!(matches!(
        rx.try_recv().expect("create event"),
        Event::BatchCreated { .. }
    ));
}
