use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    commands::batches::{
        MoveBatchToStageCommand, QcResultInput, RecordProductionCommand, SubmitBatchQcCommand,
        UpdateBatchQuantityCommand, UpdateBatchStatusCommand,
    },
    entities::production_batch::{BatchStatus, StageType},
    entities::qc_record::QcType,
    errors::ServiceError,
    handlers::AppState,
};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ResolveBatchRequest {
    /// Override of the configured gap threshold, in days.
    pub gap_threshold_days: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitQcRequest {
    pub qc_type: QcType,
    pub result: QcResultInput,
    pub waive_reason: Option<String>,
    pub remarks: Option<String>,
    pub inspected_quantity: Option<i32>,
    pub instrument_id: Option<Uuid>,
    pub approved_by: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MoveStageRequest {
    pub new_stage: StageType,
    pub new_status: Option<BatchStatus>,
    pub external_process_type: Option<String>,
    pub external_partner_id: Option<Uuid>,
    pub requires_qc_on_return: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: BatchStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateQuantityRequest {
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordProductionRequest {
    pub quantity: i32,
    #[serde(default)]
    pub rejected_qty: i32,
    pub logged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListBatchesParams {
    /// Include closed batches; defaults to active only.
    #[serde(default)]
    pub include_closed: bool,
}

pub fn work_orders_router() -> Router<AppState> {
    Router::new()
        .route("/:id/batches", get(list_work_order_batches))
        .route("/:id/batches/resolve", post(resolve_batch))
        .route("/:id/qc/history", get(work_order_qc_history))
}

pub fn batches_router() -> Router<AppState> {
    Router::new()
        .route("/:id/qc", post(submit_qc).get(batch_qc_data))
        .route("/:id/qc/history", get(batch_qc_history))
        .route("/:id/stage", post(move_to_stage))
        .route("/:id/status", put(update_status))
        .route("/:id/quantity", put(update_quantity))
        .route("/:id/production", post(record_production))
}

async fn resolve_batch(
    State(state): State<AppState>,
    Path(work_order_id): Path<Uuid>,
    Json(req): Json<ResolveBatchRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let resolution = state
        .services
        .batches
        .get_or_create_batch(work_order_id, req.gap_threshold_days)
        .await?;
    let status = if resolution.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(resolution)))
}

async fn list_work_order_batches(
    State(state): State<AppState>,
    Path(work_order_id): Path<Uuid>,
    Query(params): Query<ListBatchesParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let batches = state
        .services
        .batches
        .work_order_batches(work_order_id, params.include_closed)
        .await?;
    Ok(Json(batches))
}

async fn work_order_qc_history(
    State(state): State<AppState>,
    Path(work_order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let records = state
        .services
        .batches
        .work_order_qc_history(work_order_id)
        .await?;
    Ok(Json(records))
}

async fn submit_qc(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
    Json(req): Json<SubmitQcRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let outcome = state
        .services
        .batches
        .submit_qc(SubmitBatchQcCommand {
            batch_id,
            qc_type: req.qc_type,
            result: req.result,
            waive_reason: req.waive_reason,
            remarks: req.remarks,
            inspected_quantity: req.inspected_quantity,
            instrument_id: req.instrument_id,
            approved_by: req.approved_by,
        })
        .await?;
    Ok(Json(outcome))
}

async fn batch_qc_data(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let data = state.services.batches.batch_qc_data(batch_id).await?;
    Ok(Json(data))
}

async fn batch_qc_history(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let records = state.services.batches.batch_qc_history(batch_id).await?;
    Ok(Json(records))
}

async fn move_to_stage(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
    Json(req): Json<MoveStageRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let batch = state
        .services
        .batches
        .move_to_stage(MoveBatchToStageCommand {
            batch_id,
            new_stage: req.new_stage,
            new_status: req.new_status,
            external_process_type: req.external_process_type,
            external_partner_id: req.external_partner_id,
            requires_qc_on_return: req.requires_qc_on_return,
        })
        .await?;
    Ok(Json(batch))
}

async fn update_status(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let batch = state
        .services
        .batches
        .update_status(UpdateBatchStatusCommand {
            batch_id,
            new_status: req.status,
        })
        .await?;
    Ok(Json(batch))
}

async fn update_quantity(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
    Json(req): Json<UpdateQuantityRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let batch = state
        .services
        .batches
        .update_quantity(UpdateBatchQuantityCommand {
            batch_id,
            quantity: req.quantity,
        })
        .await?;
    Ok(Json(batch))
}

async fn record_production(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
    Json(req): Json<RecordProductionRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let outcome = state
        .services
        .batches
        .record_production(RecordProductionCommand {
            batch_id,
            quantity: req.quantity,
            rejected_qty: req.rejected_qty,
            logged_at: req.logged_at,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}
