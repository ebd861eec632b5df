use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    errors::ServiceError,
    handlers::AppState,
    models::wip::{ExternalProcessWip, PartnerWip},
};

#[derive(Debug, Serialize, ToSchema)]
pub struct ExternalWipResponse {
    pub processes: Vec<ExternalProcessWip>,
    pub partners: Vec<PartnerWip>,
}

pub fn wip_router() -> Router<AppState> {
    Router::new()
        .route("/", get(full_snapshot))
        .route("/stages", get(stage_summary))
        .route("/external", get(external_summary))
        .route("/refresh", get(force_refresh))
}

/// Complete WIP snapshot: stages plus external processes and partners.
async fn full_snapshot(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let snapshot = state.services.wip.snapshot().await?;
    Ok(Json(snapshot))
}

async fn stage_summary(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let snapshot = state.services.wip.snapshot().await?;
    Ok(Json(snapshot.stages))
}

async fn external_summary(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let snapshot = state.services.wip.snapshot().await?;
    Ok(Json(ExternalWipResponse {
        processes: snapshot.external_processes,
        partners: snapshot.partners,
    }))
}

/// Explicit recompute, for callers that cannot wait for the change feed.
async fn force_refresh(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let snapshot = state.services.wip.refresh().await?;
    Ok(Json(snapshot))
}
