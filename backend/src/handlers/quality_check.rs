//! Quality check HTTP handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::middleware::CurrentUser;
use crate::models::QualityCheckChanges;
use crate::services::QualityCheckService;
use crate::AppState;

/// Get a check with its parent form and tested quantity
pub async fn get_check(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(check_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = QualityCheckService::new(state.ports.clone());

    match service.detail(check_id).await {
        Ok(detail) => (StatusCode::OK, Json(detail)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn update_check(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(check_id): Path<Uuid>,
    Json(changes): Json<QualityCheckChanges>,
) -> impl IntoResponse {
    let service = QualityCheckService::new(state.ports.clone());

    match service.update_check(&actor, check_id, changes).await {
        Ok(check) => (StatusCode::OK, Json(check)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn pass_check(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(check_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = QualityCheckService::new(state.ports.clone());

    match service.pass(&actor, check_id).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn fail_check(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(check_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = QualityCheckService::new(state.ports.clone());

    match service.fail(&actor, check_id).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Record a measure after the form guards
pub async fn measure_check(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(check_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = QualityCheckService::new(state.ports.clone());

    match service.measure(&actor, check_id).await {
        Ok(check) => (StatusCode::OK, Json(check)).into_response(),
        Err(e) => e.into_response(),
    }
}
