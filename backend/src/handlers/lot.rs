//! Lot HTTP handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::middleware::CurrentUser;
use crate::models::CoaSheet;
use crate::services::LotService;
use crate::AppState;

/// Get a lot with its R&R counters
pub async fn get_lot(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(lot_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = LotService::new(state.ports.clone());

    match service.get(lot_id).await {
        Ok(lot) => (StatusCode::OK, Json(lot)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn lot_forms(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(lot_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = LotService::new(state.ports.clone());

    match service.forms(lot_id).await {
        Ok(forms) => (StatusCode::OK, Json(forms)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Replace the certificate of analysis values of a lot
pub async fn update_coa(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(lot_id): Path<Uuid>,
    Json(coa): Json<CoaSheet>,
) -> impl IntoResponse {
    let service = LotService::new(state.ports.clone());

    match service.update_coa(lot_id, coa).await {
        Ok(lot) => (StatusCode::OK, Json(lot)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Recompute arrival date and vendor from the latest receipt
pub async fn refresh_arrival(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(lot_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = LotService::new(state.ports.clone());

    match service.refresh_arrival(lot_id).await {
        Ok(lot) => (StatusCode::OK, Json(lot)).into_response(),
        Err(e) => e.into_response(),
    }
}
