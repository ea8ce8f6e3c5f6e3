//! Transfer HTTP handlers: R&R counters and the form wizard

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::middleware::CurrentUser;
use crate::models::FormType;
use crate::services::form_wizard::{CreateFormsInput, ValidateFormsInput, WizardMode};
use crate::services::{CounterService, FormWizardService};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct WizardQuery {
    pub mode: WizardMode,
}

#[derive(Debug, Deserialize)]
pub struct AvailableLotsQuery {
    pub form_type: FormType,
}

pub async fn picking_counters(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(picking_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = CounterService::new(state.ports.clone());

    match service.picking_counters(picking_id).await {
        Ok(counters) => (StatusCode::OK, Json(counters)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Lots the wizard opens with, to process or to validate
pub async fn wizard_lots(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(picking_id): Path<Uuid>,
    Query(query): Query<WizardQuery>,
) -> impl IntoResponse {
    let service = FormWizardService::new(state.ports.clone());

    match service.wizard_lots(picking_id, query.mode).await {
        Ok(lots) => (StatusCode::OK, Json(lots)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn available_lots(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(picking_id): Path<Uuid>,
    Query(query): Query<AvailableLotsQuery>,
) -> impl IntoResponse {
    let service = FormWizardService::new(state.ports.clone());

    match service.available_lots(picking_id, query.form_type).await {
        Ok(lots) => (StatusCode::OK, Json(lots)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Create one form per selected lot of the transfer
pub async fn create_forms(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(picking_id): Path<Uuid>,
    Json(input): Json<CreateFormsInput>,
) -> impl IntoResponse {
    let service = FormWizardService::new(state.ports.clone());

    match service.create_forms(&actor, picking_id, input).await {
        Ok(forms) => (StatusCode::CREATED, Json(forms)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Sign several sent forms at once
pub async fn validate_forms(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(input): Json<ValidateFormsInput>,
) -> impl IntoResponse {
    let service = FormWizardService::new(state.ports.clone());

    match service.validate_forms(&actor, input).await {
        Ok(forms) => (StatusCode::OK, Json(forms)).into_response(),
        Err(e) => e.into_response(),
    }
}
