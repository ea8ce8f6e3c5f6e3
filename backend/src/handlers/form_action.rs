//! Form action configuration HTTP handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::middleware::CurrentUser;
use crate::services::form_action::FormActionInput;
use crate::services::FormActionService;
use crate::AppState;

pub async fn list_form_actions(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> impl IntoResponse {
    let service = FormActionService::new(state.ports.clone());

    match service.list(&actor).await {
        Ok(actions) => (StatusCode::OK, Json(actions)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_form_action(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(action_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = FormActionService::new(state.ports.clone());

    match service.get(&actor, action_id).await {
        Ok(action) => (StatusCode::OK, Json(action)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn create_form_action(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(input): Json<FormActionInput>,
) -> impl IntoResponse {
    let service = FormActionService::new(state.ports.clone());

    match service.create(&actor, input).await {
        Ok(action) => (StatusCode::CREATED, Json(action)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn update_form_action(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(action_id): Path<Uuid>,
    Json(input): Json<FormActionInput>,
) -> impl IntoResponse {
    let service = FormActionService::new(state.ports.clone());

    match service.update(&actor, action_id, input).await {
        Ok(action) => (StatusCode::OK, Json(action)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn delete_form_action(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(action_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = FormActionService::new(state.ports.clone());

    match service.delete(&actor, action_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}
