//! R&R form HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use shared::Pagination;
use uuid::Uuid;

use crate::middleware::CurrentUser;
use crate::models::ReceptionFormChanges;
use crate::ports::FormFilter;
use crate::services::reception_form::{
    CloseFormInput, FormQuery, SendFormInput, SignFormInput,
};
use crate::services::ReceptionFormService;
use crate::AppState;

/// Page parameters of list endpoints
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl From<PageQuery> for Pagination {
    fn from(query: PageQuery) -> Self {
        let default = Pagination::default();
        Pagination {
            page: query.page.unwrap_or(default.page),
            per_page: query.per_page.unwrap_or(default.per_page).min(100),
        }
    }
}

/// List forms, filtered by lot, transfer, parent, check, status or type
pub async fn list_forms(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<FormQuery>,
    Query(page): Query<PageQuery>,
) -> impl IntoResponse {
    let service = ReceptionFormService::new(state.ports.clone());
    let filter = FormFilter::from(query);

    match service.list(&filter, &page.into()).await {
        Ok(forms) => (StatusCode::OK, Json(forms)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_form(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(form_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = ReceptionFormService::new(state.ports.clone());

    match service.get(form_id).await {
        Ok(form) => (StatusCode::OK, Json(form)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Edit the content of an editable form
pub async fn update_form(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(form_id): Path<Uuid>,
    Json(changes): Json<ReceptionFormChanges>,
) -> impl IntoResponse {
    let service = ReceptionFormService::new(state.ports.clone());

    match service.update_form(&actor, form_id, changes).await {
        Ok(form) => (StatusCode::OK, Json(form)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn confirm_form(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(form_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = ReceptionFormService::new(state.ports.clone());

    match service.confirm(&actor, form_id).await {
        Ok(form) => (StatusCode::OK, Json(form)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Send a form to the quality team
pub async fn send_form(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(form_id): Path<Uuid>,
    Json(input): Json<SendFormInput>,
) -> impl IntoResponse {
    let service = ReceptionFormService::new(state.ports.clone());

    match service.send(&actor, form_id, input.notify).await {
        Ok(form) => (StatusCode::OK, Json(form)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Sign a sent form, recording the lot outcome
pub async fn sign_form(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(form_id): Path<Uuid>,
    Json(input): Json<SignFormInput>,
) -> impl IntoResponse {
    let service = ReceptionFormService::new(state.ports.clone());

    match service.sign(&actor, form_id, input.lot_status).await {
        Ok(form) => (StatusCode::OK, Json(form)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Quantities to reconcile before closing
pub async fn closing_summary(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(form_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = ReceptionFormService::new(state.ports.clone());

    match service.closing_summary(form_id).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn close_form(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(form_id): Path<Uuid>,
    Json(input): Json<CloseFormInput>,
) -> impl IntoResponse {
    let service = ReceptionFormService::new(state.ports.clone());

    match service.close(&actor, form_id, input).await {
        Ok(form) => (StatusCode::OK, Json(form)).into_response(),
        Err(e) => e.into_response(),
    }
}
