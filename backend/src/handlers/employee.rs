//! Employee HTTP handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::middleware::CurrentUser;
use crate::services::employee::EmployeeInput;
use crate::services::EmployeeService;
use crate::AppState;

pub async fn get_employee(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(employee_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = EmployeeService::new(state.ports.clone());

    match service.get(employee_id).await {
        Ok(employee) => (StatusCode::OK, Json(employee)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Create or update an employee and its trigram
pub async fn save_employee(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(employee_id): Path<Uuid>,
    Json(input): Json<EmployeeInput>,
) -> impl IntoResponse {
    let service = EmployeeService::new(state.ports.clone());

    match service.save(employee_id, input).await {
        Ok(employee) => (StatusCode::OK, Json(employee)).into_response(),
        Err(e) => e.into_response(),
    }
}
