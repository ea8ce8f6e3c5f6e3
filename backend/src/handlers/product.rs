//! Product HTTP handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::middleware::CurrentUser;
use crate::services::product::CreateProductInput;
use crate::services::ProductService;
use crate::AppState;

pub async fn get_product(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = ProductService::new(state.ports.clone());

    match service.get(product_id).await {
        Ok(product) => (StatusCode::OK, Json(product)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Create a product, numbering it when no code is given
pub async fn create_product(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(input): Json<CreateProductInput>,
) -> impl IntoResponse {
    let service = ProductService::new(state.ports.clone());

    match service.create(input).await {
        Ok(product) => (StatusCode::CREATED, Json(product)).into_response(),
        Err(e) => e.into_response(),
    }
}
