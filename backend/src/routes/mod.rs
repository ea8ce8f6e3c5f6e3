//! Route definitions for the Reception and Release Management service

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        .nest("/forms", form_routes(state.clone()))
        .nest("/pickings", picking_routes(state.clone()))
        .nest("/lots", lot_routes(state.clone()))
        .nest("/quality-checks", quality_check_routes(state.clone()))
        .nest("/form-actions", form_action_routes(state.clone()))
        .nest("/products", product_routes(state.clone()))
        .nest("/employees", employee_routes(state))
}

/// R&R form routes (protected)
fn form_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_forms))
        .route("/validate", post(handlers::validate_forms))
        .route(
            "/:form_id",
            get(handlers::get_form).patch(handlers::update_form),
        )
        .route("/:form_id/confirm", post(handlers::confirm_form))
        .route("/:form_id/send", post(handlers::send_form))
        .route("/:form_id/sign", post(handlers::sign_form))
        .route("/:form_id/closing-summary", get(handlers::closing_summary))
        .route("/:form_id/close", post(handlers::close_form))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Transfer routes (protected)
fn picking_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/:picking_id/form-counters", get(handlers::picking_counters))
        .route("/:picking_id/wizard-lots", get(handlers::wizard_lots))
        .route("/:picking_id/available-lots", get(handlers::available_lots))
        .route("/:picking_id/forms", post(handlers::create_forms))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Lot routes (protected)
fn lot_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/:lot_id", get(handlers::get_lot))
        .route("/:lot_id/forms", get(handlers::lot_forms))
        .route("/:lot_id/coa", put(handlers::update_coa))
        .route("/:lot_id/refresh-arrival", post(handlers::refresh_arrival))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Quality check routes (protected)
fn quality_check_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/:check_id",
            get(handlers::get_check).patch(handlers::update_check),
        )
        .route("/:check_id/pass", post(handlers::pass_check))
        .route("/:check_id/fail", post(handlers::fail_check))
        .route("/:check_id/measure", post(handlers::measure_check))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Lock and notify action configuration (protected)
fn form_action_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_form_actions).post(handlers::create_form_action),
        )
        .route(
            "/:action_id",
            get(handlers::get_form_action)
                .put(handlers::update_form_action)
                .delete(handlers::delete_form_action),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Product routes (protected)
fn product_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_product))
        .route("/:product_id", get(handlers::get_product))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Employee routes (protected)
fn employee_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/:employee_id",
            get(handlers::get_employee).put(handlers::save_employee),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
