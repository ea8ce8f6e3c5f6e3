//! Reception and Release Management service
//!
//! Tracks R&R forms from goods reception to lot release and gates quality
//! checks on them. Host platform services (storage, chatter, reports) are
//! reached through the traits in [`ports`].

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod adapters;
pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod ports;
pub mod routes;
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Pool of the Postgres backend, `None` when running in memory
    pub db: Option<sqlx::PgPool>,
    pub ports: ports::Ports,
    pub config: Arc<Config>,
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/api/v1", routes::api_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn root() -> &'static str {
    "Reception and Release Management API v1"
}

async fn health_check() -> &'static str {
    "OK"
}
