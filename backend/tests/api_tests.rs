//! HTTP API tests
//!
//! Drives the router end to end with the in-memory store and a locally
//! signed token.

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Duration;
use common::{Fixture, WEB_BASE_URL};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use rnr_backend::config::{
    Config, DatabaseConfig, JwtConfig, LogFormat, LoggingConfig, PlatformConfig, ServerConfig,
    StorageBackend, StorageConfig,
};
use rnr_backend::middleware::issue_token;
use rnr_backend::models::{CriticalLevel, Lot};
use rnr_backend::{create_app, AppState};

const SECRET: &str = "test-secret";

fn config() -> Config {
    Config {
        environment: "test".to_string(),
        server: ServerConfig {
            port: 0,
            host: "127.0.0.1".to_string(),
        },
        storage: StorageConfig {
            backend: StorageBackend::Memory,
        },
        database: DatabaseConfig {
            url: String::new(),
            max_connections: 1,
            min_connections: 0,
        },
        jwt: JwtConfig {
            secret: SECRET.to_string(),
        },
        platform: PlatformConfig {
            api_endpoint: String::new(),
            api_key: String::new(),
            web_base_url: WEB_BASE_URL.to_string(),
            timeout_secs: 5,
        },
        logging: LoggingConfig {
            format: LogFormat::Text,
        },
    }
}

struct Api {
    fx: Fixture,
    app: Router,
    token: String,
}

impl Api {
    fn new() -> Self {
        let fx = Fixture::new();
        let app = create_app(AppState {
            db: None,
            ports: fx.ports.clone(),
            config: Arc::new(config()),
        });
        let token = issue_token(SECRET, &fx.actor(), Duration::hours(1)).unwrap();
        Self { fx, app, token }
    }

    async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token));
        let body = match body {
            Some(value) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn received_lot(&self, level: CriticalLevel) -> (Lot, uuid::Uuid) {
        let product = self.fx.product(level);
        let lot = self.fx.lot(&product, "5");
        let receipt = self.fx.receipt(&[(&lot, "5")]);
        (lot, receipt.picking.id)
    }
}

#[tokio::test]
async fn test_health_is_public() {
    let api = Api::new();
    let response = api
        .app
        .clone()
        .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let health: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(health["database"], "memory");
}

#[tokio::test]
async fn test_requests_without_token_are_rejected() {
    let api = Api::new();
    let response = api
        .app
        .clone()
        .oneshot(Request::get("/api/v1/forms").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_form_lifecycle_over_http() {
    let api = Api::new();
    let (lot, picking_id) = api.received_lot(CriticalLevel::Intermediary);

    let (status, counters) = api
        .call(
            Method::GET,
            &format!("/api/v1/pickings/{}/form-counters", picking_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(counters["count_lots_to_process"], 1);

    let (status, created) = api
        .call(
            Method::POST,
            &format!("/api/v1/pickings/{}/forms", picking_id),
            Some(json!({
                "form_type": "rc_without_qc",
                "lot_ids": [lot.id],
                "materials_conformity": "no",
                "reception_comment": "Seal broken on one box"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let form = &created[0];
    assert_eq!(form["status"], "confirmed");
    assert_eq!(form["reception"]["product_qty"], "5");
    assert_eq!(form["reception"]["reception_comment"], "Seal broken on one box");
    let form_id = form["id"].as_str().unwrap().to_string();

    let (status, sent) = api
        .call(
            Method::POST,
            &format!("/api/v1/forms/{}/send", form_id),
            Some(json!({})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sent["status"], "sent");
    assert_eq!(sent["receipt"]["user_name"], "Marie Curie");

    let (status, signed) = api
        .call(
            Method::POST,
            &format!("/api/v1/forms/{}/sign", form_id),
            Some(json!({ "lot_status": "rejected" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(signed["status"], "approved");
    assert_eq!(signed["release"]["lot_status"], "rejected");

    let (status, page) = api
        .call(
            Method::GET,
            &format!("/api/v1/forms?lot_id={}&status=approved", lot.id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(page["pagination"]["total_items"], 1);

    // Reception without QC never closes
    let (status, error) = api
        .call(
            Method::POST,
            &format!("/api/v1/forms/{}/close", form_id),
            Some(json!({ "reconciliation_consistency": "consistent" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["error"]["code"], "INVALID_STATE_TRANSITION");

    let (status, detail) = api
        .call(Method::GET, &format!("/api/v1/lots/{}", lot.id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["name"], lot.name.as_str());
    assert_eq!(detail["counters"]["reception_form_count"], 1);
}

#[tokio::test]
async fn test_blocked_check_reports_title() {
    let api = Api::new();
    let product = api.fx.product(CriticalLevel::Critical);
    let lot = api.fx.lot(&product, "5");
    let receipt = api.fx.receipt(&[(&lot, "5")]);
    let check = api.fx.check(&receipt, &product, false);

    let (status, error) = api
        .call(
            Method::POST,
            &format!("/api/v1/quality-checks/{}/pass", check.id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["error"]["code"], "PROCESSING_BLOCKED");
    assert_eq!(error["error"]["title"], "Unable to process Quality Checks");
}

#[tokio::test]
async fn test_form_action_crud_over_http() {
    let api = Api::new();
    let body = json!({
        "form_type": "rc_with_qc",
        "action": "notify",
        "form_state": "closed",
    });

    let (status, created) = api
        .call(Method::POST, "/api/v1/form-actions", Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["sequence"], 10);

    let (status, error) = api
        .call(Method::POST, "/api/v1/form-actions", Some(body))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["error"]["code"], "CONFLICT");

    let id = created["id"].as_str().unwrap();
    let (status, _) = api
        .call(Method::DELETE, &format!("/api/v1/form-actions/{}", id), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, list) = api.call(Method::GET, "/api/v1/form-actions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn test_product_codes_are_allocated() {
    let api = Api::new();
    let category = api.fx.product(CriticalLevel::Furniture).category_id;

    let (status, product) = api
        .call(
            Method::POST,
            "/api/v1/products",
            Some(json!({ "name": "Surgical drape", "category_id": category })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(product["default_code"], "P000001");

    let (status, error) = api
        .call(
            Method::POST,
            "/api/v1/products",
            Some(json!({ "name": "", "category_id": category })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"]["field"], "name");
}
