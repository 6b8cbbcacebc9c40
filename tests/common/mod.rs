//! Common test utilities and fixtures for integration tests

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use request_authz::server::{build_router, AppState};
use request_authz::AuthContextConfig;

/// Test caller
pub const TEST_USER_ID: &str = "user-1";
pub const TEST_TENANT_ID: &str = "tenant-1";
pub const TEST_ORG_UNIT_ID: &str = "org-1";

/// Full application with default header mapping.
pub fn test_app() -> Router {
    build_router(AuthContextConfig::default(), AppState::new()).unwrap()
}

/// Request builder carrying the test caller's identity headers.
pub fn authed(method: &str, uri: &str, grants: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("X-User-Id", TEST_USER_ID)
        .header("X-Tenant-Id", TEST_TENANT_ID)
        .header("X-Org-Unit-Id", TEST_ORG_UNIT_ID)
        .header("X-Permissions", grants)
}

pub fn json_body(value: &Value) -> Body {
    Body::from(serde_json::to_vec(value).unwrap())
}

/// Send a request and return status, `x-error-code` header, and raw body.
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Option<String>, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let error_code = response
        .headers()
        .get("x-error-code")
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, error_code, body)
}

/// Send a request and parse the body as JSON (`Null` when empty).
pub async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, _, body) = send(app, request).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, value)
}
