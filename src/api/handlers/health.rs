//! Unauthenticated service endpoints: liveness, metrics export, and the route
//! catalogue. All three sit under the default exempt prefixes.

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::api::{route_requirements, RouteRequirement};
use crate::server::AppState;

/// Response for the basic health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    /// RFC 3339 timestamp of the check
    pub timestamp: String,
}

/// Response for the route catalogue
#[derive(Debug, Serialize)]
pub struct DocsResponse {
    pub service: &'static str,
    pub routes: Vec<RouteRequirement>,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Prometheus text exposition.
pub async fn metrics_export(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.to_prometheus().await,
    )
}

/// Every protected route with the permission it demands.
pub async fn route_docs() -> Json<DocsResponse> {
    Json(DocsResponse {
        service: env!("CARGO_PKG_NAME"),
        routes: route_requirements(),
    })
}
