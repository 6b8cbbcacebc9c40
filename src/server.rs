//! HTTP server bootstrap.
//!
//! This module wires together:
//! - configuration
//! - the auth context layer and per-route permission gates
//! - outcome metrics and request tracing
//! - the Axum router

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::http::{HeaderName, HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::auth::{auth_context_middleware, AuthContextConfig};
use crate::metrics::{track_auth_outcomes, MetricsRegistry};
use crate::telemetry::{init_telemetry, TelemetryConfig};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server listen address.
    pub listen_addr: SocketAddr,
    /// Identity header mapping and exempt paths.
    pub auth: AuthContextConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let listen_addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .with_context(|| format!("invalid listen address {host}:{port}"))?;

        Ok(Self {
            listen_addr,
            auth: AuthContextConfig::from_env(),
        })
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub metrics: Arc<MetricsRegistry>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            metrics: Arc::new(MetricsRegistry::new()),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Start the HTTP server.
pub async fn run() -> anyhow::Result<()> {
    let telemetry = TelemetryConfig::from_env();
    init_telemetry(&telemetry)?;

    info!(
        "Starting {} v{}",
        telemetry.service_name, telemetry.service_version
    );

    let config = Config::from_env()?;
    info!("Configuration loaded");
    info!("  Listen address: {}", config.listen_addr);
    info!("  Exempt paths: {:?}", config.auth.ignore_paths);
    info!(
        "  Identity headers: {}, {}, {}, {}",
        config.auth.header_user_id,
        config.auth.header_tenant_id,
        config.auth.header_org_unit_id,
        config.auth.header_permissions
    );

    let state = AppState::new();
    let app = build_router(config.auth.clone(), state)?;

    info!("Starting HTTP server on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}

/// Assemble the full application: service endpoints, protected API, the auth
/// context layer, outcome metrics, tracing and optional CORS.
pub fn build_router(auth: AuthContextConfig, state: AppState) -> anyhow::Result<Router> {
    let metrics = state.metrics.clone();

    let mut router = Router::new()
        .merge(crate::api::service_router())
        .merge(crate::api::router())
        .layer(from_fn_with_state(Arc::new(auth.clone()), auth_context_middleware))
        .layer(from_fn_with_state(metrics, track_auth_outcomes))
        .layer(TraceLayer::new_for_http());

    if let Some(cors_layer) = cors_layer_from_env(&auth)? {
        router = router.layer(cors_layer);
    }

    Ok(router.with_state(state))
}

fn cors_layer_from_env(auth: &AuthContextConfig) -> anyhow::Result<Option<CorsLayer>> {
    let origins = match std::env::var("CORS_ALLOW_ORIGINS") {
        Ok(v) => v,
        Err(_) => return Ok(None),
    };

    let origins = origins.trim();
    if origins.is_empty() {
        return Ok(None);
    }

    let allow_origin = if origins == "*" {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = origins
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin {s:?}: {e}"))
            })
            .collect::<anyhow::Result<_>>()?;
        AllowOrigin::list(origins)
    };

    let mut allow_headers = vec![axum::http::header::CONTENT_TYPE];
    for name in [
        &auth.header_user_id,
        &auth.header_tenant_id,
        &auth.header_org_unit_id,
        &auth.header_permissions,
    ] {
        let header = HeaderName::try_from(name.as_str())
            .with_context(|| format!("invalid identity header name {name:?}"))?;
        allow_headers.push(header);
    }

    Ok(Some(
        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers(allow_headers),
    ))
}
