//! Identity loading middleware for Axum
//!
//! Reads caller identity and grants from gateway-supplied headers and attaches
//! them to the request as a [`RequestIdentity`] extension.

use axum::{
    body::Body,
    extract::{OriginalUri, Request, State},
    http::{Extensions, HeaderMap, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, info};

use super::{AuthError, RequestIdentity};

/// Default permission list separator
pub const DEFAULT_PERMISSIONS_DELIMITER: &str = ",";

/// Maps identity fields to request headers and lists exempt paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContextConfig {
    /// Path prefixes that skip identity loading (health checks, docs)
    pub ignore_paths: Vec<String>,

    pub header_user_id: String,
    pub header_tenant_id: String,
    pub header_org_unit_id: String,
    pub header_permissions: String,

    /// Separator between entries of the permissions header
    pub permissions_delimiter: String,
}

impl Default for AuthContextConfig {
    fn default() -> Self {
        Self {
            ignore_paths: vec![
                "/health".to_string(),
                "/metrics".to_string(),
                "/docs".to_string(),
            ],
            header_user_id: "X-User-Id".to_string(),
            header_tenant_id: "X-Tenant-Id".to_string(),
            header_org_unit_id: "X-Org-Unit-Id".to_string(),
            header_permissions: "X-Permissions".to_string(),
            permissions_delimiter: DEFAULT_PERMISSIONS_DELIMITER.to_string(),
        }
    }
}

impl AuthContextConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let ignore_paths = std::env::var("AUTH_IGNORE_PATHS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim())
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or(defaults.ignore_paths);

        let header = |var: &str, default: String| {
            std::env::var(var)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
        };

        Self {
            ignore_paths,
            header_user_id: header("AUTH_HEADER_USER_ID", defaults.header_user_id),
            header_tenant_id: header("AUTH_HEADER_TENANT_ID", defaults.header_tenant_id),
            header_org_unit_id: header("AUTH_HEADER_ORG_UNIT_ID", defaults.header_org_unit_id),
            header_permissions: header("AUTH_HEADER_PERMISSIONS", defaults.header_permissions),
            permissions_delimiter: std::env::var("AUTH_PERMISSIONS_DELIMITER")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.permissions_delimiter),
        }
    }

    /// True if `path` starts with any exempt prefix.
    pub fn is_exempt(&self, path: &str) -> bool {
        self.ignore_paths
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Build the caller identity from request headers.
    ///
    /// User ID, tenant ID and the permissions header are required; the org unit
    /// is optional. Values are trimmed, and non-UTF-8 values count as absent.
    pub fn identity_from_headers(&self, headers: &HeaderMap) -> Result<RequestIdentity, AuthError> {
        let value = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .unwrap_or_default()
        };

        let user_id = value(&self.header_user_id);
        let tenant_id = value(&self.header_tenant_id);
        let org_unit_id = value(&self.header_org_unit_id);
        let permissions_header = value(&self.header_permissions);

        if user_id.is_empty() || tenant_id.is_empty() || permissions_header.is_empty() {
            return Err(AuthError::MissingIdentity);
        }

        let permissions = split_permissions(permissions_header, &self.permissions_delimiter);
        let identity = RequestIdentity::new(user_id, tenant_id, permissions);

        Ok(if org_unit_id.is_empty() {
            identity
        } else {
            identity.with_org_unit(org_unit_id)
        })
    }
}

/// Split a permissions header into trimmed, non-empty entries.
///
/// An empty delimiter falls back to [`DEFAULT_PERMISSIONS_DELIMITER`].
pub fn split_permissions(header: &str, delimiter: &str) -> Vec<String> {
    let delimiter = if delimiter.is_empty() {
        DEFAULT_PERMISSIONS_DELIMITER
    } else {
        delimiter
    };

    header
        .split(delimiter)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Path as the client sent it, before any `Router::nest` prefix stripping.
pub(crate) fn original_path<'a>(uri: &'a Uri, extensions: &'a Extensions) -> &'a str {
    extensions
        .get::<OriginalUri>()
        .map(|original| original.0.path())
        .unwrap_or_else(|| uri.path())
}

/// Identity loading middleware
///
/// Exempt paths pass through without an identity. Anything else must carry user,
/// tenant and permission headers or is rejected with 401 `unauthorized`.
pub async fn auth_context_middleware(
    State(config): State<Arc<AuthContextConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let path = original_path(request.uri(), request.extensions()).to_string();
    if config.is_exempt(&path) {
        return next.run(request).await;
    }

    let identity = match config.identity_from_headers(request.headers()) {
        Ok(identity) => identity,
        Err(e) => {
            info!(
                path = %path,
                "rejecting request without identity headers"
            );
            return e.into_response();
        }
    };

    debug!(
        user_id = %identity.user_id,
        tenant_id = %identity.tenant_id,
        grants = identity.permissions.len(),
        "loaded request identity"
    );

    request.extensions_mut().insert(identity);
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_split_permissions() {
        assert_eq!(split_permissions("a,b,c", ","), vec!["a", "b", "c"]);
        assert_eq!(
            split_permissions(" doc:read:global , ,user:update:self,", ","),
            vec!["doc:read:global", "user:update:self"]
        );
        assert!(split_permissions("", ",").is_empty());
    }

    #[test]
    fn test_split_permissions_custom_and_empty_delimiter() {
        assert_eq!(split_permissions("a;b", ";"), vec!["a", "b"]);
        assert_eq!(split_permissions("a,b", ""), vec!["a", "b"]);
    }

    #[test]
    fn test_identity_from_headers() {
        let config = AuthContextConfig::default();
        let identity = config
            .identity_from_headers(&headers(&[
                ("x-user-id", " user1 "),
                ("x-tenant-id", "tenant1"),
                ("x-org-unit-id", "org1"),
                ("x-permissions", "doc:read:global,user:update:org"),
            ]))
            .unwrap();

        assert_eq!(identity.user_id, "user1");
        assert_eq!(identity.tenant_id, "tenant1");
        assert_eq!(identity.org_unit_id.as_deref(), Some("org1"));
        assert_eq!(
            identity.permissions,
            vec!["doc:read:global", "user:update:org"]
        );
    }

    #[test]
    fn test_org_unit_is_optional() {
        let config = AuthContextConfig::default();
        let identity = config
            .identity_from_headers(&headers(&[
                ("x-user-id", "user1"),
                ("x-tenant-id", "tenant1"),
                ("x-permissions", "doc:read:global"),
            ]))
            .unwrap();
        assert_eq!(identity.org_unit_id, None);
    }

    #[test]
    fn test_missing_required_headers() {
        let config = AuthContextConfig::default();
        let complete = [
            ("x-user-id", "user1"),
            ("x-tenant-id", "tenant1"),
            ("x-permissions", "doc:read:global"),
        ];

        for skip in 0..complete.len() {
            let partial: Vec<_> = complete
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != skip)
                .map(|(_, pair)| *pair)
                .collect();
            assert_eq!(
                config.identity_from_headers(&headers(&partial)),
                Err(AuthError::MissingIdentity)
            );
        }

        assert_eq!(
            config.identity_from_headers(&HeaderMap::new()),
            Err(AuthError::MissingIdentity)
        );
    }

    #[test]
    fn test_blank_header_counts_as_missing() {
        let config = AuthContextConfig::default();
        let result = config.identity_from_headers(&headers(&[
            ("x-user-id", "user1"),
            ("x-tenant-id", "   "),
            ("x-permissions", "doc:read:global"),
        ]));
        assert_eq!(result, Err(AuthError::MissingIdentity));
    }

    #[test]
    fn test_custom_header_names() {
        let config = AuthContextConfig {
            header_user_id: "X-Sub".to_string(),
            header_permissions: "X-Grants".to_string(),
            permissions_delimiter: " ".to_string(),
            ..Default::default()
        };
        let identity = config
            .identity_from_headers(&headers(&[
                ("x-sub", "u9"),
                ("x-tenant-id", "t9"),
                ("x-grants", "doc:read:self doc:write:self"),
            ]))
            .unwrap();
        assert_eq!(identity.user_id, "u9");
        assert_eq!(identity.permissions.len(), 2);
    }

    #[test]
    fn test_exempt_paths_match_by_prefix() {
        let config = AuthContextConfig::default();
        assert!(config.is_exempt("/health"));
        assert!(config.is_exempt("/healthz"));
        assert!(config.is_exempt("/metrics/prometheus"));
        assert!(config.is_exempt("/docs/index.html"));
        assert!(!config.is_exempt("/api/health"));
        assert!(!config.is_exempt("/v1/users"));
    }

    #[test]
    fn test_original_path_prefers_original_uri() {
        let uri: Uri = "/health".parse().unwrap();
        let mut extensions = Extensions::new();
        assert_eq!(original_path(&uri, &extensions), "/health");

        extensions.insert(OriginalUri("/svc/health".parse().unwrap()));
        assert_eq!(original_path(&uri, &extensions), "/svc/health");
    }

    async fn nested_status(ignore_paths: &[&str]) -> axum::http::StatusCode {
        use axum::{middleware::from_fn_with_state, routing::get, Router};
        use tower::ServiceExt;

        let config = AuthContextConfig {
            ignore_paths: ignore_paths.iter().map(|p| p.to_string()).collect(),
            ..Default::default()
        };
        let inner = Router::new()
            .route("/health", get(|| async { "ok" }))
            .layer(from_fn_with_state(Arc::new(config), auth_context_middleware));
        let app = Router::new().nest("/svc", inner);

        let request = axum::http::Request::builder()
            .uri("/svc/health")
            .body(Body::empty())
            .unwrap();
        app.oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_nested_router_checks_full_request_path() {
        assert_eq!(nested_status(&["/svc/health"]).await, axum::http::StatusCode::OK);
        assert_eq!(
            nested_status(&["/health"]).await,
            axum::http::StatusCode::UNAUTHORIZED
        );
    }
}
