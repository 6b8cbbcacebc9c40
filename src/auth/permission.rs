//! Route-level permission gate
//!
//! A [`RequirePermission`] is declared per route with a resource, an action and a
//! [`ScopeResolver`] that picks the required scope for each request. The gate
//! must be installed with `route_layer` so route parameters are visible to it.
//!
//! ```ignore
//! Router::new().route(
//!     "/v1/users/:id",
//!     get(get_user).route_layer(middleware::from_fn_with_state(
//!         RequirePermission::new("user", "read")
//!             .with_scope(ScopeResolver::SelfOrTenantFromParam("id".into())),
//!         require_permission,
//!     )),
//! );
//! ```

use axum::{
    body::Body,
    extract::{FromRequestParts, RawPathParams, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{extract_targets, AuthError, RequestIdentity};
use crate::domain::{Permission, Scope};

type CustomResolver = dyn Fn(&Parts, &RequestIdentity) -> String + Send + Sync;

/// Decides the scope a request must be granted at
#[derive(Clone)]
pub enum ScopeResolver {
    /// Always require `global`
    Global,
    /// Always require `tenant`
    Tenant,
    /// Always require `self`
    SelfOnly,
    /// `self` when the named route parameter equals the caller's user ID,
    /// `tenant` otherwise
    SelfOrTenantFromParam(String),
    /// `self` when the extracted target user is the caller, `tenant` otherwise
    SelfOrTenantFromTarget,
    /// Caller-supplied logic; may return any scope string
    Custom(Arc<CustomResolver>),
}

impl ScopeResolver {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&Parts, &RequestIdentity) -> String + Send + Sync + 'static,
    {
        ScopeResolver::Custom(Arc::new(f))
    }

    /// Resolve the required scope for `request`.
    ///
    /// The request is handed back because target-based resolution reads (and
    /// restores) the body.
    pub async fn resolve(
        &self,
        request: Request<Body>,
        identity: &RequestIdentity,
    ) -> (String, Request<Body>) {
        match self {
            ScopeResolver::Global => (Scope::Global.to_string(), request),
            ScopeResolver::Tenant => (Scope::Tenant.to_string(), request),
            ScopeResolver::SelfOnly => (Scope::Own.to_string(), request),
            ScopeResolver::SelfOrTenantFromParam(param) => {
                let (mut parts, body) = request.into_parts();
                let requested = route_param(&mut parts, param).await.unwrap_or_default();
                let scope = self_or_tenant(&requested, identity);
                (scope.to_string(), Request::from_parts(parts, body))
            }
            ScopeResolver::SelfOrTenantFromTarget => {
                let (targets, request) = extract_targets(request).await;
                (self_or_tenant(&targets.user_id, identity).to_string(), request)
            }
            ScopeResolver::Custom(f) => {
                let (parts, body) = request.into_parts();
                let scope = f(&parts, identity);
                (scope, Request::from_parts(parts, body))
            }
        }
    }
}

impl Default for ScopeResolver {
    fn default() -> Self {
        ScopeResolver::Tenant
    }
}

impl fmt::Debug for ScopeResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeResolver::Global => f.write_str("Global"),
            ScopeResolver::Tenant => f.write_str("Tenant"),
            ScopeResolver::SelfOnly => f.write_str("SelfOnly"),
            ScopeResolver::SelfOrTenantFromParam(param) => {
                f.debug_tuple("SelfOrTenantFromParam").field(param).finish()
            }
            ScopeResolver::SelfOrTenantFromTarget => f.write_str("SelfOrTenantFromTarget"),
            ScopeResolver::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl fmt::Display for ScopeResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeResolver::Global => f.write_str("global"),
            ScopeResolver::Tenant => f.write_str("tenant"),
            ScopeResolver::SelfOnly => f.write_str("self"),
            ScopeResolver::SelfOrTenantFromParam(param) => {
                write!(f, "self if :{param} is the caller, else tenant")
            }
            ScopeResolver::SelfOrTenantFromTarget => {
                f.write_str("self if the target user is the caller, else tenant")
            }
            ScopeResolver::Custom(_) => f.write_str("custom"),
        }
    }
}

/// `self` if `requested_user_id` is the caller, `tenant` otherwise.
pub fn self_or_tenant(requested_user_id: &str, identity: &RequestIdentity) -> Scope {
    if identity.is_self(requested_user_id) {
        Scope::Own
    } else {
        Scope::Tenant
    }
}

async fn route_param(parts: &mut Parts, name: &str) -> Option<String> {
    let params = RawPathParams::from_request_parts(parts, &()).await.ok()?;
    params
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// Permission a route demands
#[derive(Debug, Clone)]
pub struct RequirePermission {
    pub resource: String,
    pub action: String,
    pub scope: ScopeResolver,
}

impl RequirePermission {
    /// Require `resource:action` at tenant scope.
    pub fn new(resource: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            action: action.into(),
            scope: ScopeResolver::default(),
        }
    }

    pub fn with_scope(mut self, scope: ScopeResolver) -> Self {
        self.scope = scope;
        self
    }

    /// The concrete requirement once the scope is known.
    pub fn at(&self, scope: impl Into<String>) -> Permission {
        Permission::new(self.resource.clone(), self.action.clone(), scope)
    }
}

impl fmt::Display for RequirePermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.resource, self.action, self.scope)
    }
}

/// Permission gate middleware
///
/// Reads the [`RequestIdentity`] left by the auth context middleware. A request
/// without one, or whose identity holds no grants, is rejected with 403
/// `permission_denied`, as is one whose grants don't cover the requirement.
pub async fn require_permission(
    State(requirement): State<RequirePermission>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let identity = match request.extensions().get::<RequestIdentity>() {
        Some(identity) if !identity.permissions.is_empty() => identity.clone(),
        _ => {
            warn!(
                resource = %requirement.resource,
                action = %requirement.action,
                "permission gate reached without identity"
            );
            return AuthError::NoPermissions.into_response();
        }
    };

    let (scope, request) = requirement.scope.resolve(request, &identity).await;
    let required = requirement.at(scope);

    if !identity.has_permission(&required) {
        debug!(
            user_id = %identity.user_id,
            required = %required,
            "permission denied"
        );
        return AuthError::InsufficientPermission.into_response();
    }

    debug!(user_id = %identity.user_id, required = %required, "permission granted");
    next.run(request).await
}
