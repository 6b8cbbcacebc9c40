//! REST routes and the permission each one declares.

use axum::handler::Handler;
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post, put, MethodRouter};
use axum::Router;
use serde::Serialize;

use super::handlers::{
    create_user, delete_user, get_tenant, get_user, health_check, me, metrics_export, route_docs,
    update_user,
};
use crate::auth::{require_permission, RequirePermission, ScopeResolver};
use crate::server::AppState;

/// A protected route as listed by `/docs`
#[derive(Debug, Clone, Serialize)]
pub struct RouteRequirement {
    pub method: &'static str,
    pub path: &'static str,
    pub resource: String,
    pub action: String,
    /// Human-readable scope rule
    pub scope: String,
}

impl RouteRequirement {
    fn new(method: &'static str, path: &'static str, requirement: RequirePermission) -> Self {
        Self {
            method,
            path,
            scope: requirement.scope.to_string(),
            resource: requirement.resource,
            action: requirement.action,
        }
    }
}

pub fn read_user() -> RequirePermission {
    RequirePermission::new("user", "read")
        .with_scope(ScopeResolver::SelfOrTenantFromParam("id".to_string()))
}

pub fn update_user_requirement() -> RequirePermission {
    RequirePermission::new("user", "update").with_scope(ScopeResolver::SelfOrTenantFromTarget)
}

pub fn create_user_requirement() -> RequirePermission {
    RequirePermission::new("user", "create").with_scope(ScopeResolver::Tenant)
}

pub fn delete_user_requirement() -> RequirePermission {
    RequirePermission::new("user", "delete")
}

pub fn read_tenant() -> RequirePermission {
    RequirePermission::new("tenant", "read").with_scope(ScopeResolver::Global)
}

pub fn read_profile() -> RequirePermission {
    RequirePermission::new("profile", "read").with_scope(ScopeResolver::SelfOnly)
}

/// A protected route: its method and path, the permission it declares, and
/// the gated handler.
pub struct ProtectedRoute {
    pub method: &'static str,
    pub path: &'static str,
    pub requirement: RequirePermission,
    route: MethodRouter<AppState>,
}

impl ProtectedRoute {
    fn new(
        method: &'static str,
        path: &'static str,
        requirement: RequirePermission,
        route: MethodRouter<AppState>,
    ) -> Self {
        let route = route.route_layer(from_fn_with_state(requirement.clone(), require_permission));
        Self {
            method,
            path,
            requirement,
            route,
        }
    }

    fn get<H, T>(path: &'static str, requirement: RequirePermission, handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        Self::new("GET", path, requirement, get(handler))
    }

    fn put<H, T>(path: &'static str, requirement: RequirePermission, handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        Self::new("PUT", path, requirement, put(handler))
    }

    fn post<H, T>(path: &'static str, requirement: RequirePermission, handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        Self::new("POST", path, requirement, post(handler))
    }

    fn delete<H, T>(path: &'static str, requirement: RequirePermission, handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        Self::new("DELETE", path, requirement, delete(handler))
    }

    fn describe(&self) -> RouteRequirement {
        RouteRequirement::new(self.method, self.path, self.requirement.clone())
    }
}

/// All protected routes, in registration order.
pub fn protected_routes() -> Vec<ProtectedRoute> {
    vec![
        ProtectedRoute::get("/v1/users/:id", read_user(), get_user),
        ProtectedRoute::put("/v1/users/:id", update_user_requirement(), update_user),
        ProtectedRoute::delete("/v1/users/:id", delete_user_requirement(), delete_user),
        ProtectedRoute::post("/v1/users", create_user_requirement(), create_user),
        ProtectedRoute::get("/v1/tenants/:tenant_id", read_tenant(), get_tenant),
        ProtectedRoute::get("/v1/me", read_profile(), me),
    ]
}

/// Requirements of every protected route, as listed by `/docs`.
pub fn route_requirements() -> Vec<RouteRequirement> {
    protected_routes().iter().map(ProtectedRoute::describe).collect()
}

/// Build the protected API router.
pub fn router() -> Router<AppState> {
    let mut by_path: Vec<(&'static str, MethodRouter<AppState>)> = Vec::new();
    for entry in protected_routes() {
        match by_path.iter().position(|(path, _)| *path == entry.path) {
            Some(i) => {
                let (path, existing) = by_path.remove(i);
                by_path.insert(i, (path, existing.merge(entry.route)));
            }
            None => by_path.push((entry.path, entry.route)),
        }
    }

    by_path
        .into_iter()
        .fold(Router::new(), |router, (path, route)| router.route(path, route))
}

/// Exempt service endpoints.
pub fn service_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_export))
        .route("/docs", get(route_docs))
}
