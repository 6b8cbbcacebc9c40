//! Authorization helper functions for REST API handlers.
//!
//! Route gates cover the common case. Handlers call these when the requirement
//! depends on something only the handler knows, such as a parsed body field.

use crate::api::error::ApiError;
use crate::auth::{AuthError, RequestIdentity};
use crate::domain::{Permission, Scope};

/// Ensure the caller holds a grant satisfying `required`.
pub fn ensure_permission(identity: &RequestIdentity, required: &Permission) -> Result<(), ApiError> {
    if identity.permissions.is_empty() {
        return Err(AuthError::NoPermissions.into());
    }
    if !identity.has_permission(required) {
        return Err(AuthError::InsufficientPermission.into());
    }
    Ok(())
}

/// Scope needed to act on records of `tenant_id`: `tenant` inside the caller's
/// own tenant (or when no tenant is named), `global` across tenants.
pub fn tenant_scope_for(identity: &RequestIdentity, tenant_id: &str) -> Scope {
    if tenant_id.is_empty() || tenant_id == identity.tenant_id {
        Scope::Tenant
    } else {
        Scope::Global
    }
}

/// Ensure the caller may perform `resource:action` on records of `tenant_id`.
pub fn ensure_tenant_access(
    identity: &RequestIdentity,
    resource: &str,
    action: &str,
    tenant_id: &str,
) -> Result<(), ApiError> {
    let scope = tenant_scope_for(identity, tenant_id);
    ensure_permission(identity, &Permission::scoped(resource, action, scope))
}
