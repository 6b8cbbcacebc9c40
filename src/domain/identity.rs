//! Request-scoped identity types
//!
//! [`RequestIdentity`] describes the caller and is built once per request by the
//! auth context middleware. [`TargetIdentity`] describes the entity the request
//! acts upon.

use serde::{Deserialize, Serialize};

use super::permission::{has_permission, Permission};

/// Caller identity and grants loaded from request headers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestIdentity {
    /// Caller's user ID
    pub user_id: String,

    /// Caller's tenant ID
    pub tenant_id: String,

    /// Caller's org unit ID, when the gateway supplied one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_unit_id: Option<String>,

    /// Raw permission strings, in header order
    pub permissions: Vec<String>,
}

impl RequestIdentity {
    pub fn new(
        user_id: impl Into<String>,
        tenant_id: impl Into<String>,
        permissions: Vec<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            tenant_id: tenant_id.into(),
            org_unit_id: None,
            permissions,
        }
    }

    pub fn with_org_unit(mut self, org_unit_id: impl Into<String>) -> Self {
        self.org_unit_id = Some(org_unit_id.into());
        self
    }

    /// Check whether any grant held by the caller satisfies `required`.
    pub fn has_permission(&self, required: &Permission) -> bool {
        has_permission(&self.permissions, required)
    }

    /// True if `user_id` names the caller. Empty IDs never match.
    pub fn is_self(&self, user_id: &str) -> bool {
        !user_id.is_empty() && !self.user_id.is_empty() && self.user_id == user_id
    }
}

/// Identifiers of the entity a request operates on
///
/// Fields are empty when the identifier was not found anywhere in the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetIdentity {
    pub user_id: String,
    pub tenant_id: String,
    pub org_unit_id: String,
}

impl TargetIdentity {
    pub fn is_empty(&self) -> bool {
        self.user_id.is_empty() && self.tenant_id.is_empty() && self.org_unit_id.is_empty()
    }
}
