//! Request authorization for Axum services
//!
//! Identity is not verified here. An upstream gateway authenticates the caller
//! and forwards who they are and what they may do as plain headers; this module
//! turns those headers into a typed [`RequestIdentity`] and checks it against
//! per-route requirements.
//!
//! # Pipeline
//!
//! 1. [`auth_context_middleware`] (router-wide layer) loads the identity, or
//!    rejects with 401 unless the path is exempt.
//! 2. [`extract_targets`] finds which user/tenant/org unit the request is about.
//! 3. [`require_permission`] (route layer) resolves the required scope and
//!    rejects with 403 when no grant satisfies the requirement.
//!
//! # Authorization Model
//!
//! Grants are `<resource>:<action>:<scope>` strings. Scopes nest
//! `self < department < tenant < global`; see [`crate::domain::scope_match`].
//!
//! # Configuration
//!
//! - `AUTH_IGNORE_PATHS`: comma-separated exempt path prefixes
//! - `AUTH_HEADER_USER_ID`, `AUTH_HEADER_TENANT_ID`, `AUTH_HEADER_ORG_UNIT_ID`,
//!   `AUTH_HEADER_PERMISSIONS`: header names
//! - `AUTH_PERMISSIONS_DELIMITER`: separator inside the permissions header

mod middleware;
mod permission;
mod targets;

pub use middleware::*;
pub use permission::*;
pub use targets::*;

pub use crate::domain::{RequestIdentity, TargetIdentity};

/// Authorization error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("missing identity or permissions")]
    MissingIdentity,

    #[error("no permissions in request context")]
    NoPermissions,

    #[error("insufficient permission")]
    InsufficientPermission,
}
