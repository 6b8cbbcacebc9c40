//! Request Authorization Library
//!
//! Header-driven identity loading, target extraction and scoped permission
//! checks for Axum services.
//!
//! ## Modules
//!
//! - [`domain`] - Permission strings, scope ranking, and the match decision
//! - [`auth`] - Identity middleware, target extraction, and route permission gates
//! - [`api`] - REST routes, handlers, and structured error responses
//! - [`metrics`] - Authorization outcome counters
//! - [`telemetry`] - Logging setup
//! - [`server`] - Configuration and router assembly

pub mod api;
pub mod auth;
pub mod domain;
pub mod metrics;
pub mod server;
pub mod telemetry;

// Re-export commonly used types
pub use auth::{
    auth_context_middleware, extract_targets, require_permission, AuthContextConfig, AuthError,
    RequirePermission, ScopeResolver,
};
pub use domain::{
    has_permission, scope_match, scope_rank, Permission, RequestIdentity, Scope, TargetIdentity,
};
