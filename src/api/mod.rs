//! API layer for the authorization service
//!
//! REST routes, their declared permission requirements, and the structured
//! error responses the auth layer produces.

pub mod auth_helpers;
pub mod error;
pub mod handlers;
mod rest;

pub use error::{ApiError, ErrorCode};
pub use rest::*;
