//! Domain models for request authorization
//!
//! Pure types and functions: permission parsing, scope ranking, and the
//! grant-versus-requirement decision. Nothing here touches HTTP.

mod identity;
mod permission;
mod scope;

pub use identity::*;
pub use permission::*;
pub use scope::*;
