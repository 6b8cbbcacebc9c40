//! REST API handlers organized by domain.

pub mod health;
pub mod tenants;
pub mod users;

pub use health::*;
pub use tenants::*;
pub use users::*;
