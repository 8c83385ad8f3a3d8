//! Authentication module
//!
//! JWT token issuing/validation and the axum middleware that guards
//! the API surface.

pub mod extractor;
pub mod jwt;
pub mod middleware;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::{require_admin, require_auth};
