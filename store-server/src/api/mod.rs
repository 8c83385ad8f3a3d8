//! API routing module
//!
//! # Structure
//!
//! - [`health`] - health checks
//! - [`auth`] - register / login / profile
//! - [`products`] - catalog management
//! - [`vouchers`] - voucher management and claiming
//! - [`cart`] - per-account shopping cart
//! - [`orders`] - order placement and management

pub mod auth;
pub mod cart;
pub mod health;
pub mod orders;
pub mod products;
pub mod vouchers;

use axum::{Router, middleware};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::require_auth;
use crate::core::ServerState;

// Re-export common types for handlers
pub use shared::{ApiResponse, ApiResult};

/// Assemble the full application router
pub fn app(state: ServerState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(products::router())
        .merge(vouchers::router())
        .merge(cart::router())
        .merge(orders::router())
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
