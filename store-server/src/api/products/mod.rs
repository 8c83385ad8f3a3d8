//! Product API module

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/products", product_routes())
}

fn product_routes() -> Router<ServerState> {
    // Catalog mutations are admin-only
    let admin_routes = Router::new()
        .route("/", post(handler::create))
        .route("/{id}", put(handler::update).delete(handler::delete))
        .route_layer(middleware::from_fn(require_admin));

    Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .merge(admin_routes)
}
