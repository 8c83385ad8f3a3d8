//! Order API module

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", order_routes())
}

fn order_routes() -> Router<ServerState> {
    // Listing everything, changing status and deleting are admin-only
    let admin_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", put(handler::update_status).delete(handler::delete))
        .route_layer(middleware::from_fn(require_admin));

    Router::new()
        .route("/", post(handler::create))
        .route("/user/{user_id}", get(handler::list_by_user))
        .route("/{id}", get(handler::get_by_id))
        .merge(admin_routes)
}
