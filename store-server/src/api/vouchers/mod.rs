//! Voucher API module

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/vouchers", voucher_routes())
}

fn voucher_routes() -> Router<ServerState> {
    // Voucher administration is admin-only
    let admin_routes = Router::new()
        .route("/", post(handler::create))
        .route("/{id}", put(handler::update).delete(handler::delete))
        .route_layer(middleware::from_fn(require_admin));

    Router::new()
        .route("/", get(handler::list))
        .route("/available", get(handler::available))
        .route("/code/{code}", get(handler::get_by_code))
        .route("/user/{user_id}", get(handler::user_vouchers))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/claim", post(handler::claim))
        .merge(admin_routes)
}
