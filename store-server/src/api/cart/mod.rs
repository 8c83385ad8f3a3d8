//! Cart API module

mod handler;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/cart", cart_routes())
}

fn cart_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::get_cart).delete(handler::clear))
        .route("/items", post(handler::add_item).put(handler::update_item))
        .route("/items/{product_id}", delete(handler::remove_item))
}
