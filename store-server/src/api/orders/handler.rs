//! Order API Handlers
//!
//! `create` is the order-placement transaction (see [`crate::checkout`]).
//! Deleting an order restores stock for its line items first unless the
//! order already sits in the terminal cancelled state.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use shared::{ApiError, ApiResult};

use crate::auth::CurrentUser;
use crate::checkout::{self, PlaceOrderRequest};
use crate::core::ServerState;
use crate::db::models::{Order, OrderStatusUpdate, UserId};
use crate::db::repository::{OrderRepository, ProductRepository};

fn caller_id(current: &CurrentUser) -> ApiResult<UserId> {
    current
        .id
        .parse()
        .map_err(|_| ApiError::invalid_token("Malformed subject in token"))
}

/// POST /api/orders - place an order for the calling account
pub async fn create(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<PlaceOrderRequest>,
) -> ApiResult<(StatusCode, Json<Order>)> {
    let user_id = caller_id(&current)?;
    let order = checkout::place_order(&state.db, &user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /api/orders - all orders, newest first (admin)
pub async fn list(State(state): State<ServerState>) -> ApiResult<Json<Vec<Order>>> {
    let repo = OrderRepository::new(state.db.clone());
    let orders = repo.find_all().await?;
    Ok(Json(orders))
}

/// GET /api/orders/{id} - single order by record id or sequence id
pub async fn get_by_id(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Order>> {
    let repo = OrderRepository::new(state.db.clone());
    let order = repo
        .find_by_ref(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Order {}", id)))?;

    if !current.is_admin() && order.user.to_string() != current.id {
        return Err(ApiError::forbidden("You can only view your own orders"));
    }

    Ok(Json(order))
}

/// GET /api/orders/user/{user_id} - a user's orders
pub async fn list_by_user(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<Order>>> {
    if !current.is_admin() && current.id != user_id {
        return Err(ApiError::forbidden("You can only view your own orders"));
    }

    let user_id: UserId = user_id
        .parse()
        .map_err(|_| ApiError::validation(format!("Invalid user ID: {}", user_id)))?;

    let repo = OrderRepository::new(state.db.clone());
    let orders = repo.find_by_user(&user_id).await?;
    Ok(Json(orders))
}

/// PUT /api/orders/{id} - change the status, the only mutable field (admin)
pub async fn update_status(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<OrderStatusUpdate>,
) -> ApiResult<Json<Order>> {
    let repo = OrderRepository::new(state.db.clone());
    let order = repo
        .find_by_ref(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Order {}", id)))?;
    let order_id = order
        .id
        .ok_or_else(|| ApiError::internal("Order record has no id"))?;

    let updated = repo.update_status(&order_id, payload.status).await?;

    tracing::info!(order = %updated.seq_id, status = ?updated.status, "Order status updated");

    Ok(Json(updated))
}

/// DELETE /api/orders/{id} - delete an order, restoring stock first (admin)
///
/// Stock restoration is best effort: a failed release is logged and the
/// delete still proceeds.
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> ApiResult<Json<bool>> {
    let orders = OrderRepository::new(state.db.clone());
    let products = ProductRepository::new(state.db.clone());

    let order = orders
        .find_by_ref(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Order {}", id)))?;
    let order_id = order
        .id
        .clone()
        .ok_or_else(|| ApiError::internal("Order record has no id"))?;

    // Cancelled orders already had their stock restored (or never held it)
    if !order.status.is_cancelled() {
        for item in &order.items {
            if let Err(e) = products.release(&item.product, item.quantity).await {
                tracing::error!(
                    order = %order.seq_id,
                    product = %item.product,
                    error = %e,
                    "Failed to restore stock while deleting order"
                );
            }
        }
    }

    orders.delete(&order_id).await?;

    tracing::info!(order = %order.seq_id, "Order deleted");

    Ok(Json(true))
}
