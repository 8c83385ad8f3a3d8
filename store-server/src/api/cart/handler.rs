//! Cart API Handlers
//!
//! All routes operate on the calling account's own cart.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use shared::{ApiError, ApiResult};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Cart, UserId, serde_helpers};
use crate::db::repository::{CartRepository, ProductRepository};

#[derive(Debug, Deserialize)]
pub struct CartItemRequest {
    #[serde(deserialize_with = "serde_helpers::string_or_number")]
    pub product_id: String,
    pub quantity: i64,
}

fn caller_id(current: &CurrentUser) -> ApiResult<UserId> {
    current
        .id
        .parse()
        .map_err(|_| ApiError::invalid_token("Malformed subject in token"))
}

/// GET /api/cart - the caller's cart (created empty on first access)
pub async fn get_cart(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> ApiResult<Json<Cart>> {
    let user_id = caller_id(&current)?;
    let repo = CartRepository::new(state.db.clone());
    let cart = repo.get_or_create(&user_id).await?;
    Ok(Json(cart))
}

/// POST /api/cart/items - add a product (price snapshot at add time)
pub async fn add_item(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<CartItemRequest>,
) -> ApiResult<Json<Cart>> {
    if payload.quantity <= 0 {
        return Err(ApiError::validation("quantity must be positive"));
    }

    let user_id = caller_id(&current)?;
    let products = ProductRepository::new(state.db.clone());
    let product = products
        .find_by_ref(&payload.product_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Product {}", payload.product_id)))?;
    let product_id = product
        .id
        .clone()
        .ok_or_else(|| ApiError::internal("Product record has no id"))?;

    let repo = CartRepository::new(state.db.clone());
    let cart = repo
        .add_item(&user_id, &product_id, payload.quantity, product.price)
        .await?;
    Ok(Json(cart))
}

/// PUT /api/cart/items - set a line's quantity (<= 0 removes it)
pub async fn update_item(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<CartItemRequest>,
) -> ApiResult<Json<Cart>> {
    let user_id = caller_id(&current)?;
    let products = ProductRepository::new(state.db.clone());
    let product = products
        .find_by_ref(&payload.product_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Product {}", payload.product_id)))?;
    let product_id = product
        .id
        .clone()
        .ok_or_else(|| ApiError::internal("Product record has no id"))?;

    let repo = CartRepository::new(state.db.clone());
    let cart = repo
        .update_item(&user_id, &product_id, payload.quantity)
        .await?;
    Ok(Json(cart))
}

/// DELETE /api/cart/items/{product_id} - remove a line
pub async fn remove_item(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(product_id): Path<String>,
) -> ApiResult<Json<Cart>> {
    let user_id = caller_id(&current)?;
    let products = ProductRepository::new(state.db.clone());
    let product = products
        .find_by_ref(&product_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Product {}", product_id)))?;
    let product_id = product
        .id
        .clone()
        .ok_or_else(|| ApiError::internal("Product record has no id"))?;

    let repo = CartRepository::new(state.db.clone());
    let cart = repo.remove_item(&user_id, &product_id).await?;
    Ok(Json(cart))
}

/// DELETE /api/cart - empty the caller's cart
pub async fn clear(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> ApiResult<Json<Cart>> {
    let user_id = caller_id(&current)?;
    let repo = CartRepository::new(state.db.clone());
    let cart = repo.clear(&user_id).await?;
    Ok(Json(cart))
}
