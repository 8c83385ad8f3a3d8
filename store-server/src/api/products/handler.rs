//! Product API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::{ApiError, ApiResult, PaginatedResponse};

use crate::core::ServerState;
use crate::db::models::{Product, ProductCreate, ProductUpdate};
use crate::db::repository::ProductRepository;
use crate::utils::validation::{MAX_NAME_LEN, validate_required_text};

const DEFAULT_PER_PAGE: u32 = 20;
const MAX_PER_PAGE: u32 = 100;

/// Pagination query parameters
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// GET /api/products - paginated catalog listing
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<PaginatedResponse<Product>>> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query
        .per_page
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(1, MAX_PER_PAGE);

    let repo = ProductRepository::new(state.db.clone());
    let (products, total) = repo.find_page(page, per_page).await?;

    Ok(Json(PaginatedResponse::new(products, page, per_page, total)))
}

/// GET /api/products/{id} - single product, record id or legacy numeric id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Product>> {
    let repo = ProductRepository::new(state.db.clone());
    let product = repo
        .find_by_ref(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Product {}", id)))?;
    Ok(Json(product))
}

/// POST /api/products - create product (admin)
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ProductCreate>,
) -> ApiResult<Json<Product>> {
    validate_required_text(&payload.title, "title", MAX_NAME_LEN)?;

    let repo = ProductRepository::new(state.db.clone());
    let product = repo.create(payload).await?;

    tracing::info!(
        id = %product.id.as_ref().map(|id| id.to_string()).unwrap_or_default(),
        title = %product.title,
        "Product created"
    );

    Ok(Json(product))
}

/// PUT /api/products/{id} - update catalog fields (admin)
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<ProductUpdate>,
) -> ApiResult<Json<Product>> {
    if let Some(title) = &payload.title {
        validate_required_text(title, "title", MAX_NAME_LEN)?;
    }

    let repo = ProductRepository::new(state.db.clone());
    let product = repo.update(&id, payload).await?;
    Ok(Json(product))
}

/// DELETE /api/products/{id} - delete product (admin)
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> ApiResult<Json<bool>> {
    let repo = ProductRepository::new(state.db.clone());
    repo.delete(&id).await?;
    Ok(Json(true))
}
