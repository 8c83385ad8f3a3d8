//! Product Model

use super::serde_helpers;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

pub type ProductId = RecordId;

/// Product model
///
/// `stock` is mutated only through the inventory operations in
/// `ProductRepository` (atomic conditional updates), never by plain CRUD.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub id: Option<ProductId>,
    /// Numeric id from the original catalog import, kept for legacy lookups
    #[serde(default)]
    pub legacy_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    /// Unit price at catalog time
    pub price: f64,
    /// On-hand stock, never negative
    #[serde(default)]
    pub stock: i64,
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub rating: f64,
    pub created_at: Option<DateTime<Utc>>,
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub legacy_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub price: f64,
    pub stock: Option<i64>,
    pub thumbnail: Option<String>,
    pub images: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub rating: Option<f64>,
}

/// Update product payload
///
/// `stock` is deliberately absent: inventory changes go through
/// reserve/release, not catalog edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}
