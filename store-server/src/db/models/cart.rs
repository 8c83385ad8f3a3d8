//! Cart Model

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Cart line
///
/// `price` is a unit-price snapshot taken when the item was added.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(with = "serde_helpers::record_id")]
    pub product: RecordId,
    pub quantity: i64,
    pub price: f64,
}

/// Per-account cart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub user: RecordId,
    #[serde(default)]
    pub items: Vec<CartItem>,
}
