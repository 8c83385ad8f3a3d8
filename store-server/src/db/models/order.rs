//! Order Model
//!
//! Orders embed line-item and applied-voucher snapshots inline. The
//! snapshots are copies taken at placement time, so later catalog or
//! voucher edits never change a historical order. Only `status` may
//! change after creation.

use super::serde_helpers;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

pub type OrderId = RecordId;

/// Order status enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    PendingConfirmation,
    Confirmed,
    Shipping,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Terminal cancelled state: stock was already restored (or never
    /// needs restoring) for orders in this state.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Line item snapshot embedded in an order
///
/// `unit_price` is captured at order time and never re-read from the
/// live product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(with = "serde_helpers::record_id")]
    pub product: RecordId,
    pub title: String,
    pub quantity: i64,
    pub unit_price: f64,
}

/// Applied voucher snapshot embedded in an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedVoucher {
    #[serde(with = "serde_helpers::record_id")]
    pub voucher: RecordId,
    pub code: String,
    pub discount: f64,
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub id: Option<OrderId>,
    /// Human-readable sequence id, "ORD001"
    pub seq_id: String,
    #[serde(with = "serde_helpers::record_id")]
    pub user: RecordId,
    pub receiver_name: String,
    pub receiver_phone: String,
    pub items: Vec<OrderItem>,
    pub original_total: f64,
    pub discount: f64,
    /// max(0, original_total - discount)
    pub total: f64,
    #[serde(default)]
    pub applied_vouchers: Vec<AppliedVoucher>,
    pub status: OrderStatus,
    pub shipping_address: Option<String>,
    pub payment_method: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Status update payload (the only permitted post-creation mutation)
#[derive(Debug, Clone, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
}

/// Default payment method (cash on delivery)
pub const PAYMENT_METHOD_COD: &str = "COD";
