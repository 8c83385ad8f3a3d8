//! Order placement workflow
//!
//! The one path in the backend that mutates several aggregates as a
//! single logical unit: it validates the requested items against live
//! inventory, applies vouchers from the buyer's wallet, persists the
//! immutable order record, decrements stock, records voucher usage and
//! clears the purchased lines from the cart.
//!
//! There is no multi-document transaction underneath. The flow runs as a
//! saga: each committed step is recorded in [`PlacementUndo`], and when a
//! later step fails the earlier effects are compensated in reverse order
//! before the request is rejected. Stock decrements and voucher counters
//! are single-statement conditional updates, so concurrent orders for the
//! last unit can never oversell.

pub mod pricing;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use shared::{ApiError, ApiResult};
use std::collections::HashSet;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::db::models::{
    AppliedVoucher, Order, OrderItem, OrderStatus, ProductId, UserId, Voucher, VoucherId,
    order::PAYMENT_METHOD_COD, serde_helpers,
};
use crate::db::repository::{
    CartRepository, OrderRepository, ProductRepository, RepoError, UserRepository,
    VoucherRepository,
};
use crate::utils::validation::{
    MAX_ADDRESS_LEN, MAX_NAME_LEN, MAX_NOTE_LEN, validate_optional_text, validate_phone,
    validate_required_text,
};

/// One requested line. The product reference accepts the catalog record
/// id ("product:xyz") or a bare numeric legacy id.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrderItem {
    #[serde(deserialize_with = "serde_helpers::string_or_number")]
    pub product_id: String,
    pub quantity: i64,
}

/// Order placement request body
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrderRequest {
    pub items: Vec<PlaceOrderItem>,
    pub shipping_address: Option<String>,
    pub payment_method: Option<String>,
    pub note: Option<String>,
    #[serde(default)]
    pub voucher_codes: Vec<String>,
    pub receiver_name: String,
    pub receiver_phone: String,
}

/// Resolved line: snapshot data plus the live stock read for the
/// friendly precheck (the authoritative check is the conditional
/// decrement later)
struct ResolvedLine {
    product_id: ProductId,
    title: String,
    unit_price: f64,
    quantity: i64,
}

/// How many times a placement retries when a concurrent placement wins
/// the race for the same sequence id
const SEQ_ID_RETRIES: usize = 8;

/// Place an order for the given account.
///
/// Returns the persisted order on success; every failure is a
/// rejected-request `ApiError`, never a panic.
pub async fn place_order(
    db: &Surreal<Db>,
    user_id: &UserId,
    req: PlaceOrderRequest,
) -> ApiResult<Order> {
    let products = ProductRepository::new(db.clone());
    let vouchers = VoucherRepository::new(db.clone());
    let orders = OrderRepository::new(db.clone());
    let users = UserRepository::new(db.clone());
    let carts = CartRepository::new(db.clone());

    // ── 1. Validate request fields ──────────────────────────────────
    validate_required_text(&req.receiver_name, "receiver_name", MAX_NAME_LEN)?;
    let receiver_phone = validate_phone(&req.receiver_phone)?;
    validate_optional_text(&req.shipping_address, "shipping_address", MAX_ADDRESS_LEN)?;
    validate_optional_text(&req.note, "note", MAX_NOTE_LEN)?;

    if req.items.is_empty() {
        return Err(ApiError::validation("items are required"));
    }
    for item in &req.items {
        if item.quantity <= 0 {
            return Err(ApiError::validation(format!(
                "quantity must be positive for product {}",
                item.product_id
            )));
        }
    }

    // ── 2. Resolve account and wallet ───────────────────────────────
    let user = users
        .find_by_id(&user_id.to_string())
        .await?
        .ok_or_else(|| ApiError::not_found("Account"))?;

    // ── 3. Resolve products and snapshot lines ──────────────────────
    let mut lines: Vec<ResolvedLine> = Vec::with_capacity(req.items.len());
    for item in &req.items {
        let product = products
            .find_by_ref(&item.product_id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Product {}", item.product_id)))?;

        if product.stock < item.quantity {
            return Err(ApiError::business_rule(format!(
                "Insufficient stock for {}: {} available, {} requested",
                product.title, product.stock, item.quantity
            )));
        }

        let product_id = product
            .id
            .clone()
            .ok_or_else(|| ApiError::internal("Product record has no id"))?;
        lines.push(ResolvedLine {
            product_id,
            title: product.title,
            unit_price: product.price,
            quantity: item.quantity,
        });
    }

    let priced_lines: Vec<(f64, i64)> = lines.iter().map(|l| (l.unit_price, l.quantity)).collect();
    let original_total = pricing::order_original_total(&priced_lines);

    // ── 4. Validate vouchers against the pre-discount total ─────────
    // The first failing voucher in request order determines the message;
    // any failure rejects the whole order (no partial application).
    let mut applied_vouchers: Vec<Voucher> = Vec::new();
    let mut wallet_claims: Vec<(VoucherId, DateTime<Utc>)> = Vec::new();
    let mut claimed_in_request: HashSet<String> = HashSet::new();

    for code in &req.voucher_codes {
        let voucher = vouchers
            .find_by_code(code)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Voucher {}", code.trim().to_uppercase())))?;
        let voucher_id = voucher
            .id
            .clone()
            .ok_or_else(|| ApiError::internal("Voucher record has no id"))?;

        let entry = user
            .unused_wallet_entry(&voucher_id)
            .filter(|_| !claimed_in_request.contains(&voucher_id.to_string()))
            .ok_or_else(|| {
                ApiError::business_rule(format!(
                    "Voucher {} is not in your wallet or already used",
                    voucher.code
                ))
            })?;

        if !voucher.is_valid(Some(entry.claimed_at)) {
            return Err(ApiError::business_rule(format!(
                "Voucher {} is expired or no longer valid",
                voucher.code
            )));
        }

        if original_total < voucher.minimum_purchase {
            return Err(ApiError::business_rule(format!(
                "Voucher {} requires minimum purchase of {}",
                voucher.code, voucher.minimum_purchase
            )));
        }

        claimed_in_request.insert(voucher_id.to_string());
        wallet_claims.push((voucher_id, entry.claimed_at));
        applied_vouchers.push(voucher);
    }

    // ── 5. Compute totals through the pricing engine ────────────────
    let voucher_refs: Vec<&Voucher> = applied_vouchers.iter().collect();
    let outcome = pricing::price_order(&priced_lines, &voucher_refs);

    let applied: Vec<AppliedVoucher> = applied_vouchers
        .iter()
        .zip(outcome.voucher_discounts.iter())
        .zip(wallet_claims.iter())
        .map(|((voucher, discount), (voucher_id, _))| AppliedVoucher {
            voucher: voucher_id.clone(),
            code: voucher.code.clone(),
            discount: *discount,
        })
        .collect();

    let order_items: Vec<OrderItem> = lines
        .iter()
        .map(|l| OrderItem {
            product: l.product_id.clone(),
            title: l.title.clone(),
            quantity: l.quantity,
            unit_price: l.unit_price,
        })
        .collect();

    // ── 6. Allocate sequence id and persist the order ───────────────
    let order = Order {
        id: None,
        seq_id: String::new(),
        user: user_id.clone(),
        receiver_name: req.receiver_name.trim().to_string(),
        receiver_phone,
        items: order_items,
        original_total: outcome.original_total,
        discount: outcome.total_discount,
        total: outcome.final_total,
        applied_vouchers: applied,
        status: OrderStatus::PendingConfirmation,
        shipping_address: req.shipping_address,
        payment_method: req
            .payment_method
            .unwrap_or_else(|| PAYMENT_METHOD_COD.to_string()),
        note: req.note,
        created_at: Utc::now(),
    };

    let created = create_with_seq_retry(&orders, order).await?;
    let order_id = created
        .id
        .clone()
        .ok_or_else(|| ApiError::internal("Order record has no id"))?;

    let mut undo = PlacementUndo {
        products: &products,
        vouchers: &vouchers,
        users: &users,
        orders: &orders,
        user_id,
        order_id,
        reserved: Vec::new(),
        used_vouchers: Vec::new(),
        marked_wallet: Vec::new(),
    };

    // ── 7. Decrement stock (atomic per product) ─────────────────────
    for line in &lines {
        match products.reserve(&line.product_id, line.quantity).await {
            Ok(true) => undo.reserved.push((line.product_id.clone(), line.quantity)),
            Ok(false) => {
                undo.unwind().await;
                return Err(ApiError::business_rule(format!(
                    "Insufficient stock for {}",
                    line.title
                )));
            }
            Err(e) => {
                undo.unwind().await;
                return Err(e.into());
            }
        }
    }

    // ── 8. Record voucher usage (counter + wallet flag) ─────────────
    for ((voucher_id, claimed_at), voucher) in wallet_claims.iter().zip(applied_vouchers.iter()) {
        match vouchers.use_increment(voucher_id).await {
            Ok(true) => undo.used_vouchers.push(voucher_id.clone()),
            Ok(false) => {
                undo.unwind().await;
                return Err(ApiError::business_rule(format!(
                    "Voucher {} is no longer available",
                    voucher.code
                )));
            }
            Err(e) => {
                undo.unwind().await;
                return Err(e.into());
            }
        }

        match users.mark_voucher_used(user_id, voucher_id).await {
            Ok(true) => undo.marked_wallet.push((voucher_id.clone(), *claimed_at)),
            Ok(false) => {
                undo.unwind().await;
                return Err(ApiError::business_rule(format!(
                    "Voucher {} was already used",
                    voucher.code
                )));
            }
            Err(e) => {
                undo.unwind().await;
                return Err(e.into());
            }
        }
    }

    // ── 9. Clear purchased lines from the cart (best effort) ────────
    let purchased: Vec<ProductId> = created.items.iter().map(|i| i.product.clone()).collect();
    if let Err(e) = carts.remove_purchased(user_id, &purchased).await {
        tracing::warn!(
            order = %created.seq_id,
            error = %e,
            "Failed to clear purchased lines from cart"
        );
    }

    tracing::info!(
        order = %created.seq_id,
        user = %user_id,
        total = created.total,
        vouchers = created.applied_vouchers.len(),
        "Order placed"
    );

    Ok(created)
}

/// Persist the order, retrying with a fresh sequence id when a
/// concurrent placement committed the same number first.
async fn create_with_seq_retry(orders: &OrderRepository, mut order: Order) -> ApiResult<Order> {
    for _ in 0..SEQ_ID_RETRIES {
        order.seq_id = orders.next_seq_id().await?;
        match orders.create(order.clone()).await {
            Ok(created) => return Ok(created),
            Err(RepoError::Duplicate(_)) => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Err(ApiError::conflict("Order sequence id"))
}

/// Committed side effects of a placement in progress, in commit order.
///
/// `unwind` compensates them in reverse: restore wallet flags, revert
/// voucher usage counters, release stock, delete the order record.
/// Compensation failures are logged, never silently swallowed.
struct PlacementUndo<'a> {
    products: &'a ProductRepository,
    vouchers: &'a VoucherRepository,
    users: &'a UserRepository,
    orders: &'a OrderRepository,
    user_id: &'a UserId,
    order_id: surrealdb::RecordId,
    reserved: Vec<(ProductId, i64)>,
    used_vouchers: Vec<VoucherId>,
    marked_wallet: Vec<(VoucherId, DateTime<Utc>)>,
}

impl PlacementUndo<'_> {
    async fn unwind(self) {
        for (voucher_id, claimed_at) in self.marked_wallet.iter().rev() {
            if let Err(e) = self
                .users
                .unmark_voucher_used(self.user_id, voucher_id, *claimed_at)
                .await
            {
                tracing::error!(voucher = %voucher_id, error = %e, "Compensation failed: wallet flag");
            }
        }
        for voucher_id in self.used_vouchers.iter().rev() {
            if let Err(e) = self.vouchers.use_decrement(voucher_id).await {
                tracing::error!(voucher = %voucher_id, error = %e, "Compensation failed: used_count");
            }
        }
        for (product_id, quantity) in self.reserved.iter().rev() {
            if let Err(e) = self.products.release(product_id, *quantity).await {
                tracing::error!(product = %product_id, error = %e, "Compensation failed: stock release");
            }
        }
        if let Err(e) = self.orders.delete(&self.order_id).await {
            tracing::error!(order = %self.order_id, error = %e, "Compensation failed: order delete");
        }
    }
}
