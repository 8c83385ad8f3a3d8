//! Order placement workflow tests
//!
//! Runs the real placement path against an in-memory database: stock
//! accounting, voucher application, sequence ids and the concurrency
//! guarantees around the shared counters.

mod common;

use chrono::Utc;
use store_server::checkout::{self, PlaceOrderItem, PlaceOrderRequest};
use store_server::db::models::{Order, OrderStatus};
use store_server::db::repository::OrderRepository;

fn order_request(product_ref: &str, quantity: i64, voucher_codes: Vec<String>) -> PlaceOrderRequest {
    PlaceOrderRequest {
        items: vec![PlaceOrderItem {
            product_id: product_ref.to_string(),
            quantity,
        }],
        shipping_address: Some("12 Harbour Street".to_string()),
        payment_method: None,
        note: None,
        voucher_codes,
        receiver_name: "Alice Nguyen".to_string(),
        receiver_phone: "0912345678".to_string(),
    }
}

#[tokio::test]
async fn placing_an_order_decrements_stock_and_snapshots_totals() {
    let state = common::test_state().await;
    let product = common::seed_product(&state, "Keyboard", 100.0, 5).await;
    let user = common::seed_user(&state, "alice", "alice@example.com").await;

    let product_ref = product.id.clone().unwrap().to_string();
    let user_id = user.id.clone().unwrap();

    let order = checkout::place_order(&state.db, &user_id, order_request(&product_ref, 3, vec![]))
        .await
        .expect("placement failed");

    assert_eq!(order.seq_id, "ORD001");
    assert_eq!(order.original_total, 300.0);
    assert_eq!(order.discount, 0.0);
    assert_eq!(order.total, 300.0);
    assert_eq!(order.status, OrderStatus::PendingConfirmation);
    assert_eq!(order.payment_method, "COD");
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].unit_price, 100.0);

    let product = common::reload_product(&state, &product).await;
    assert_eq!(product.stock, 2);
}

#[tokio::test]
async fn fixed_voucher_discounts_and_spends_the_wallet_entry() {
    let state = common::test_state().await;
    let product = common::seed_product(&state, "Mouse", 80.0, 10).await;
    let user = common::seed_user(&state, "bob", "bob@example.com").await;
    let voucher = common::seed_fixed_voucher(&state, "SAVE10", 20.0, 50.0, 100).await;
    common::claim_for(&state, &user, &voucher).await;

    let product_ref = product.id.clone().unwrap().to_string();
    let user_id = user.id.clone().unwrap();

    let order = checkout::place_order(
        &state.db,
        &user_id,
        order_request(&product_ref, 1, vec!["SAVE10".to_string()]),
    )
    .await
    .expect("placement failed");

    assert_eq!(order.original_total, 80.0);
    assert_eq!(order.discount, 20.0);
    assert_eq!(order.total, 60.0);
    assert_eq!(order.applied_vouchers.len(), 1);
    assert_eq!(order.applied_vouchers[0].code, "SAVE10");
    assert_eq!(order.applied_vouchers[0].discount, 20.0);

    let voucher = common::reload_voucher(&state, &voucher).await;
    assert_eq!(voucher.used_count, 1);

    let user = common::reload_user(&state, &user).await;
    assert!(user.vouchers[0].is_used);

    // The wallet entry is spent: a second order with the same code fails
    let err = checkout::place_order(
        &state.db,
        &user_id,
        order_request(&product_ref, 1, vec!["SAVE10".to_string()]),
    )
    .await
    .expect_err("second use should be rejected");
    assert!(err.message().contains("not in your wallet or already used"));
}

#[tokio::test]
async fn voucher_below_minimum_purchase_rejects_without_side_effects() {
    let state = common::test_state().await;
    let product = common::seed_product(&state, "Cable", 40.0, 10).await;
    let user = common::seed_user(&state, "carol", "carol@example.com").await;
    let voucher = common::seed_fixed_voucher(&state, "SAVE10", 20.0, 50.0, 100).await;
    common::claim_for(&state, &user, &voucher).await;

    let product_ref = product.id.clone().unwrap().to_string();
    let user_id = user.id.clone().unwrap();

    let err = checkout::place_order(
        &state.db,
        &user_id,
        order_request(&product_ref, 1, vec!["SAVE10".to_string()]),
    )
    .await
    .expect_err("below-minimum voucher should reject the whole order");
    assert!(err.message().contains("requires minimum purchase"));

    // Nothing moved: no order, stock intact, wallet entry still unused
    let orders = OrderRepository::new(state.db.clone());
    assert!(orders.find_all().await.unwrap().is_empty());
    assert_eq!(common::reload_product(&state, &product).await.stock, 10);
    assert_eq!(common::reload_voucher(&state, &voucher).await.used_count, 0);
    assert!(!common::reload_user(&state, &user).await.vouchers[0].is_used);
}

#[tokio::test]
async fn percent_voucher_is_capped_at_max_discount() {
    let state = common::test_state().await;
    let product = common::seed_product(&state, "Headset", 100.0, 10).await;
    let user = common::seed_user(&state, "dave", "dave@example.com").await;
    let voucher = common::seed_percent_voucher(&state, "PCT20", 20.0, 15.0, 100).await;
    common::claim_for(&state, &user, &voucher).await;

    let product_ref = product.id.clone().unwrap().to_string();
    let user_id = user.id.clone().unwrap();

    let order = checkout::place_order(
        &state.db,
        &user_id,
        order_request(&product_ref, 1, vec!["PCT20".to_string()]),
    )
    .await
    .expect("placement failed");

    assert_eq!(order.discount, 15.0);
    assert_eq!(order.total, 85.0);
}

#[tokio::test]
async fn insufficient_stock_rejects_and_persists_nothing() {
    let state = common::test_state().await;
    let product = common::seed_product(&state, "Monitor", 250.0, 2).await;
    let user = common::seed_user(&state, "erin", "erin@example.com").await;

    let product_ref = product.id.clone().unwrap().to_string();
    let user_id = user.id.clone().unwrap();

    let err = checkout::place_order(&state.db, &user_id, order_request(&product_ref, 3, vec![]))
        .await
        .expect_err("overselling should be rejected");
    assert!(err.message().contains("Insufficient stock for Monitor"));

    let orders = OrderRepository::new(state.db.clone());
    assert!(orders.find_all().await.unwrap().is_empty());
    assert_eq!(common::reload_product(&state, &product).await.stock, 2);
}

#[tokio::test]
async fn receiver_fields_are_validated() {
    let state = common::test_state().await;
    let product = common::seed_product(&state, "Desk", 300.0, 5).await;
    let user = common::seed_user(&state, "frank", "frank@example.com").await;

    let product_ref = product.id.clone().unwrap().to_string();
    let user_id = user.id.clone().unwrap();

    let mut bad_phone = order_request(&product_ref, 1, vec![]);
    bad_phone.receiver_phone = "12-34".to_string();
    assert!(
        checkout::place_order(&state.db, &user_id, bad_phone)
            .await
            .is_err()
    );

    let mut blank_name = order_request(&product_ref, 1, vec![]);
    blank_name.receiver_name = "   ".to_string();
    assert!(
        checkout::place_order(&state.db, &user_id, blank_name)
            .await
            .is_err()
    );

    let mut no_items = order_request(&product_ref, 1, vec![]);
    no_items.items.clear();
    assert!(
        checkout::place_order(&state.db, &user_id, no_items)
            .await
            .is_err()
    );

    let mut zero_quantity = order_request(&product_ref, 1, vec![]);
    zero_quantity.items[0].quantity = 0;
    assert!(
        checkout::place_order(&state.db, &user_id, zero_quantity)
            .await
            .is_err()
    );
}

#[tokio::test]
async fn unknown_product_is_rejected() {
    let state = common::test_state().await;
    let user = common::seed_user(&state, "gail", "gail@example.com").await;
    let user_id = user.id.clone().unwrap();

    let err = checkout::place_order(
        &state.db,
        &user_id,
        order_request("product:missing", 1, vec![]),
    )
    .await
    .expect_err("unknown product should be rejected");
    assert!(err.message().contains("not found"));
}

#[tokio::test]
async fn sequence_ids_count_legacy_bare_numeric_ids() {
    let state = common::test_state().await;
    let product = common::seed_product(&state, "Lamp", 25.0, 10).await;
    let user = common::seed_user(&state, "hana", "hana@example.com").await;
    let user_id = user.id.clone().unwrap();

    // Pre-existing history: two current-format ids and one legacy bare id
    let orders = OrderRepository::new(state.db.clone());
    for seq_id in ["ORD001", "ORD002", "5"] {
        orders
            .create(Order {
                id: None,
                seq_id: seq_id.to_string(),
                user: user_id.clone(),
                receiver_name: "History".to_string(),
                receiver_phone: "0912345678".to_string(),
                items: vec![],
                original_total: 0.0,
                discount: 0.0,
                total: 0.0,
                applied_vouchers: vec![],
                status: OrderStatus::Delivered,
                shipping_address: None,
                payment_method: "COD".to_string(),
                note: None,
                created_at: Utc::now(),
            })
            .await
            .expect("failed to seed historical order");
    }

    let product_ref = product.id.clone().unwrap().to_string();
    let order = checkout::place_order(&state.db, &user_id, order_request(&product_ref, 1, vec![]))
        .await
        .expect("placement failed");

    assert_eq!(order.seq_id, "ORD006");
}

#[tokio::test]
async fn concurrent_orders_never_oversell() {
    let state = common::test_state().await;
    let product = common::seed_product(&state, "Limited Edition", 10.0, 5).await;
    let user = common::seed_user(&state, "ivan", "ivan@example.com").await;

    let product_ref = product.id.clone().unwrap().to_string();
    let user_id = user.id.clone().unwrap();

    let mut handles = Vec::new();
    for _ in 0..10 {
        let db = state.db.clone();
        let user_id = user_id.clone();
        let req = order_request(&product_ref, 1, vec![]);
        handles.push(tokio::spawn(async move {
            checkout::place_order(&db, &user_id, req).await
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        if handle.await.expect("task panicked").is_ok() {
            succeeded += 1;
        }
    }

    // Exactly enough orders succeed to exhaust stock, the rest reject
    assert_eq!(succeeded, 5);
    assert_eq!(common::reload_product(&state, &product).await.stock, 0);

    let orders = OrderRepository::new(state.db.clone());
    assert_eq!(orders.find_all().await.unwrap().len(), 5);
}

#[tokio::test]
async fn purchased_lines_leave_the_cart() {
    use store_server::db::repository::CartRepository;

    let state = common::test_state().await;
    let bought = common::seed_product(&state, "Bought", 10.0, 5).await;
    let kept = common::seed_product(&state, "Kept", 20.0, 5).await;
    let user = common::seed_user(&state, "judy", "judy@example.com").await;
    let user_id = user.id.clone().unwrap();

    let carts = CartRepository::new(state.db.clone());
    carts
        .add_item(&user_id, bought.id.as_ref().unwrap(), 2, bought.price)
        .await
        .unwrap();
    carts
        .add_item(&user_id, kept.id.as_ref().unwrap(), 1, kept.price)
        .await
        .unwrap();

    let product_ref = bought.id.clone().unwrap().to_string();
    checkout::place_order(&state.db, &user_id, order_request(&product_ref, 2, vec![]))
        .await
        .expect("placement failed");

    let cart = carts.get_or_create(&user_id).await.unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(&cart.items[0].product, kept.id.as_ref().unwrap());
}
