//! HTTP surface tests
//!
//! Drives the assembled axum router end to end: authentication gating,
//! order placement over HTTP, and the concurrent voucher-claim race.

mod common;

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode, header};
use serde_json::{Value, json};
use store_server::api;
use store_server::db::models::{User, UserRole};
use tower::ServiceExt;

fn token_for(state: &store_server::ServerState, user: &User) -> String {
    state
        .jwt_service
        .generate_token(
            &user.id.clone().expect("user has no id").to_string(),
            &user.username,
            user.role.as_str(),
        )
        .expect("token generation failed")
}

fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).expect("request build failed")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    serde_json::from_slice(&bytes).expect("body is not JSON")
}

#[tokio::test]
async fn placing_an_order_requires_authentication() {
    let state = common::test_state().await;
    let app: Router = api::app(state);

    let response = app
        .oneshot(post_json(
            "/api/orders",
            None,
            json!({"items": [], "receiver_name": "A", "receiver_phone": "0912345678"}),
        ))
        .await
        .expect("request failed");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_then_place_an_order_over_http() {
    let state = common::test_state().await;
    let product = common::seed_product(&state, "Webcam", 59.99, 4).await;
    let app: Router = api::app(state.clone());

    // Register
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/register",
            None,
            json!({
                "username": "alice",
                "email": "alice@example.com",
                "password": "correct-horse-battery"
            }),
        ))
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let token = body["token"].as_str().expect("no token in response").to_string();

    // Place an order
    let product_ref = product.id.clone().unwrap().to_string();
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/orders",
            Some(&token),
            json!({
                "items": [{"product_id": product_ref, "quantity": 2}],
                "receiver_name": "Alice Nguyen",
                "receiver_phone": "0912 345 678",
                "shipping_address": "12 Harbour Street"
            }),
        ))
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::CREATED);
    let order = body_json(response).await;
    assert_eq!(order["seq_id"], "ORD001");
    assert_eq!(order["total"], 119.98);
    assert_eq!(order["status"], "PENDING_CONFIRMATION");

    // Stock shortfall is a rejected request, not a server error
    let response = app
        .oneshot(post_json(
            "/api/orders",
            Some(&token),
            json!({
                "items": [{"product_id": product_ref, "quantity": 99}],
                "receiver_name": "Alice Nguyen",
                "receiver_phone": "0912345678"
            }),
        ))
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(
        body["message"]
            .as_str()
            .unwrap_or_default()
            .contains("Insufficient stock")
    );
}

#[tokio::test]
async fn invalid_receiver_phone_is_a_bad_request() {
    let state = common::test_state().await;
    let product = common::seed_product(&state, "Stand", 19.0, 4).await;
    let user = common::seed_user(&state, "bob", "bob@example.com").await;
    let token = token_for(&state, &user);
    let app: Router = api::app(state);

    let product_ref = product.id.clone().unwrap().to_string();
    let response = app
        .oneshot(post_json(
            "/api/orders",
            Some(&token),
            json!({
                "items": [{"product_id": product_ref, "quantity": 1}],
                "receiver_name": "Bob",
                "receiver_phone": "not-a-phone"
            }),
        ))
        .await
        .expect("request failed");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn concurrent_claims_of_the_last_voucher_unit_pick_one_winner() {
    let state = common::test_state().await;
    // total_quantity - claimed_count == 1
    let voucher = common::seed_fixed_voucher(&state, "LAST1", 5.0, 0.0, 1).await;
    let voucher_id = voucher.id.clone().unwrap().to_string();

    let first = common::seed_user(&state, "racer1", "racer1@example.com").await;
    let second = common::seed_user(&state, "racer2", "racer2@example.com").await;
    let app: Router = api::app(state.clone());

    let uri = format!("/api/vouchers/{}/claim", voucher_id);
    let mut handles = Vec::new();
    for user in [&first, &second] {
        let app = app.clone();
        let req = post_json(&uri, Some(&token_for(&state, user)), json!({}));
        handles.push(tokio::spawn(async move {
            app.oneshot(req).await.expect("request failed").status()
        }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.expect("task panicked") == StatusCode::OK {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);

    let voucher = common::reload_voucher(&state, &voucher).await;
    assert_eq!(voucher.claimed_count, 1);
}

#[tokio::test]
async fn a_user_cannot_hold_two_unused_claims_of_one_voucher() {
    let state = common::test_state().await;
    let voucher = common::seed_fixed_voucher(&state, "TWICE", 5.0, 0.0, 10).await;
    let voucher_id = voucher.id.clone().unwrap().to_string();
    let user = common::seed_user(&state, "carl", "carl@example.com").await;
    let token = token_for(&state, &user);
    let app: Router = api::app(state.clone());

    let uri = format!("/api/vouchers/{}/claim", voucher_id);

    let response = app
        .clone()
        .oneshot(post_json(&uri, Some(&token), json!({})))
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(post_json(&uri, Some(&token), json!({})))
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(
        body["message"]
            .as_str()
            .unwrap_or_default()
            .contains("already claimed")
    );

    let voucher = common::reload_voucher(&state, &voucher).await;
    assert_eq!(voucher.claimed_count, 1);
}

#[tokio::test]
async fn catalog_mutations_require_the_admin_role() {
    let state = common::test_state().await;
    let user = common::seed_user(&state, "dana", "dana@example.com").await;
    let token = token_for(&state, &user);
    let app: Router = api::app(state.clone());

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/products",
            Some(&token),
            json!({"title": "Rogue", "price": 1.0}),
        ))
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The bootstrapped admin can
    let users = store_server::db::repository::UserRepository::new(state.db.clone());
    let admin = users
        .find_by_email(&state.config.admin_email)
        .await
        .expect("admin lookup failed")
        .expect("bootstrap admin missing");
    assert_eq!(admin.role, UserRole::Admin);

    let admin_token = token_for(&state, &admin);
    let response = app
        .oneshot(post_json(
            "/api/products",
            Some(&admin_token),
            json!({"title": "Legit", "price": 1.0, "stock": 3}),
        ))
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::OK);
}
