//! Shared helpers for integration tests
#![allow(dead_code)]

use chrono::{Duration, Utc};
use store_server::core::{Config, ServerState};
use store_server::db::models::{
    Product, ProductCreate, User, UserRole, UserVoucherEntry, Voucher, VoucherCreate,
};
use store_server::db::repository::{ProductRepository, UserRepository, VoucherRepository};

/// Fresh in-memory server state
pub async fn test_state() -> ServerState {
    let config = Config::with_overrides("/tmp/store-test", 0);
    ServerState::initialize_in_memory(&config)
        .await
        .expect("failed to initialize test state")
}

/// Seed a product with the given price and stock
pub async fn seed_product(state: &ServerState, title: &str, price: f64, stock: i64) -> Product {
    let repo = ProductRepository::new(state.db.clone());
    repo.create(ProductCreate {
        legacy_id: None,
        title: title.to_string(),
        description: None,
        brand: None,
        category: None,
        price,
        stock: Some(stock),
        thumbnail: None,
        images: None,
        tags: None,
        rating: None,
    })
    .await
    .expect("failed to seed product")
}

/// Seed a regular user account
pub async fn seed_user(state: &ServerState, username: &str, email: &str) -> User {
    let repo = UserRepository::new(state.db.clone());
    repo.create(
        username.to_string(),
        email.to_string(),
        "password-123",
        UserRole::User,
    )
    .await
    .expect("failed to seed user")
}

/// Seed a fixed-amount voucher with an open claim window
pub async fn seed_fixed_voucher(
    state: &ServerState,
    code: &str,
    amount: f64,
    minimum: f64,
    quantity: i64,
) -> Voucher {
    let repo = VoucherRepository::new(state.db.clone());
    let now = Utc::now();
    repo.create(VoucherCreate {
        code: code.to_string(),
        receive_start_time: now - Duration::days(1),
        receive_end_time: now + Duration::days(1),
        validity_days: 7,
        minimum_purchase: Some(minimum),
        discount_amount: Some(amount),
        discount_percent: None,
        max_discount: None,
        description: None,
        total_quantity: quantity,
    })
    .await
    .expect("failed to seed voucher")
}

/// Seed a percent voucher with an open claim window
pub async fn seed_percent_voucher(
    state: &ServerState,
    code: &str,
    percent: f64,
    max_discount: f64,
    quantity: i64,
) -> Voucher {
    let repo = VoucherRepository::new(state.db.clone());
    let now = Utc::now();
    repo.create(VoucherCreate {
        code: code.to_string(),
        receive_start_time: now - Duration::days(1),
        receive_end_time: now + Duration::days(1),
        validity_days: 7,
        minimum_purchase: None,
        discount_amount: None,
        discount_percent: Some(percent),
        max_discount: Some(max_discount),
        description: None,
        total_quantity: quantity,
    })
    .await
    .expect("failed to seed voucher")
}

/// Put a claimed voucher into a user's wallet (claim slot + wallet entry)
pub async fn claim_for(state: &ServerState, user: &User, voucher: &Voucher) {
    let vouchers = VoucherRepository::new(state.db.clone());
    let users = UserRepository::new(state.db.clone());

    let voucher_id = voucher.id.clone().expect("voucher has no id");
    let user_id = user.id.clone().expect("user has no id");

    vouchers
        .claim_increment(&voucher_id)
        .await
        .expect("claim increment failed")
        .expect("voucher quota exhausted in test setup");
    users
        .append_wallet_entry(
            &user_id,
            UserVoucherEntry {
                voucher: voucher_id,
                claimed_at: Utc::now(),
                is_used: false,
            },
        )
        .await
        .expect("wallet append failed")
        .expect("duplicate wallet entry in test setup");
}

/// Reload a product by id
pub async fn reload_product(state: &ServerState, product: &Product) -> Product {
    let repo = ProductRepository::new(state.db.clone());
    repo.find_by_id(&product.id.clone().expect("product has no id").to_string())
        .await
        .expect("product reload failed")
        .expect("product vanished")
}

/// Reload a voucher by id
pub async fn reload_voucher(state: &ServerState, voucher: &Voucher) -> Voucher {
    let repo = VoucherRepository::new(state.db.clone());
    repo.find_by_id(&voucher.id.clone().expect("voucher has no id").to_string())
        .await
        .expect("voucher reload failed")
        .expect("voucher vanished")
}

/// Reload a user by id
pub async fn reload_user(state: &ServerState, user: &User) -> User {
    let repo = UserRepository::new(state.db.clone());
    repo.find_by_id(&user.id.clone().expect("user has no id").to_string())
        .await
        .expect("user reload failed")
        .expect("user vanished")
}
