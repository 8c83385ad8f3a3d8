//! Cart Repository
//!
//! Carts are per-account documents, so every request touching a cart is
//! the only writer for that account; read-modify-write of the item list
//! is safe here, unlike the shared counters.

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Cart, CartItem, UserId};
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const CART_TABLE: &str = "cart";

#[derive(Clone)]
pub struct CartRepository {
    base: BaseRepository,
}

impl CartRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Fetch the user's cart, creating an empty one on first access
    pub async fn get_or_create(&self, user_id: &UserId) -> RepoResult<Cart> {
        let user_ref = user_id.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM cart WHERE user = $user LIMIT 1")
            .bind(("user", user_ref))
            .await?;
        let carts: Vec<Cart> = result.take(0)?;
        if let Some(cart) = carts.into_iter().next() {
            return Ok(cart);
        }

        let cart = Cart {
            id: None,
            user: user_id.clone(),
            items: Vec::new(),
        };
        let created: Option<Cart> = self.base.db().create(CART_TABLE).content(cart).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create cart".to_string()))
    }

    /// Add a product to the cart (or bump the quantity of an existing
    /// line). `price` is the unit-price snapshot at add time.
    pub async fn add_item(
        &self,
        user_id: &UserId,
        product_id: &RecordId,
        quantity: i64,
        price: f64,
    ) -> RepoResult<Cart> {
        let mut cart = self.get_or_create(user_id).await?;

        match cart.items.iter_mut().find(|i| &i.product == product_id) {
            Some(item) => item.quantity += quantity,
            None => cart.items.push(CartItem {
                product: product_id.clone(),
                quantity,
                price,
            }),
        }

        self.save_items(cart).await
    }

    /// Set the quantity of a cart line; quantity <= 0 removes the line
    pub async fn update_item(
        &self,
        user_id: &UserId,
        product_id: &RecordId,
        quantity: i64,
    ) -> RepoResult<Cart> {
        let mut cart = self.get_or_create(user_id).await?;

        if quantity <= 0 {
            cart.items.retain(|i| &i.product != product_id);
        } else if let Some(item) = cart.items.iter_mut().find(|i| &i.product == product_id) {
            item.quantity = quantity;
        }

        self.save_items(cart).await
    }

    /// Remove a product line from the cart
    pub async fn remove_item(&self, user_id: &UserId, product_id: &RecordId) -> RepoResult<Cart> {
        let mut cart = self.get_or_create(user_id).await?;
        cart.items.retain(|i| &i.product != product_id);
        self.save_items(cart).await
    }

    /// Empty the cart
    pub async fn clear(&self, user_id: &UserId) -> RepoResult<Cart> {
        let mut cart = self.get_or_create(user_id).await?;
        cart.items.clear();
        self.save_items(cart).await
    }

    /// Drop the lines whose product was just purchased (called by the
    /// placement workflow after an order commits)
    pub async fn remove_purchased(
        &self,
        user_id: &UserId,
        product_ids: &[RecordId],
    ) -> RepoResult<Cart> {
        let mut cart = self.get_or_create(user_id).await?;
        cart.items.retain(|i| !product_ids.contains(&i.product));
        self.save_items(cart).await
    }

    async fn save_items(&self, cart: Cart) -> RepoResult<Cart> {
        let Some(id) = cart.id.clone() else {
            return Err(RepoError::Database("Cart has no record id".to_string()));
        };
        let mut result = self
            .base
            .db()
            .query("UPDATE $id SET items = $items RETURN AFTER")
            .bind(("id", id))
            .bind(("items", cart.items))
            .await?;
        let carts: Vec<Cart> = result.take(0)?;
        carts
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::Database("Failed to save cart".to_string()))
    }
}
