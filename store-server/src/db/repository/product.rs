//! Product Repository
//!
//! Catalog CRUD plus the inventory ledger: `reserve` and `release` are
//! the only code paths that touch `stock`.

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Product, ProductCreate, ProductId, ProductUpdate};
use chrono::Utc;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const PRODUCT_TABLE: &str = "product";

#[derive(Clone)]
pub struct ProductRepository {
    base: BaseRepository,
}

impl ProductRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all products
    pub async fn find_all(&self) -> RepoResult<Vec<Product>> {
        let products: Vec<Product> = self
            .base
            .db()
            .query("SELECT * FROM product ORDER BY title")
            .await?
            .take(0)?;
        Ok(products)
    }

    /// Find one page of products plus the total count
    pub async fn find_page(&self, page: u32, per_page: u32) -> RepoResult<(Vec<Product>, u64)> {
        let start = (page.saturating_sub(1) as i64) * per_page as i64;
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM product ORDER BY title LIMIT $limit START $start")
            .query("SELECT count() AS total FROM product GROUP ALL")
            .bind(("limit", per_page as i64))
            .bind(("start", start))
            .await?;

        let products: Vec<Product> = result.take(0)?;

        #[derive(serde::Deserialize)]
        struct Count {
            total: u64,
        }
        let counts: Vec<Count> = result.take(1)?;
        let total = counts.first().map(|c| c.total).unwrap_or(0);

        Ok((products, total))
    }

    /// Find product by record id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Product>> {
        let record_id: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid product ID: {}", id)))?;
        let product: Option<Product> = self.base.db().select(record_id).await?;
        Ok(product)
    }

    /// Resolve a product reference: catalog record id first, numeric
    /// legacy id fallback
    pub async fn find_by_ref(&self, product_ref: &str) -> RepoResult<Option<Product>> {
        if let Ok(record_id) = product_ref.parse::<RecordId>() {
            let product: Option<Product> = self.base.db().select(record_id).await?;
            if product.is_some() {
                return Ok(product);
            }
        }

        if let Ok(legacy_id) = product_ref.trim().parse::<i64>() {
            let mut result = self
                .base
                .db()
                .query("SELECT * FROM product WHERE legacy_id = $legacy_id LIMIT 1")
                .bind(("legacy_id", legacy_id))
                .await?;
            let products: Vec<Product> = result.take(0)?;
            return Ok(products.into_iter().next());
        }

        Ok(None)
    }

    /// Create a new product
    pub async fn create(&self, data: ProductCreate) -> RepoResult<Product> {
        if data.price < 0.0 {
            return Err(RepoError::Validation("price must not be negative".into()));
        }
        if data.stock.is_some_and(|s| s < 0) {
            return Err(RepoError::Validation("stock must not be negative".into()));
        }

        let product = Product {
            id: None,
            legacy_id: data.legacy_id,
            title: data.title,
            description: data.description,
            brand: data.brand,
            category: data.category,
            price: data.price,
            stock: data.stock.unwrap_or(0),
            thumbnail: data.thumbnail,
            images: data.images.unwrap_or_default(),
            tags: data.tags.unwrap_or_default(),
            rating: data.rating.unwrap_or(0.0),
            created_at: Some(Utc::now()),
        };

        let created: Option<Product> = self
            .base
            .db()
            .create(PRODUCT_TABLE)
            .content(product)
            .await?;

        created.ok_or_else(|| RepoError::Database("Failed to create product".to_string()))
    }

    /// Update catalog fields of a product (never stock)
    pub async fn update(&self, id: &str, data: ProductUpdate) -> RepoResult<Product> {
        let record_id: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid product ID: {}", id)))?;

        if data.price.is_some_and(|p| p < 0.0) {
            return Err(RepoError::Validation("price must not be negative".into()));
        }

        let mut result = self
            .base
            .db()
            .query("UPDATE $id MERGE $data RETURN AFTER")
            .bind(("id", record_id))
            .bind(("data", data))
            .await?;
        let products: Vec<Product> = result.take(0)?;
        products
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Product {} not found", id)))
    }

    /// Hard delete a product
    pub async fn delete(&self, id: &str) -> RepoResult<()> {
        let record_id: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid product ID: {}", id)))?;
        let result: Option<Product> = self.base.db().delete(record_id).await?;
        if result.is_none() {
            return Err(RepoError::NotFound(format!("Product {} not found", id)));
        }
        Ok(())
    }

    // =========================================================================
    // Inventory ledger
    // =========================================================================

    /// Reserve stock: atomic conditional decrement, guarded by
    /// `stock >= quantity`. Returns false when the guard fails, which
    /// means a concurrent order took the remaining units first.
    pub async fn reserve(&self, id: &ProductId, quantity: i64) -> RepoResult<bool> {
        let mut result = self
            .base
            .db()
            .query("UPDATE $id SET stock -= $qty WHERE stock >= $qty RETURN AFTER")
            .bind(("id", id.clone()))
            .bind(("qty", quantity))
            .await?;
        let updated: Vec<Product> = result.take(0)?;
        Ok(!updated.is_empty())
    }

    /// Release stock: atomic increment. Used by order deletion and by
    /// placement compensation.
    pub async fn release(&self, id: &ProductId, quantity: i64) -> RepoResult<()> {
        self.base
            .db()
            .query("UPDATE $id SET stock += $qty")
            .bind(("id", id.clone()))
            .bind(("qty", quantity))
            .await?;
        Ok(())
    }
}
