//! Voucher Repository
//!
//! Voucher CRUD plus the counter side of the voucher ledger. The
//! `claimed_count` / `used_count` mutations are conditional updates so
//! that concurrent claims or redemptions of the last unit cannot both
//! succeed.

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Voucher, VoucherCreate, VoucherId, VoucherUpdate};
use chrono::Utc;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const VOUCHER_TABLE: &str = "voucher";

#[derive(Clone)]
pub struct VoucherRepository {
    base: BaseRepository,
}

impl VoucherRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all vouchers, newest first
    pub async fn find_all(&self) -> RepoResult<Vec<Voucher>> {
        let vouchers: Vec<Voucher> = self
            .base
            .db()
            .query("SELECT * FROM voucher ORDER BY created_at DESC")
            .await?
            .take(0)?;
        Ok(vouchers)
    }

    /// Find voucher by record id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Voucher>> {
        let record_id: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid voucher ID: {}", id)))?;
        let voucher: Option<Voucher> = self.base.db().select(record_id).await?;
        Ok(voucher)
    }

    /// Find voucher by code (case-normalized)
    pub async fn find_by_code(&self, code: &str) -> RepoResult<Option<Voucher>> {
        let code = code.trim().to_uppercase();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM voucher WHERE code = $code LIMIT 1")
            .bind(("code", code))
            .await?;
        let vouchers: Vec<Voucher> = result.take(0)?;
        Ok(vouchers.into_iter().next())
    }

    /// Vouchers currently claimable: active with quota left, claim window
    /// checked application-side
    pub async fn find_claimable(&self) -> RepoResult<Vec<Voucher>> {
        let vouchers: Vec<Voucher> = self
            .base
            .db()
            .query(
                "SELECT * FROM voucher \
                 WHERE is_active = true AND claimed_count < total_quantity \
                 ORDER BY receive_end_time",
            )
            .await?
            .take(0)?;

        let now = Utc::now();
        Ok(vouchers
            .into_iter()
            .filter(|v| v.can_claim_at(now))
            .collect())
    }

    /// Create a new voucher
    pub async fn create(&self, data: VoucherCreate) -> RepoResult<Voucher> {
        let code = data.code.trim().to_uppercase();
        if code.is_empty() {
            return Err(RepoError::Validation("code must not be empty".into()));
        }
        if data.receive_start_time >= data.receive_end_time {
            return Err(RepoError::Validation(
                "receive_end_time must be after receive_start_time".into(),
            ));
        }
        if data.validity_days < 1 {
            return Err(RepoError::Validation("validity_days must be at least 1".into()));
        }
        if data.total_quantity < 0 {
            return Err(RepoError::Validation("total_quantity must not be negative".into()));
        }

        let discount_amount = data.discount_amount.unwrap_or(0.0);
        let discount_percent = data.discount_percent.unwrap_or(0.0);
        Voucher::validate_discount_mode(discount_amount, discount_percent)
            .map_err(RepoError::Validation)?;
        if !(0.0..=100.0).contains(&discount_percent) {
            return Err(RepoError::Validation(
                "discount_percent must be between 0 and 100".into(),
            ));
        }

        if self.find_by_code(&code).await?.is_some() {
            return Err(RepoError::Duplicate(format!("Voucher code '{}'", code)));
        }

        let voucher = Voucher {
            id: None,
            code,
            receive_start_time: data.receive_start_time,
            receive_end_time: data.receive_end_time,
            validity_days: data.validity_days,
            minimum_purchase: data.minimum_purchase.unwrap_or(0.0),
            discount_amount,
            discount_percent,
            max_discount: data.max_discount.unwrap_or(0.0),
            description: data.description,
            total_quantity: data.total_quantity,
            claimed_count: 0,
            used_count: 0,
            is_active: true,
            created_at: Some(Utc::now()),
        };

        let created: Option<Voucher> = self
            .base
            .db()
            .create(VOUCHER_TABLE)
            .content(voucher)
            .await?;

        created.ok_or_else(|| RepoError::Database("Failed to create voucher".to_string()))
    }

    /// Update a voucher (counters are not updatable through this path)
    pub async fn update(&self, id: &str, mut data: VoucherUpdate) -> RepoResult<Voucher> {
        let record_id: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid voucher ID: {}", id)))?;

        if let Some(code) = data.code.take() {
            data.code = Some(code.trim().to_uppercase());
        }

        let mut result = self
            .base
            .db()
            .query("UPDATE $id MERGE $data RETURN AFTER")
            .bind(("id", record_id))
            .bind(("data", data))
            .await?;
        let vouchers: Vec<Voucher> = result.take(0)?;
        vouchers
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Voucher {} not found", id)))
    }

    /// Hard delete a voucher
    pub async fn delete(&self, id: &str) -> RepoResult<()> {
        let record_id: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid voucher ID: {}", id)))?;
        let result: Option<Voucher> = self.base.db().delete(record_id).await?;
        if result.is_none() {
            return Err(RepoError::NotFound(format!("Voucher {} not found", id)));
        }
        Ok(())
    }

    // =========================================================================
    // Counter ledger
    // =========================================================================

    /// Atomically take one claim slot. Returns the updated voucher, or
    /// None when the quota is exhausted (or the voucher was deactivated).
    pub async fn claim_increment(&self, id: &VoucherId) -> RepoResult<Option<Voucher>> {
        let mut result = self
            .base
            .db()
            .query(
                "UPDATE $id SET claimed_count += 1 \
                 WHERE is_active = true AND claimed_count < total_quantity \
                 RETURN AFTER",
            )
            .bind(("id", id.clone()))
            .await?;
        let updated: Vec<Voucher> = result.take(0)?;
        Ok(updated.into_iter().next())
    }

    /// Give back a claim slot (compensation for a failed claim)
    pub async fn claim_decrement(&self, id: &VoucherId) -> RepoResult<()> {
        self.base
            .db()
            .query("UPDATE $id SET claimed_count -= 1 WHERE claimed_count > 0")
            .bind(("id", id.clone()))
            .await?;
        Ok(())
    }

    /// Atomically record one redemption. Guarded by
    /// `used_count < claimed_count`; returns false when the guard fails.
    pub async fn use_increment(&self, id: &VoucherId) -> RepoResult<bool> {
        let mut result = self
            .base
            .db()
            .query(
                "UPDATE $id SET used_count += 1 \
                 WHERE used_count < claimed_count \
                 RETURN AFTER",
            )
            .bind(("id", id.clone()))
            .await?;
        let updated: Vec<Voucher> = result.take(0)?;
        Ok(!updated.is_empty())
    }

    /// Revert one redemption (compensation for a failed placement)
    pub async fn use_decrement(&self, id: &VoucherId) -> RepoResult<()> {
        self.base
            .db()
            .query("UPDATE $id SET used_count -= 1 WHERE used_count > 0")
            .bind(("id", id.clone()))
            .await?;
        Ok(())
    }
}
