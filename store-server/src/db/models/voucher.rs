//! Voucher Model

use super::serde_helpers;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

pub type VoucherId = RecordId;

/// Discount voucher
///
/// Exactly one discount mode is configured: a fixed `discount_amount`, or
/// a `discount_percent` with an optional `max_discount` cap. The counters
/// obey `used_count <= claimed_count <= total_quantity` and are mutated
/// only through the conditional updates in `VoucherRepository`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Voucher {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub id: Option<VoucherId>,
    /// Unique code, stored uppercased
    pub code: String,
    /// Claim window start
    pub receive_start_time: DateTime<Utc>,
    /// Claim window end
    pub receive_end_time: DateTime<Utc>,
    /// Redemption window length in days, counted from the claim date
    pub validity_days: i64,
    #[serde(default)]
    pub minimum_purchase: f64,
    /// Fixed discount mode
    #[serde(default)]
    pub discount_amount: f64,
    /// Percent discount mode
    #[serde(default)]
    pub discount_percent: f64,
    /// Cap for percent mode (0 = uncapped)
    #[serde(default)]
    pub max_discount: f64,
    pub description: Option<String>,
    pub total_quantity: i64,
    #[serde(default)]
    pub claimed_count: i64,
    #[serde(default)]
    pub used_count: i64,
    #[serde(
        default = "default_true",
        deserialize_with = "serde_helpers::bool_true"
    )]
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

impl Voucher {
    /// Whether the voucher can still be redeemed.
    ///
    /// With a `claimed_at`, also checks the per-claim redemption deadline
    /// (`claimed_at + validity_days`, day granularity).
    pub fn is_valid_at(&self, claimed_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        if !self.is_active {
            return false;
        }
        if self.claimed_count >= self.total_quantity {
            return false;
        }
        if let Some(claimed_at) = claimed_at {
            let expiry = claimed_at + Duration::days(self.validity_days);
            if now > expiry {
                return false;
            }
        }
        true
    }

    /// Whether the voucher can still be redeemed, evaluated at the current time
    pub fn is_valid(&self, claimed_at: Option<DateTime<Utc>>) -> bool {
        self.is_valid_at(claimed_at, Utc::now())
    }

    /// Whether the voucher is inside its claim window with quota remaining
    pub fn can_claim_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && now >= self.receive_start_time
            && now <= self.receive_end_time
            && self.claimed_count < self.total_quantity
    }

    /// Whether the voucher is claimable at the current time
    pub fn can_claim(&self) -> bool {
        self.can_claim_at(Utc::now())
    }

    /// Validate that exactly one discount mode is configured
    pub fn validate_discount_mode(
        discount_amount: f64,
        discount_percent: f64,
    ) -> Result<(), String> {
        if discount_amount <= 0.0 && discount_percent <= 0.0 {
            return Err("Voucher must have either discount_amount or discount_percent".to_string());
        }
        if discount_amount > 0.0 && discount_percent > 0.0 {
            return Err(
                "Voucher cannot have both discount_amount and discount_percent".to_string(),
            );
        }
        Ok(())
    }
}

/// Create voucher payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoucherCreate {
    pub code: String,
    pub receive_start_time: DateTime<Utc>,
    pub receive_end_time: DateTime<Utc>,
    pub validity_days: i64,
    pub minimum_purchase: Option<f64>,
    pub discount_amount: Option<f64>,
    pub discount_percent: Option<f64>,
    pub max_discount: Option<f64>,
    pub description: Option<String>,
    pub total_quantity: i64,
}

/// Update voucher payload
///
/// The usage counters are deliberately absent: `claimed_count` and
/// `used_count` are owned by the claim/redeem flows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoucherUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receive_start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receive_end_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validity_days: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_purchase: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_quantity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voucher(total: i64, claimed: i64) -> Voucher {
        let now = Utc::now();
        Voucher {
            id: None,
            code: "TEST".to_string(),
            receive_start_time: now - Duration::days(1),
            receive_end_time: now + Duration::days(1),
            validity_days: 7,
            minimum_purchase: 0.0,
            discount_amount: 10.0,
            discount_percent: 0.0,
            max_discount: 0.0,
            description: None,
            total_quantity: total,
            claimed_count: claimed,
            used_count: 0,
            is_active: true,
            created_at: None,
        }
    }

    #[test]
    fn claim_window_is_enforced() {
        let v = voucher(10, 0);
        assert!(v.can_claim());

        let mut closed = voucher(10, 0);
        closed.receive_end_time = Utc::now() - Duration::hours(1);
        assert!(!closed.can_claim());

        let mut future = voucher(10, 0);
        future.receive_start_time = Utc::now() + Duration::hours(1);
        assert!(!future.can_claim());
    }

    #[test]
    fn exhausted_quota_blocks_claim_and_validity() {
        let v = voucher(5, 5);
        assert!(!v.can_claim());
        assert!(!v.is_valid(None));
    }

    #[test]
    fn inactive_voucher_is_never_valid() {
        let mut v = voucher(10, 0);
        v.is_active = false;
        assert!(!v.can_claim());
        assert!(!v.is_valid(None));
    }

    #[test]
    fn redemption_deadline_counts_from_claim_date() {
        let v = voucher(10, 0);
        let now = Utc::now();

        // Claimed 3 days ago with 7 validity days: still redeemable
        assert!(v.is_valid_at(Some(now - Duration::days(3)), now));
        // Claimed 8 days ago: past the deadline
        assert!(!v.is_valid_at(Some(now - Duration::days(8)), now));
    }

    #[test]
    fn discount_mode_must_be_exclusive() {
        assert!(Voucher::validate_discount_mode(10.0, 0.0).is_ok());
        assert!(Voucher::validate_discount_mode(0.0, 15.0).is_ok());
        assert!(Voucher::validate_discount_mode(0.0, 0.0).is_err());
        assert!(Voucher::validate_discount_mode(10.0, 15.0).is_err());
    }
}
