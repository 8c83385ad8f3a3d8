//! Pricing Engine
//!
//! Pure price computation for order placement. Uses rust_decimal for
//! precise calculations, stores as f64 (2 decimal places, half-up).
//!
//! Voucher stacking is additive, not compounding: every voucher's
//! minimum-purchase check and percent computation uses the same original
//! total, never a progressively discounted one.

use crate::db::models::Voucher;
use rust_decimal::prelude::*;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Convert f64 to Decimal for calculation
#[inline]
fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Line total: unit price * quantity
pub fn line_total(unit_price: f64, quantity: i64) -> f64 {
    to_f64(to_decimal(unit_price) * Decimal::from(quantity))
}

/// Sum of line totals over (unit_price, quantity) pairs
pub fn order_original_total(lines: &[(f64, i64)]) -> f64 {
    let sum = lines
        .iter()
        .fold(Decimal::ZERO, |acc, (price, qty)| {
            acc + to_decimal(*price) * Decimal::from(*qty)
        });
    to_f64(sum)
}

/// Discount a single voucher grants against an order total.
///
/// Returns 0 below the voucher's minimum purchase. Fixed mode returns
/// `discount_amount` unconditionally (not capped by the total); percent
/// mode computes `total * percent / 100`, capped at `max_discount` when
/// the cap is set.
pub fn calculate_discount(voucher: &Voucher, order_total: f64) -> f64 {
    if order_total < voucher.minimum_purchase {
        return 0.0;
    }

    if voucher.discount_amount > 0.0 {
        return voucher.discount_amount;
    }

    if voucher.discount_percent > 0.0 {
        let amount =
            to_decimal(order_total) * to_decimal(voucher.discount_percent) / Decimal::ONE_HUNDRED;
        let capped = if voucher.max_discount > 0.0 {
            amount.min(to_decimal(voucher.max_discount))
        } else {
            amount
        };
        return to_f64(capped);
    }

    0.0
}

/// Priced order totals
#[derive(Debug, Clone, Default)]
pub struct PricingOutcome {
    pub original_total: f64,
    /// Discount per input voucher, in input order
    pub voucher_discounts: Vec<f64>,
    pub total_discount: f64,
    /// max(0, original_total - total_discount)
    pub final_total: f64,
}

/// Price an order: line items plus the vouchers to apply, in wallet
/// order. Each voucher is evaluated independently against the original
/// total; the final total clamps at zero.
pub fn price_order(lines: &[(f64, i64)], vouchers: &[&Voucher]) -> PricingOutcome {
    let original_total = order_original_total(lines);

    let mut discount_acc = Decimal::ZERO;
    let mut voucher_discounts = Vec::with_capacity(vouchers.len());

    for voucher in vouchers {
        let discount = calculate_discount(voucher, original_total);
        voucher_discounts.push(discount);
        discount_acc += to_decimal(discount);
    }

    let total_discount = to_f64(discount_acc);
    let final_total = to_f64((to_decimal(original_total) - discount_acc).max(Decimal::ZERO));

    PricingOutcome {
        original_total,
        voucher_discounts,
        total_discount,
        final_total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn fixed_voucher(amount: f64, minimum: f64) -> Voucher {
        let now = Utc::now();
        Voucher {
            id: None,
            code: "SAVE10".to_string(),
            receive_start_time: now - Duration::days(1),
            receive_end_time: now + Duration::days(1),
            validity_days: 7,
            minimum_purchase: minimum,
            discount_amount: amount,
            discount_percent: 0.0,
            max_discount: 0.0,
            description: None,
            total_quantity: 100,
            claimed_count: 0,
            used_count: 0,
            is_active: true,
            created_at: None,
        }
    }

    fn percent_voucher(percent: f64, cap: f64) -> Voucher {
        let mut v = fixed_voucher(0.0, 0.0);
        v.code = "PCT20".to_string();
        v.discount_percent = percent;
        v.max_discount = cap;
        v
    }

    #[test]
    fn original_total_sums_lines() {
        // Product at 100, order 3 units
        assert_eq!(order_original_total(&[(100.0, 3)]), 300.0);
        assert_eq!(order_original_total(&[(19.99, 2), (5.0, 1)]), 44.98);
    }

    #[test]
    fn fixed_discount_above_minimum() {
        // Fixed 20, minimum 50: total 80 applies the full 20
        let v = fixed_voucher(20.0, 50.0);
        assert_eq!(calculate_discount(&v, 80.0), 20.0);
    }

    #[test]
    fn below_minimum_grants_nothing() {
        let v = fixed_voucher(20.0, 50.0);
        assert_eq!(calculate_discount(&v, 40.0), 0.0);
    }

    #[test]
    fn percent_discount_is_capped() {
        // 20% of 100 is 20, capped at 15
        let v = percent_voucher(20.0, 15.0);
        assert_eq!(calculate_discount(&v, 100.0), 15.0);

        // Under the cap, the raw percentage applies
        assert_eq!(calculate_discount(&v, 50.0), 10.0);
    }

    #[test]
    fn percent_discount_uncapped_when_cap_is_zero() {
        let v = percent_voucher(20.0, 0.0);
        assert_eq!(calculate_discount(&v, 250.0), 50.0);
    }

    #[test]
    fn discount_is_deterministic() {
        let v = percent_voucher(33.0, 0.0);
        let first = calculate_discount(&v, 99.99);
        for _ in 0..10 {
            assert_eq!(calculate_discount(&v, 99.99), first);
        }
    }

    #[test]
    fn no_vouchers_means_no_discount() {
        let outcome = price_order(&[(100.0, 3)], &[]);
        assert_eq!(outcome.original_total, 300.0);
        assert_eq!(outcome.total_discount, 0.0);
        assert_eq!(outcome.final_total, 300.0);
    }

    #[test]
    fn stacking_is_additive_against_the_original_total() {
        // Two 20% vouchers on 100: each computes against 100, not 80
        let a = percent_voucher(20.0, 0.0);
        let b = percent_voucher(20.0, 0.0);
        let outcome = price_order(&[(100.0, 1)], &[&a, &b]);
        assert_eq!(outcome.voucher_discounts, vec![20.0, 20.0]);
        assert_eq!(outcome.total_discount, 40.0);
        assert_eq!(outcome.final_total, 60.0);
    }

    #[test]
    fn final_total_clamps_at_zero() {
        let a = fixed_voucher(80.0, 0.0);
        let b = fixed_voucher(80.0, 0.0);
        let outcome = price_order(&[(100.0, 1)], &[&a, &b]);
        assert_eq!(outcome.total_discount, 160.0);
        assert_eq!(outcome.final_total, 0.0);
    }

    #[test]
    fn scenario_fixed_voucher_on_80() {
        // SAVE10: fixed 20, minimum 50; cart total 80 -> final 60
        let v = fixed_voucher(20.0, 50.0);
        let outcome = price_order(&[(80.0, 1)], &[&v]);
        assert_eq!(outcome.total_discount, 20.0);
        assert_eq!(outcome.final_total, 60.0);
    }

    #[test]
    fn scenario_capped_percent_on_100() {
        // PCT20: percent 20, max 15; cart total 100 -> final 85
        let v = percent_voucher(20.0, 15.0);
        let outcome = price_order(&[(100.0, 1)], &[&v]);
        assert_eq!(outcome.total_discount, 15.0);
        assert_eq!(outcome.final_total, 85.0);
    }
}
