//! Order Repository
//!
//! The order ledger: immutable order records with a human-readable,
//! strictly increasing sequence id. After creation only `status` may
//! change.

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Order, OrderStatus};
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const ORDER_TABLE: &str = "order";

/// Minimum zero-padding of the numeric suffix in a sequence id
const SEQ_PAD: usize = 3;

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all orders, newest first
    pub async fn find_all(&self) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query("SELECT * FROM order ORDER BY created_at DESC")
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// Find an order by record id or by sequence id ("ORD001")
    pub async fn find_by_ref(&self, order_ref: &str) -> RepoResult<Option<Order>> {
        if let Ok(record_id) = order_ref.parse::<RecordId>() {
            let order: Option<Order> = self.base.db().select(record_id).await?;
            if order.is_some() {
                return Ok(order);
            }
        }

        let seq_id = order_ref.trim().to_uppercase();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM order WHERE seq_id = $seq_id LIMIT 1")
            .bind(("seq_id", seq_id))
            .await?;
        let orders: Vec<Order> = result.take(0)?;
        Ok(orders.into_iter().next())
    }

    /// Find all orders placed by a user, newest first
    pub async fn find_by_user(&self, user_id: &RecordId) -> RepoResult<Vec<Order>> {
        let user_ref = user_id.to_string();
        let orders: Vec<Order> = self
            .base
            .db()
            .query("SELECT * FROM order WHERE user = $user ORDER BY created_at DESC")
            .bind(("user", user_ref))
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// Allocate the next sequence id by scanning existing ids
    pub async fn next_seq_id(&self) -> RepoResult<String> {
        let seq_ids: Vec<String> = self
            .base
            .db()
            .query("SELECT VALUE seq_id FROM order")
            .await?
            .take(0)?;
        Ok(next_seq_from(&seq_ids))
    }

    /// Insert the immutable order record
    pub async fn create(&self, order: Order) -> RepoResult<Order> {
        let created: Result<Option<Order>, surrealdb::Error> =
            self.base.db().create(ORDER_TABLE).content(order).await;

        match created {
            Ok(Some(order)) => Ok(order),
            Ok(None) => Err(RepoError::Database("Failed to create order".to_string())),
            Err(e) => {
                let msg = e.to_string();
                // Unique index violation on seq_id: a concurrent placement
                // allocated the same sequence number
                if msg.contains("idx_order_seq_id") {
                    Err(RepoError::Duplicate("Order sequence id".to_string()))
                } else {
                    Err(RepoError::Database(msg))
                }
            }
        }
    }

    /// Update the status of an order (the only permitted mutation)
    pub async fn update_status(&self, id: &RecordId, status: OrderStatus) -> RepoResult<Order> {
        let mut result = self
            .base
            .db()
            .query("UPDATE $id SET status = $status RETURN AFTER")
            .bind(("id", id.clone()))
            .bind(("status", status))
            .await?;
        let orders: Vec<Order> = result.take(0)?;
        orders
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", id)))
    }

    /// Delete the order record. Stock restoration is orchestrated by the
    /// caller, which knows the prior status.
    pub async fn delete(&self, id: &RecordId) -> RepoResult<()> {
        let result: Option<Order> = self.base.db().delete(id.clone()).await?;
        if result.is_none() {
            return Err(RepoError::NotFound(format!("Order {} not found", id)));
        }
        Ok(())
    }
}

/// Compute the next sequence id from existing ids.
///
/// Both the current "ORD###" format and legacy bare-numeric ids count
/// toward the maximum.
pub fn next_seq_from(seq_ids: &[String]) -> String {
    let max = seq_ids
        .iter()
        .filter_map(|id| {
            let id = id.trim();
            match id.strip_prefix("ORD") {
                Some(suffix) => suffix.parse::<u64>().ok(),
                None => id.parse::<u64>().ok(),
            }
        })
        .max()
        .unwrap_or(0);

    format!("ORD{:0pad$}", max + 1, pad = SEQ_PAD)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn first_id_is_ord001() {
        assert_eq!(next_seq_from(&[]), "ORD001");
    }

    #[test]
    fn increments_past_the_maximum() {
        assert_eq!(next_seq_from(&ids(&["ORD001", "ORD002"])), "ORD003");
        assert_eq!(next_seq_from(&ids(&["ORD002", "ORD001"])), "ORD003");
    }

    #[test]
    fn legacy_bare_numeric_ids_count() {
        assert_eq!(next_seq_from(&ids(&["ORD001", "ORD002", "5"])), "ORD006");
    }

    #[test]
    fn pads_to_three_digits_minimum() {
        assert_eq!(next_seq_from(&ids(&["ORD099"])), "ORD100");
        assert_eq!(next_seq_from(&ids(&["ORD999"])), "ORD1000");
    }

    #[test]
    fn unparseable_ids_are_ignored() {
        assert_eq!(next_seq_from(&ids(&["draft", "ORDx", "ORD007"])), "ORD008");
    }
}
