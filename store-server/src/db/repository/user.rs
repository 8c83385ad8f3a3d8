//! User Repository
//!
//! Account CRUD plus the voucher-wallet side of the voucher ledger. The
//! wallet lives embedded in the user document, so every wallet mutation
//! is a single-document update; the conditional forms below keep the
//! "one unused claim per voucher" invariant under concurrency.

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{User, UserId, UserRole, UserVoucherEntry};
use chrono::{DateTime, Utc};
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

#[derive(Clone)]
pub struct UserRepository {
    base: BaseRepository,
}

impl UserRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find user by record id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<User>> {
        let record_id: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid user ID: {}", id)))?;
        let user: Option<User> = self.base.db().select(record_id).await?;
        Ok(user)
    }

    /// Find user by email
    pub async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let email = email.trim().to_lowercase();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM user WHERE email = $email LIMIT 1")
            .bind(("email", email))
            .await?;
        let users: Vec<User> = result.take(0)?;
        Ok(users.into_iter().next())
    }

    /// Create a new user account
    pub async fn create(
        &self,
        username: String,
        email: String,
        password: &str,
        role: UserRole,
    ) -> RepoResult<User> {
        let email = email.trim().to_lowercase();

        // Check duplicate email
        if self.find_by_email(&email).await?.is_some() {
            return Err(RepoError::Duplicate(format!("Email '{}'", email)));
        }

        // Hash password
        let hash_pass = User::hash_password(password)
            .map_err(|e| RepoError::Database(format!("Failed to hash password: {}", e)))?;

        // hash_pass is skip_serializing, so an explicit SET is required
        // (content() would silently drop the hash)
        let mut result = self
            .base
            .db()
            .query(
                r#"CREATE user SET
                    email = $email,
                    username = $username,
                    hash_pass = $hash_pass,
                    role = $role,
                    address = NONE,
                    vouchers = [],
                    is_verified = true,
                    created_at = $created_at
                RETURN AFTER"#,
            )
            .bind(("email", email))
            .bind(("username", username))
            .bind(("hash_pass", hash_pass))
            .bind(("role", role))
            .bind(("created_at", Utc::now()))
            .await?;

        let created: Option<User> = result.take(0)?;
        created.ok_or_else(|| RepoError::Database("Failed to create user".to_string()))
    }

    // =========================================================================
    // Voucher wallet
    // =========================================================================

    /// Append a wallet entry, guarded against a second unused claim of
    /// the same voucher. Returns the updated user, or None when the
    /// account already holds an unused entry.
    pub async fn append_wallet_entry(
        &self,
        user_id: &UserId,
        entry: UserVoucherEntry,
    ) -> RepoResult<Option<User>> {
        let voucher_ref = entry.voucher.to_string();
        let mut result = self
            .base
            .db()
            .query(
                "UPDATE $user SET vouchers += $entry \
                 WHERE array::len(vouchers[WHERE voucher = $voucher AND is_used = false]) = 0 \
                 RETURN AFTER",
            )
            .bind(("user", user_id.clone()))
            .bind(("entry", entry))
            .bind(("voucher", voucher_ref))
            .await?;
        let updated: Vec<User> = result.take(0)?;
        Ok(updated.into_iter().next())
    }

    /// Mark the unused wallet entry for a voucher as used. Conditional on
    /// an unused entry existing; returns false when there was none (a
    /// concurrent order spent it first).
    pub async fn mark_voucher_used(
        &self,
        user_id: &UserId,
        voucher_id: &RecordId,
    ) -> RepoResult<bool> {
        let voucher_ref = voucher_id.to_string();
        let mut result = self
            .base
            .db()
            .query(
                "UPDATE $user \
                 SET vouchers[WHERE voucher = $voucher AND is_used = false].is_used = true \
                 WHERE array::len(vouchers[WHERE voucher = $voucher AND is_used = false]) > 0 \
                 RETURN AFTER",
            )
            .bind(("user", user_id.clone()))
            .bind(("voucher", voucher_ref))
            .await?;
        let updated: Vec<User> = result.take(0)?;
        Ok(!updated.is_empty())
    }

    /// Revert a wallet entry to unused (compensation for a failed
    /// placement). The entry is addressed by (voucher, claimed_at) so
    /// that older, genuinely spent entries stay used.
    pub async fn unmark_voucher_used(
        &self,
        user_id: &UserId,
        voucher_id: &RecordId,
        claimed_at: DateTime<Utc>,
    ) -> RepoResult<()> {
        let voucher_ref = voucher_id.to_string();
        self.base
            .db()
            .query(
                "UPDATE $user \
                 SET vouchers[WHERE voucher = $voucher AND claimed_at = $claimed_at].is_used = false",
            )
            .bind(("user", user_id.clone()))
            .bind(("voucher", voucher_ref))
            .bind(("claimed_at", claimed_at))
            .await?;
        Ok(())
    }
}
