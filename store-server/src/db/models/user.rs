//! User Model

use super::serde_helpers;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

pub type UserId = RecordId;

/// User roles
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    User,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::User => "USER",
        }
    }
}

/// A user's personal claim of a voucher (voucher wallet entry)
///
/// An account never holds two *unused* entries for the same voucher at the
/// same time; the claim flow enforces this with a conditional update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserVoucherEntry {
    #[serde(with = "serde_helpers::record_id")]
    pub voucher: RecordId,
    pub claimed_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "serde_helpers::bool_false")]
    pub is_used: bool,
}

/// User model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub id: Option<UserId>,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub hash_pass: String,
    pub role: UserRole,
    pub address: Option<String>,
    /// Voucher wallet, embedded in the account document
    #[serde(default)]
    pub vouchers: Vec<UserVoucherEntry>,
    #[serde(
        default = "default_true",
        deserialize_with = "serde_helpers::bool_true"
    )]
    pub is_verified: bool,
    pub created_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

impl User {
    /// Verify password using argon2
    pub fn verify_password(&self, password: &str) -> Result<bool, argon2::password_hash::Error> {
        use argon2::{
            Argon2,
            password_hash::{PasswordHash, PasswordVerifier},
        };

        let parsed_hash = PasswordHash::new(&self.hash_pass)?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash password using argon2
    pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
        use argon2::{
            Argon2,
            password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
        };

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let password_hash = argon2.hash_password(password.as_bytes(), &salt)?;
        Ok(password_hash.to_string())
    }

    /// The unused wallet entry for a voucher, if any
    pub fn unused_wallet_entry(&self, voucher_id: &RecordId) -> Option<&UserVoucherEntry> {
        self.vouchers
            .iter()
            .find(|e| !e.is_used && &e.voucher == voucher_id)
    }
}

/// Public view of a user (no password hash, no wallet internals)
#[derive(Debug, Clone, Serialize)]
pub struct UserPublic {
    pub id: String,
    pub email: String,
    pub username: String,
    pub role: UserRole,
    pub address: Option<String>,
    pub is_verified: bool,
}

impl From<&User> for UserPublic {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.as_ref().map(|id| id.to_string()).unwrap_or_default(),
            email: user.email.clone(),
            username: user.username.clone(),
            role: user.role,
            address: user.address.clone(),
            is_verified: user.is_verified,
        }
    }
}
