//! Startup bootstrap
//!
//! Idempotent "ensure exists" setup for the administrative account.
//! Runs on every start; an existing account is never modified.

use crate::core::ServerState;
use crate::db::models::UserRole;
use crate::db::repository::UserRepository;
use shared::{ApiError, ApiResult};

/// Ensure the configured admin account exists.
pub async fn ensure_admin_account(state: &ServerState) -> ApiResult<()> {
    let users = UserRepository::new(state.db.clone());
    let email = state.config.admin_email.trim().to_lowercase();

    if email.is_empty() {
        tracing::warn!("ADMIN_EMAIL is empty, skipping admin bootstrap");
        return Ok(());
    }

    if users
        .find_by_email(&email)
        .await
        .map_err(ApiError::from)?
        .is_some()
    {
        tracing::debug!(email = %email, "Admin account already exists");
        return Ok(());
    }

    if state.config.is_production() && state.config.admin_password == "change-me-admin" {
        return Err(ApiError::internal(
            "ADMIN_PASSWORD must be set in production",
        ));
    }
    if !state.config.is_production() && state.config.admin_password == "change-me-admin" {
        tracing::warn!("Using the default admin password; set ADMIN_PASSWORD");
    }

    let admin = users
        .create(
            "admin".to_string(),
            email.clone(),
            &state.config.admin_password,
            UserRole::Admin,
        )
        .await
        .map_err(ApiError::from)?;

    tracing::info!(
        email = %email,
        id = %admin.id.map(|id| id.to_string()).unwrap_or_default(),
        "Admin account created"
    );

    Ok(())
}
