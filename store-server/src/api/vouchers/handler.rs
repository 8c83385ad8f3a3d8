//! Voucher API Handlers
//!
//! Claiming is a two-document mutation (voucher counter + user wallet)
//! with no transaction underneath: the quota is taken first through a
//! conditional increment, and given back if the wallet append is refused.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use shared::{ApiError, ApiResult};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{User, UserVoucherEntry, Voucher, VoucherCreate, VoucherUpdate};
use crate::db::repository::{UserRepository, VoucherRepository};

/// GET /api/vouchers - all vouchers, newest first
pub async fn list(State(state): State<ServerState>) -> ApiResult<Json<Vec<Voucher>>> {
    let repo = VoucherRepository::new(state.db.clone());
    let vouchers = repo.find_all().await?;
    Ok(Json(vouchers))
}

/// GET /api/vouchers/available - vouchers currently claimable
pub async fn available(State(state): State<ServerState>) -> ApiResult<Json<Vec<Voucher>>> {
    let repo = VoucherRepository::new(state.db.clone());
    let vouchers = repo.find_claimable().await?;
    Ok(Json(vouchers))
}

/// GET /api/vouchers/{id} - single voucher
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Voucher>> {
    let repo = VoucherRepository::new(state.db.clone());
    let voucher = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Voucher {}", id)))?;
    Ok(Json(voucher))
}

/// GET /api/vouchers/code/{code} - lookup by code
pub async fn get_by_code(
    State(state): State<ServerState>,
    Path(code): Path<String>,
) -> ApiResult<Json<Voucher>> {
    let repo = VoucherRepository::new(state.db.clone());
    let voucher = repo
        .find_by_code(&code)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Voucher {}", code.to_uppercase())))?;
    Ok(Json(voucher))
}

/// POST /api/vouchers - create voucher (admin)
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<VoucherCreate>,
) -> ApiResult<Json<Voucher>> {
    let repo = VoucherRepository::new(state.db.clone());
    let voucher = repo.create(payload).await?;

    tracing::info!(code = %voucher.code, quantity = voucher.total_quantity, "Voucher created");

    Ok(Json(voucher))
}

/// PUT /api/vouchers/{id} - update voucher (admin; counters untouched)
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<VoucherUpdate>,
) -> ApiResult<Json<Voucher>> {
    let repo = VoucherRepository::new(state.db.clone());
    let voucher = repo.update(&id, payload).await?;
    Ok(Json(voucher))
}

/// DELETE /api/vouchers/{id} - delete voucher (admin)
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> ApiResult<Json<bool>> {
    let repo = VoucherRepository::new(state.db.clone());
    repo.delete(&id).await?;
    Ok(Json(true))
}

/// Claim response payload
#[derive(Debug, Serialize)]
pub struct ClaimResponse {
    pub message: &'static str,
    pub voucher: Voucher,
    pub expires_at: DateTime<Utc>,
}

/// POST /api/vouchers/{id}/claim - claim a voucher into the caller's wallet
pub async fn claim(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<ClaimResponse>> {
    let vouchers = VoucherRepository::new(state.db.clone());
    let users = UserRepository::new(state.db.clone());

    let voucher = vouchers
        .find_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Voucher {}", id)))?;
    let voucher_id = voucher
        .id
        .clone()
        .ok_or_else(|| ApiError::internal("Voucher record has no id"))?;

    // Friendly prechecks with distinct messages; the authoritative gate
    // is the conditional increment below
    if !voucher.can_claim() {
        if !voucher.is_active {
            return Err(ApiError::business_rule("Voucher is not active"));
        }
        if voucher.claimed_count >= voucher.total_quantity {
            return Err(ApiError::business_rule("Voucher is out of stock"));
        }
        return Err(ApiError::business_rule(
            "Voucher is not available for claiming at this time",
        ));
    }

    let user = users
        .find_by_id(&current.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Account"))?;
    let user_id = user
        .id
        .clone()
        .ok_or_else(|| ApiError::internal("User record has no id"))?;

    if user.unused_wallet_entry(&voucher_id).is_some() {
        return Err(ApiError::business_rule(
            "You have already claimed this voucher",
        ));
    }

    // Take one claim slot; the conditional update is what makes two
    // concurrent claims of the last unit impossible
    let claimed = vouchers
        .claim_increment(&voucher_id)
        .await?
        .ok_or_else(|| ApiError::business_rule("Voucher is out of stock"))?;

    let claimed_at = Utc::now();
    let entry = UserVoucherEntry {
        voucher: voucher_id.clone(),
        claimed_at,
        is_used: false,
    };

    // Append to the wallet, refused when an unused entry raced in; on
    // refusal the claim slot is given back
    match users.append_wallet_entry(&user_id, entry).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            vouchers.claim_decrement(&voucher_id).await?;
            return Err(ApiError::business_rule(
                "You have already claimed this voucher",
            ));
        }
        Err(e) => {
            if let Err(undo_err) = vouchers.claim_decrement(&voucher_id).await {
                tracing::error!(
                    voucher = %voucher_id,
                    error = %undo_err,
                    "Compensation failed: claimed_count"
                );
            }
            return Err(e.into());
        }
    }

    tracing::info!(username = %user.username, code = %claimed.code, "Voucher claimed");

    let expires_at = claimed_at + Duration::days(claimed.validity_days);
    Ok(Json(ClaimResponse {
        message: "Voucher claimed successfully",
        voucher: claimed,
        expires_at,
    }))
}

/// One wallet entry with the voucher document attached
#[derive(Debug, Serialize)]
pub struct WalletEntryView {
    pub voucher: Voucher,
    pub claimed_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// GET /api/vouchers/user/{user_id} - a user's valid, unused wallet entries
pub async fn user_vouchers(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<WalletEntryView>>> {
    if !current.is_admin() && current.id != user_id {
        return Err(ApiError::forbidden("You can only view your own vouchers"));
    }

    let users = UserRepository::new(state.db.clone());
    let vouchers = VoucherRepository::new(state.db.clone());

    let user: User = users
        .find_by_id(&user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    let mut entries = Vec::new();
    for entry in user.vouchers.iter().filter(|e| !e.is_used) {
        let Some(voucher) = vouchers.find_by_id(&entry.voucher.to_string()).await? else {
            continue;
        };
        if !voucher.is_valid(Some(entry.claimed_at)) {
            continue;
        }
        let expires_at = entry.claimed_at + Duration::days(voucher.validity_days);
        entries.push(WalletEntryView {
            voucher,
            claimed_at: entry.claimed_at,
            expires_at,
        });
    }

    Ok(Json(entries))
}
