//! Auth API Handlers

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use shared::{ApiError, ApiResult};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{User, UserPublic, UserRole};
use crate::db::repository::UserRepository;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_PASSWORD_LEN, validate_email, validate_required_text,
};

/// Minimum password length before hashing
const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserPublic,
}

/// POST /api/auth/register - create an account and issue a token
pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<Json<AuthResponse>> {
    validate_required_text(&payload.username, "username", MAX_NAME_LEN)?;
    validate_email(&payload.email)?;
    if payload.password.len() < MIN_PASSWORD_LEN || payload.password.len() > MAX_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "password must be between {MIN_PASSWORD_LEN} and {MAX_PASSWORD_LEN} characters"
        )));
    }

    let users = UserRepository::new(state.db.clone());
    let user = users
        .create(
            payload.username.trim().to_string(),
            payload.email,
            &payload.password,
            UserRole::User,
        )
        .await?;

    let token = issue_token(&state, &user)?;

    tracing::info!(username = %user.username, "User registered");

    Ok(Json(AuthResponse {
        token,
        user: UserPublic::from(&user),
    }))
}

/// POST /api/auth/login - verify credentials and issue a token
pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let users = UserRepository::new(state.db.clone());

    let user = users
        .find_by_email(&payload.email)
        .await?
        .ok_or_else(ApiError::invalid_credentials)?;

    let verified = user
        .verify_password(&payload.password)
        .map_err(|e| ApiError::internal(format!("Password verification failed: {e}")))?;
    if !verified {
        tracing::warn!(target: "security", email = %user.email, "login_failed");
        return Err(ApiError::invalid_credentials());
    }

    let token = issue_token(&state, &user)?;

    Ok(Json(AuthResponse {
        token,
        user: UserPublic::from(&user),
    }))
}

/// GET /api/auth/me - current account profile
pub async fn me(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> ApiResult<Json<UserPublic>> {
    let users = UserRepository::new(state.db.clone());
    let user = users
        .find_by_id(&current.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Account"))?;

    Ok(Json(UserPublic::from(&user)))
}

fn issue_token(state: &ServerState, user: &User) -> ApiResult<String> {
    let user_id = user.id.as_ref().map(|id| id.to_string()).unwrap_or_default();
    state
        .jwt_service
        .generate_token(&user_id, &user.username, user.role.as_str())
        .map_err(|e| ApiError::internal(format!("Token generation failed: {e}")))
}
