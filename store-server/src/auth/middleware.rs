//! Authentication middleware
//!
//! Axum middleware for JWT authentication and role checks.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use shared::ApiError;

use crate::auth::{CurrentUser, JwtService};
use crate::core::ServerState;

/// Authentication middleware - requires a logged-in caller
///
/// Extracts and validates the JWT from `Authorization: Bearer <token>`.
/// On success, injects [`CurrentUser`] into the request extensions.
///
/// # Paths that skip authentication
///
/// - `OPTIONS *` (CORS preflight)
/// - non-`/api/` paths (fall through to 404)
/// - `/api/health`
/// - `/api/auth/login`, `/api/auth/register`
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let path = req.uri().path();

    // Allow CORS preflight OPTIONS requests through
    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    // Non-API routes skip authentication (let them 404 normally)
    if !path.starts_with("/api/") {
        return Ok(next.run(req).await);
    }

    // Public API routes skip authentication
    let is_public_api_route = path == "/api/auth/login"
        || path == "/api/auth/register"
        || path.starts_with("/api/health");
    if is_public_api_route {
        return Ok(next.run(req).await);
    }

    let jwt_service = state.get_jwt_service();
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) => JwtService::extract_from_header(header)
            .ok_or_else(|| ApiError::invalid_token("Invalid authorization header"))?,
        None => {
            tracing::warn!(target: "security", uri = %req.uri(), "auth_missing");
            return Err(ApiError::Unauthorized);
        }
    };

    match jwt_service.validate_token(token) {
        Ok(claims) => {
            let user = CurrentUser::from(claims);
            req.extensions_mut().insert(user);
            Ok(next.run(req).await)
        }
        Err(e) => {
            tracing::warn!(target: "security", error = %e, uri = %req.uri(), "auth_failed");

            match e {
                crate::auth::JwtError::ExpiredToken => Err(ApiError::TokenExpired),
                _ => Err(ApiError::invalid_token("Invalid token")),
            }
        }
    }
}

/// Admin middleware - requires the admin role
///
/// Checks `CurrentUser::is_admin()`; non-admins get 403 Forbidden.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, ApiError> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or(ApiError::Unauthorized)?;
    if !user.is_admin() {
        tracing::warn!(
            target: "security",
            user_id = %user.id,
            username = %user.username,
            "admin_required"
        );
        return Err(ApiError::forbidden("Admin role required"));
    }

    Ok(next.run(req).await)
}
