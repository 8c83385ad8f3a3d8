//! JWT Extractor
//!
//! Custom extractor for automatically validating JWT tokens

use axum::{extract::FromRequestParts, http::request::Parts};
use shared::ApiError;

use crate::auth::{CurrentUser, JwtService};
use crate::core::ServerState;

/// JWT auth extractor
///
/// Use this extractor in protected handlers to automatically validate the
/// JWT and extract the CurrentUser
impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        // Check if already extracted (from middleware)
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        // Extract Authorization header
        let auth_header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let token = match auth_header {
            Some(header) => JwtService::extract_from_header(header)
                .ok_or_else(|| ApiError::invalid_token("Invalid authorization header"))?,
            None => {
                tracing::warn!(target: "security", uri = %parts.uri, "auth_missing");
                return Err(ApiError::Unauthorized);
            }
        };

        // Validate token
        let jwt_service = state.get_jwt_service();
        match jwt_service.validate_token(token) {
            Ok(claims) => {
                let user = CurrentUser::from(claims);

                // Store in extensions for potential reuse
                parts.extensions.insert(user.clone());

                Ok(user)
            }
            Err(e) => {
                tracing::warn!(target: "security", error = %e, uri = %parts.uri, "auth_failed");

                match e {
                    crate::auth::JwtError::ExpiredToken => Err(ApiError::TokenExpired),
                    _ => Err(ApiError::invalid_token("Invalid token")),
                }
            }
        }
    }
}
