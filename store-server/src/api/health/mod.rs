//! Health check route
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /api/health | GET | none |

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::core::ServerState;

/// Health check router - public (no auth)
pub fn router() -> Router<ServerState> {
    Router::new().route("/api/health", get(health))
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    /// Status (healthy | degraded)
    status: &'static str,
    /// Version
    version: &'static str,
    /// Database reachability
    database: &'static str,
}

/// Basic health check with a database ping
pub async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    let database = match state.db.query("RETURN 1").await {
        Ok(_) => "ok",
        Err(e) => {
            tracing::error!(error = %e, "Health check database ping failed");
            "error"
        }
    };

    Json(HealthResponse {
        status: if database == "ok" { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database,
    })
}
