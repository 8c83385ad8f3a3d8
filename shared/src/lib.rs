//! Shared types for the store backend
//!
//! Common types used across crates: error types, response envelope,
//! pagination.

pub mod error;
pub mod response;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiError, ApiErrorCode, ApiResult};
pub use response::{ApiResponse, PaginatedResponse, Pagination};
