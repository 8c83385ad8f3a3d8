//! Utility modules

pub mod logger;
pub mod validation;

// Re-export unified error types from shared
pub use shared::{ApiError, ApiResult};
