//! Store Server - e-commerce backend
//!
//! # Architecture
//!
//! The server is an axum application over an embedded SurrealDB document
//! store. Most endpoints are plain CRUD; the interesting part is the
//! order-placement workflow in [`checkout`], which must keep product
//! stock, voucher usage counters and user voucher wallets consistent
//! without multi-document transactions.
//!
//! # Module structure
//!
//! ```text
//! store-server/src/
//! ├── core/          # Config, state, server, bootstrap
//! ├── auth/          # JWT authentication, middleware
//! ├── db/            # Database layer (models + repositories)
//! ├── checkout/      # Order placement + pricing engine
//! ├── api/           # HTTP routes and handlers
//! └── utils/         # Logger, validation helpers
//! ```

pub mod api;
pub mod auth;
pub mod checkout;
pub mod core;
pub mod db;
pub mod utils;

// Re-export public types
pub use auth::{CurrentUser, JwtService};
pub use crate::core::{Config, Server, ServerState};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
