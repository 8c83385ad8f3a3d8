//! Server state

use std::sync::Arc;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::auth::JwtService;
use crate::core::{Config, bootstrap};
use crate::db;
use shared::ApiResult;

/// Server state - shared references to every service
///
/// Cloning is cheap (Arc / handle clones) so the state is passed by
/// value into axum.
///
/// | Field | Type | Description |
/// |-------|------|-------------|
/// | config | Config | Configuration (immutable) |
/// | db | Surreal<Db> | Embedded database handle |
/// | jwt_service | Arc<JwtService> | JWT signing/validation |
#[derive(Clone, Debug)]
pub struct ServerState {
    /// Server configuration
    pub config: Config,
    /// Embedded database (SurrealDB)
    pub db: Surreal<Db>,
    /// JWT service (shared ownership)
    pub jwt_service: Arc<JwtService>,
}

impl ServerState {
    /// Initialize the server state
    ///
    /// In order:
    /// 1. working directory structure
    /// 2. database (DATA_DIR/database) + schema definitions
    /// 3. JWT service
    /// 4. bootstrap accounts (idempotent ensure-exists)
    pub async fn initialize(config: &Config) -> ApiResult<Self> {
        let db_dir = config.database_dir();
        std::fs::create_dir_all(&db_dir).map_err(|e| {
            shared::ApiError::internal(format!("Failed to create data directory: {e}"))
        })?;

        let db = db::connect(&db_dir).await?;
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));

        let state = Self {
            config: config.clone(),
            db,
            jwt_service,
        };

        bootstrap::ensure_admin_account(&state).await?;

        Ok(state)
    }

    /// Initialize with an in-memory database (tests)
    pub async fn initialize_in_memory(config: &Config) -> ApiResult<Self> {
        let db = db::connect_in_memory().await?;
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));

        let state = Self {
            config: config.clone(),
            db,
            jwt_service,
        };

        bootstrap::ensure_admin_account(&state).await?;

        Ok(state)
    }

    /// Get the database handle
    pub fn get_db(&self) -> Surreal<Db> {
        self.db.clone()
    }

    /// Get the JWT service
    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }
}
