//! Database Module
//!
//! Embedded SurrealDB storage: RocksDB on disk in production, in-memory
//! engine for tests.

pub mod models;
pub mod repository;

use shared::ApiError;
use std::path::Path;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem, RocksDb};

const NAMESPACE: &str = "store";
const DATABASE: &str = "store";

/// Open the on-disk database and apply schema definitions
pub async fn connect(db_dir: &Path) -> Result<Surreal<Db>, ApiError> {
    let db: Surreal<Db> = Surreal::new::<RocksDb>(db_dir)
        .await
        .map_err(|e| ApiError::database(format!("Failed to open database: {e}")))?;

    db.use_ns(NAMESPACE)
        .use_db(DATABASE)
        .await
        .map_err(|e| ApiError::database(format!("Failed to select namespace: {e}")))?;

    define_schema(&db).await?;

    tracing::info!(path = %db_dir.display(), "Database connection established (SurrealDB/RocksDB)");
    Ok(db)
}

/// Open an in-memory database (tests)
pub async fn connect_in_memory() -> Result<Surreal<Db>, ApiError> {
    let db: Surreal<Db> = Surreal::new::<Mem>(())
        .await
        .map_err(|e| ApiError::database(format!("Failed to open in-memory database: {e}")))?;

    db.use_ns(NAMESPACE)
        .use_db(DATABASE)
        .await
        .map_err(|e| ApiError::database(format!("Failed to select namespace: {e}")))?;

    define_schema(&db).await?;
    Ok(db)
}

/// Idempotent schema definitions (unique indexes on natural keys)
async fn define_schema(db: &Surreal<Db>) -> Result<(), ApiError> {
    db.query(
        r#"
        DEFINE INDEX IF NOT EXISTS idx_user_email ON TABLE user COLUMNS email UNIQUE;
        DEFINE INDEX IF NOT EXISTS idx_voucher_code ON TABLE voucher COLUMNS code UNIQUE;
        DEFINE INDEX IF NOT EXISTS idx_order_seq_id ON TABLE order COLUMNS seq_id UNIQUE;
        DEFINE INDEX IF NOT EXISTS idx_product_legacy_id ON TABLE product COLUMNS legacy_id;
        DEFINE INDEX IF NOT EXISTS idx_cart_user ON TABLE cart COLUMNS user;
        "#,
    )
    .await
    .map_err(|e| ApiError::database(format!("Failed to define schema: {e}")))?;

    Ok(())
}
