//! Server configuration

use crate::auth::JwtConfig;

/// Server configuration
///
/// # Environment variables
///
/// Every setting can be overridden through the environment:
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | DATA_DIR | /var/lib/store | Working directory (database, logs) |
/// | HTTP_PORT | 3000 | HTTP API port |
/// | ENVIRONMENT | development | development \| staging \| production |
/// | JWT_SECRET | (generated in dev) | JWT signing secret |
/// | JWT_EXPIRATION_MINUTES | 1440 | Access token lifetime |
/// | ADMIN_EMAIL | admin@store.local | Bootstrap admin account email |
/// | ADMIN_PASSWORD | (dev default) | Bootstrap admin account password |
/// | LOG_LEVEL | info | Tracing level filter |
///
/// # Example
///
/// ```ignore
/// DATA_DIR=/data/store HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for database and log files
    pub data_dir: String,
    /// HTTP API port
    pub http_port: u16,
    /// JWT configuration
    pub jwt: JwtConfig,
    /// Runtime environment: development | staging | production
    pub environment: String,
    /// Bootstrap admin account email
    pub admin_email: String,
    /// Bootstrap admin account password
    pub admin_password: String,
}

impl Config {
    /// Load configuration from the environment, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "/var/lib/store".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            jwt: JwtConfig::default(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            admin_email: std::env::var("ADMIN_EMAIL")
                .unwrap_or_else(|_| "admin@store.local".into()),
            admin_password: std::env::var("ADMIN_PASSWORD")
                .unwrap_or_else(|_| "change-me-admin".into()),
        }
    }

    /// Override the working directory and port (tests)
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.data_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// Whether this is a production deployment
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Whether this is a development deployment
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Path of the database directory
    pub fn database_dir(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.data_dir).join("database")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
