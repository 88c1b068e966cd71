use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors from DatabaseManager
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Invalid table name: {0}")]
    InvalidTableName(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Builds connection pools and guards identifiers that end up in SQL text
pub struct DatabaseManager;

impl DatabaseManager {
    /// Open a pool from config. The pool is owned by the caller and handed to
    /// whatever needs it; nothing is cached here.
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let url = config
            .url
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;

        let parsed = url::Url::parse(url).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        if !matches!(parsed.scheme(), "postgres" | "postgresql") {
            return Err(DatabaseError::InvalidDatabaseUrl);
        }

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!(
            "Connected to database {} (max_connections={})",
            parsed.path().trim_start_matches('/'),
            config.max_connections
        );
        Ok(pool)
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    /// Quote SQL identifier to prevent injection
    pub fn quote_identifier(name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    /// Table names come from deployment config. Accepts an ASCII letter or
    /// underscore followed by up to 62 of [a-zA-Z0-9_-].
    pub fn is_valid_table_name(name: &str) -> bool {
        let mut chars = name.chars();
        let Some(first) = chars.next() else {
            return false;
        };
        (first.is_ascii_alphabetic() || first == '_')
            && name.len() <= 63
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    }

    pub fn validated_table_name(name: &str) -> Result<String, DatabaseError> {
        if Self::is_valid_table_name(name) {
            Ok(name.to_string())
        } else {
            Err(DatabaseError::InvalidTableName(name.to_string()))
        }
    }
}
