//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! wrapsody migrate
//! ```
//!
//! # Environment Variables
//!
//! - `USERS_DATABASE_URL` - `PostgreSQL` connection string for profile documents
//!   (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Stored in `crates/storefront/migrations/`:
//! ```text
//! migrations/
//! └── 20260301000001_create_storefront_users.sql
//! ```

use wrapsody_storefront::db::{self, RepositoryError};
use wrapsody_storefront::{AppError, StorefrontConfig};

/// Run profile database migrations.
///
/// # Errors
///
/// Returns an error if no database is configured, the connection fails, or a
/// migration fails.
pub async fn run(config: &StorefrontConfig) -> Result<(), AppError> {
    let Some(database_url) = &config.users_database_url else {
        return Err(AppError::BadRequest(
            "Set USERS_DATABASE_URL (or DATABASE_URL) to run migrations.".to_string(),
        ));
    };

    tracing::info!("Connecting to users database...");
    let pool = db::create_pool(database_url)
        .await
        .map_err(RepositoryError::from)?;

    tracing::info!("Running storefront migrations...");
    sqlx::migrate!("../storefront/migrations")
        .run(&pool)
        .await
        .map_err(|e| RepositoryError::Database(sqlx::Error::from(e)))?;

    tracing::info!("Storefront migrations complete!");
    Ok(())
}
