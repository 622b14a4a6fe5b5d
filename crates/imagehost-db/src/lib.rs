//! Database repositories for the image metadata store.
//!
//! Repositories return clean domain models from `imagehost-core`; row structs
//! stay private to this crate.

pub mod images;

pub use images::{ImageRepository, PgImageRepository};

use imagehost_core::AppError;
use sqlx::PgPool;

/// Apply pending schema migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| AppError::Database(format!("Migration failed: {}", e)))
}
