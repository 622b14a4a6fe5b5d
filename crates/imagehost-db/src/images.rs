use async_trait::async_trait;
use chrono::{DateTime, Utc};
use imagehost_core::models::ImageRecord;
use imagehost_core::AppError;
use sqlx::{PgPool, Postgres};

/// Trait for image metadata lookups
///
/// This abstracts the database implementation so the transformation service
/// can be exercised against an in-memory store in tests.
#[async_trait]
pub trait ImageRepository: Send + Sync {
    /// Resolve an image by id. Soft-deleted rows are returned as-is; the
    /// caller decides how to treat the `deleted` flag.
    async fn find_by_id(&self, id: i64) -> Result<Option<ImageRecord>, AppError>;

    /// Bump the access counter for an image.
    async fn increment_access(&self, id: i64) -> Result<(), AppError>;
}

/// Row shape for the `images` table. Kept private; mapped to the clean
/// domain model before leaving this crate.
#[derive(Debug, sqlx::FromRow)]
struct ImageRow {
    id: i64,
    user_id: i64,
    name: String,
    original_name: String,
    path: String,
    size: i64,
    width: i32,
    height: i32,
    media_type: String,
    access_count: i64,
    deleted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ImageRow {
    fn into_record(self) -> ImageRecord {
        ImageRecord {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            original_name: self.original_name,
            path: self.path,
            size: self.size,
            width: self.width,
            height: self.height,
            media_type: self.media_type,
            access_count: self.access_count,
            deleted: self.deleted,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// PostgreSQL-backed image repository
#[derive(Clone)]
pub struct PgImageRepository {
    pool: PgPool,
}

impl PgImageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ImageRepository for PgImageRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<ImageRecord>, AppError> {
        let row: Option<ImageRow> = sqlx::query_as::<Postgres, ImageRow>(
            r#"
            SELECT id, user_id, name, original_name, path, size,
                   width, height, media_type, access_count, deleted,
                   created_at, updated_at
            FROM images
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, image_id = id, "Failed to fetch image row");
            AppError::Database(e.to_string())
        })?;

        Ok(row.map(ImageRow::into_record))
    }

    async fn increment_access(&self, id: i64) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE images
            SET access_count = access_count + 1, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, image_id = id, "Failed to increment access count");
            AppError::Database(e.to_string())
        })?;

        Ok(())
    }
}
