//! On-demand transformation service.
//!
//! Control flow per request: authorization gate (repository lookup plus
//! ownership check), then cache lookup, then on a miss the blocking pipeline
//! runs and the artifact is persisted; the resulting URL is memoized.

use imagehost_core::models::ImageRecord;
use imagehost_core::AppError;
use imagehost_db::ImageRepository;
use imagehost_processing::{naming, TransformOp, TransformParams, TransformPipeline};
use imagehost_storage::{Storage, StorageError};
use std::sync::Arc;

use crate::cache::TransformCache;

pub struct TransformService {
    images: Arc<dyn ImageRepository>,
    storage: Arc<dyn Storage>,
    pipeline: Arc<TransformPipeline>,
    cache: TransformCache,
}

impl TransformService {
    pub fn new(
        images: Arc<dyn ImageRepository>,
        storage: Arc<dyn Storage>,
        pipeline: Arc<TransformPipeline>,
    ) -> Self {
        Self {
            images,
            storage,
            pipeline,
            cache: TransformCache::new(),
        }
    }

    /// Unified entry point: dispatch on a caller-supplied operation kind.
    pub async fn process(
        &self,
        user_id: i64,
        image_id: i64,
        kind: &str,
        params: &TransformParams,
    ) -> Result<String, AppError> {
        let op = TransformOp::from_request(kind, params)?;
        self.execute(user_id, image_id, op).await
    }

    pub async fn resize(
        &self,
        user_id: i64,
        image_id: i64,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Result<String, AppError> {
        self.execute(user_id, image_id, TransformOp::resize(width, height)?)
            .await
    }

    pub async fn crop(
        &self,
        user_id: i64,
        image_id: i64,
        width: u32,
        height: u32,
    ) -> Result<String, AppError> {
        self.execute(
            user_id,
            image_id,
            TransformOp::crop(Some(width), Some(height))?,
        )
        .await
    }

    /// `position` defaults to bottom-right when `None`.
    pub async fn watermark(
        &self,
        user_id: i64,
        image_id: i64,
        text: &str,
        position: Option<&str>,
    ) -> Result<String, AppError> {
        self.execute(
            user_id,
            image_id,
            TransformOp::watermark(Some(text), position)?,
        )
        .await
    }

    pub async fn compress(
        &self,
        user_id: i64,
        image_id: i64,
        quality: u32,
    ) -> Result<String, AppError> {
        self.execute(user_id, image_id, TransformOp::compress(Some(quality))?)
            .await
    }

    pub async fn convert_format(
        &self,
        user_id: i64,
        image_id: i64,
        format: &str,
    ) -> Result<String, AppError> {
        self.execute(
            user_id,
            image_id,
            TransformOp::convert_format(Some(format))?,
        )
        .await
    }

    async fn execute(
        &self,
        user_id: i64,
        image_id: i64,
        op: TransformOp,
    ) -> Result<String, AppError> {
        // Gate first: a cache hit must never leak another user's artifact or
        // outlive a soft delete.
        let image = self.authorize(image_id, user_id).await?;

        let fingerprint = op.fingerprint(image_id);
        let url = self
            .cache
            .get_or_compute(&fingerprint, || self.run_transform(image, op.clone()))
            .await?;

        // A transformation counts as an access; failure to bump the counter
        // is not worth failing the request over.
        if let Err(e) = self.images.increment_access(image_id).await {
            tracing::warn!(error = %e, image_id = image_id, "Failed to increment access count");
        }

        Ok(url)
    }

    /// Authorization gate: resolve the image, reject soft-deleted records and
    /// foreign owners.
    async fn authorize(&self, image_id: i64, user_id: i64) -> Result<ImageRecord, AppError> {
        let record = self
            .images
            .find_by_id(image_id)
            .await?
            .filter(|r| !r.deleted)
            .ok_or_else(|| AppError::NotFound("Image not found".to_string()))?;

        if record.user_id != user_id {
            tracing::warn!(
                image_id = image_id,
                owner_id = record.user_id,
                caller_id = user_id,
                "Rejected transformation for non-owner"
            );
            return Err(AppError::Forbidden(
                "No access to this image".to_string(),
            ));
        }

        Ok(record)
    }

    /// Cache-miss path: fetch source bytes, run the blocking pipeline, store
    /// the artifact, return its URL.
    async fn run_transform(&self, image: ImageRecord, op: TransformOp) -> Result<String, AppError> {
        let start = std::time::Instant::now();

        let source = self
            .storage
            .download(&image.path)
            .await
            .map_err(|e| match e {
                StorageError::NotFound(_) => {
                    AppError::NotFound("Source file not found".to_string())
                }
                other => AppError::Storage(other.to_string()),
            })?;

        let extension = image.extension();
        let pipeline = self.pipeline.clone();
        let blocking_op = op.clone();
        let output = tokio::task::spawn_blocking(move || {
            pipeline.apply(&source, &extension, &blocking_op)
        })
        .await
        .map_err(|e| AppError::Internal(format!("Transformation task panicked: {}", e)))??;

        let target = naming::target_key(&op, image.base_name(), &image.extension());
        let url = self
            .storage
            .upload_with_key(&target, output.data.to_vec(), output.content_type)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        tracing::info!(
            image_id = image.id,
            op = op.kind(),
            target = %target,
            width = output.width,
            height = output.height,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Transformation produced"
        );

        Ok(url)
    }
}
