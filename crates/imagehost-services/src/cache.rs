//! Memoization of derived-artifact URLs.
//!
//! Keyed by operation fingerprint. Entries hold a per-key `OnceCell`, which
//! gives single-flight execution: concurrent identical requests share one
//! computation and all observe its result. A failed computation never
//! populates the cell, so the next request retries.
//!
//! Known limitation, kept deliberately: entries are never invalidated, even
//! if the source image's bytes later change or the image is deleted.

use imagehost_core::AppError;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

#[derive(Default)]
pub struct TransformCache {
    entries: Mutex<HashMap<String, Arc<OnceCell<String>>>>,
}

impl TransformCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed URL for a fingerprint, if any.
    pub async fn get(&self, fingerprint: &str) -> Option<String> {
        let entries = self.entries.lock().await;
        entries.get(fingerprint).and_then(|cell| cell.get().cloned())
    }

    /// Return the cached URL for `fingerprint`, or run `compute` to produce
    /// it. At most one computation runs per fingerprint at a time; other
    /// callers await its outcome.
    pub async fn get_or_compute<F, Fut>(
        &self,
        fingerprint: &str,
        compute: F,
    ) -> Result<String, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, AppError>>,
    {
        let cell = {
            let mut entries = self.entries.lock().await;
            entries
                .entry(fingerprint.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        if let Some(url) = cell.get() {
            tracing::debug!(fingerprint = %fingerprint, "Transform cache hit");
            return Ok(url.clone());
        }

        cell.get_or_try_init(compute).await.cloned()
    }

    /// Number of completed entries (failed attempts leave none).
    pub async fn len(&self) -> usize {
        let entries = self.entries.lock().await;
        entries.values().filter(|cell| cell.get().is_some()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_miss_then_hit() {
        let cache = TransformCache::new();
        let calls = AtomicUsize::new(0);

        let url = cache
            .get_or_compute("resize:1:100:100", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("http://x/a.jpg".to_string())
            })
            .await
            .unwrap();
        assert_eq!(url, "http://x/a.jpg");

        let url = cache
            .get_or_compute("resize:1:100:100", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("http://x/b.jpg".to_string())
            })
            .await
            .unwrap();
        assert_eq!(url, "http://x/a.jpg");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_does_not_populate() {
        let cache = TransformCache::new();

        let result = cache
            .get_or_compute("crop:1:999:999", || async {
                Err(AppError::Param("too big".to_string()))
            })
            .await;
        assert!(result.is_err());
        assert!(cache.get("crop:1:999:999").await.is_none());
        assert!(cache.is_empty().await);

        // A later attempt runs again and may succeed.
        let url = cache
            .get_or_compute("crop:1:999:999", || async {
                Ok("http://x/c.jpg".to_string())
            })
            .await
            .unwrap();
        assert_eq!(url, "http://x/c.jpg");
    }

    #[tokio::test]
    async fn test_concurrent_same_fingerprint_single_flight() {
        let cache = Arc::new(TransformCache::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_compute("watermark:5:acme:center", || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                        Ok("http://x/w.jpg".to_string())
                    })
                    .await
                    .unwrap()
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), "http://x/w.jpg");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_distinct_fingerprints_are_independent() {
        let cache = TransformCache::new();

        cache
            .get_or_compute("compress:1:50", || async { Ok("http://x/1.jpg".to_string()) })
            .await
            .unwrap();
        cache
            .get_or_compute("compress:1:80", || async { Ok("http://x/2.jpg".to_string()) })
            .await
            .unwrap();

        assert_eq!(cache.get("compress:1:50").await.unwrap(), "http://x/1.jpg");
        assert_eq!(cache.get("compress:1:80").await.unwrap(), "http://x/2.jpg");
        assert_eq!(cache.len().await, 2);
    }
}
