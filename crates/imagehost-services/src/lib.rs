//! Orchestration layer for on-demand image transformation.
//!
//! [`TransformService`] wires the collaborators together: the metadata
//! repository (authorization gate), the memoization cache, the pixel pipeline
//! and the storage backend.

pub mod cache;
pub mod transform;

pub use cache::TransformCache;
pub use transform::TransformService;
