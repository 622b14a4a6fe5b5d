//! On-demand image transformation pipeline.
//!
//! A validated [`TransformOp`] plus source bytes go in; encoded derived bytes
//! come out. The pipeline is synchronous and CPU-bound; callers run it under
//! `tokio::task::spawn_blocking`. Destination keys for derived artifacts come
//! from [`naming::target_key`].

pub mod encode;
pub mod naming;
pub mod ops;
pub mod pipeline;
pub mod watermark;

pub use encode::TargetFormat;
pub use ops::{TransformOp, TransformParams, WatermarkPosition};
pub use pipeline::{TransformOutput, TransformPipeline};
pub use watermark::{FontRenderer, TextRenderer};
