//! Core types shared across the imagehost workspace.
//!
//! This crate holds the error taxonomy, configuration, domain models and the
//! tracing bootstrap. It has no knowledge of storage backends, databases or
//! pixel processing; those live in sibling crates.

pub mod config;
pub mod error;
pub mod models;
pub mod telemetry;

pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
