//! Storage backends for originals and derived artifacts.
//!
//! Files are addressed by storage keys: forward-slash relative paths under a
//! backend-specific root (e.g. `originals/2026/08/cat.jpg` or
//! `processed/resize/2026/08/30/cat_resize_800x600_9f2c01ab.jpg`). Backends
//! never interpret key contents beyond traversal validation.

pub mod local;
pub mod traits;

pub use local::LocalStorage;
pub use traits::{Storage, StorageError, StorageResult};
