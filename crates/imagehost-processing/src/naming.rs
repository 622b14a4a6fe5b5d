//! Path and naming strategy for derived artifacts.
//!
//! Every derived image lands under
//! `processed/<operation>/<year>/<month>/<day>/`, bucketed by the current
//! date. Filenames carry an operation tag and a random 8-hex suffix so each
//! attempt gets a unique destination; a failed write can never alias a later
//! successful one. Format conversion is the exception: its name is the source
//! base name with the new extension, no suffix.

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::ops::TransformOp;

/// Compute the storage key for a derived artifact.
pub fn target_key(op: &TransformOp, base_name: &str, source_ext: &str) -> String {
    target_key_at(op, base_name, source_ext, Utc::now())
}

/// Deterministic-date variant, split out for tests.
pub fn target_key_at(
    op: &TransformOp,
    base_name: &str,
    source_ext: &str,
    now: DateTime<Utc>,
) -> String {
    let date = now.format("%Y/%m/%d");

    match op.tag() {
        Some(tag) => {
            let suffix: u32 = rand::rng().random();
            format!(
                "processed/{}/{}/{}_{}_{:08x}.{}",
                op.kind(),
                date,
                base_name,
                tag,
                suffix,
                source_ext
            )
        }
        // Format conversion: base name plus the new extension only.
        None => {
            let ext = match op {
                TransformOp::Format { target } => target.extension(),
                _ => source_ext,
            };
            format!("processed/{}/{}/{}.{}", op.kind(), date, base_name, ext)
        }
    }
}
