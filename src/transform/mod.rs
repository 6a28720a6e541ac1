//! Post-processing of rendered bytes.
//!
//! Transformers run after a renderer and before the writers. For each format
//! the orchestrator applies every transformer whose [`Transformer::can_transform`]
//! accepts the format, in ascending [`Transformer::priority`] order; ties keep
//! registration order.

mod cleanup;
mod gzip;

pub use cleanup::{CleanupOptions, CleanupPreset, CleanupTransformer};
pub use gzip::GzipTransformer;

use std::sync::Arc;

use crate::context::Context;
use crate::error::Result;

/// Byte-level post-processor for rendered output.
pub trait Transformer: Send + Sync {
    /// Name used in error reports.
    fn name(&self) -> &str;

    /// Ordering key; lower runs first.
    fn priority(&self) -> i32 {
        0
    }

    /// Whether this transformer applies to `format`.
    fn can_transform(&self, format: &str) -> bool;

    /// Transform the rendered bytes of `format`.
    fn transform(&self, cx: &Context, data: &[u8], format: &str) -> Result<Vec<u8>>;
}

/// Transformers applicable to `format`, in the order they run.
pub fn applicable<'a>(
    transformers: &'a [Arc<dyn Transformer>],
    format: &str,
) -> Vec<&'a Arc<dyn Transformer>> {
    let mut selected: Vec<_> = transformers
        .iter()
        .filter(|t| t.can_transform(format))
        .collect();
    selected.sort_by_key(|t| t.priority());
    selected
}
