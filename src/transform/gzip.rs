//! Gzip compression of rendered output.

use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;

use super::Transformer;
use crate::context::Context;
use crate::error::Result;

/// Compresses rendered bytes with gzip.
///
/// Applies to every format unless restricted with [`GzipTransformer::with_formats`].
/// Runs last by default (priority 100).
#[derive(Debug, Clone)]
pub struct GzipTransformer {
    level: u32,
    formats: Option<Vec<String>>,
    priority: i32,
}

impl GzipTransformer {
    /// Create a gzip transformer with the default compression level.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the compression level (0-9).
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level.min(9);
        self
    }

    /// Only compress the given formats.
    pub fn with_formats<S: Into<String>>(mut self, formats: impl IntoIterator<Item = S>) -> Self {
        self.formats = Some(formats.into_iter().map(Into::into).collect());
        self
    }

    /// Set the ordering priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl Default for GzipTransformer {
    fn default() -> Self {
        Self {
            level: Compression::default().level(),
            formats: None,
            priority: 100,
        }
    }
}

impl Transformer for GzipTransformer {
    fn name(&self) -> &str {
        "gzip"
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn can_transform(&self, format: &str) -> bool {
        match self.formats {
            Some(ref formats) => formats.iter().any(|f| f == format),
            None => true,
        }
    }

    fn transform(&self, _cx: &Context, data: &[u8], _format: &str) -> Result<Vec<u8>> {
        let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2), Compression::new(self.level));
        encoder.write_all(data)?;
        Ok(encoder.finish()?)
    }
}
