//! In-memory writer.

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::Writer;
use crate::context::Context;
use crate::error::Result;

/// Collects written bytes per format, in write order.
#[derive(Debug, Default)]
pub struct MemoryWriter {
    entries: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemoryWriter {
    /// Create an empty memory writer.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(String, Vec<u8>)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Bytes last written for a format.
    pub fn get(&self, format: &str) -> Option<Vec<u8>> {
        self.lock()
            .iter()
            .rev()
            .find(|(f, _)| f == format)
            .map(|(_, data)| data.clone())
    }

    /// Bytes last written for a format, as UTF-8 text.
    pub fn get_string(&self, format: &str) -> Option<String> {
        self.get(format)
            .map(|data| String::from_utf8_lossy(&data).into_owned())
    }

    /// Every write, in order.
    pub fn entries(&self) -> Vec<(String, Vec<u8>)> {
        self.lock().clone()
    }

    /// Formats written, sorted and deduplicated.
    pub fn formats(&self) -> Vec<String> {
        let mut formats: Vec<String> = self.lock().iter().map(|(f, _)| f.clone()).collect();
        formats.sort();
        formats.dedup();
        formats
    }

    /// Number of writes.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if nothing was written.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Forget all writes.
    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl Writer for MemoryWriter {
    fn write(&self, _cx: &Context, format: &str, data: &[u8]) -> Result<()> {
        self.lock().push((format.to_string(), data.to_vec()));
        Ok(())
    }
}
