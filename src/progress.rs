//! Progress reporting for renders.
//!
//! The orchestrator reports one work unit per (format, writer) pair.
//! Implementations receive calls from several format threads and must use
//! interior mutability.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::Error;

/// Sink for render progress.
pub trait Progress: Send + Sync {
    /// Set the total number of work units.
    fn set_total(&self, total: u64);

    /// Set the number of completed work units.
    fn set_current(&self, current: u64);

    /// Advance the number of completed work units.
    fn increment(&self, delta: u64);

    /// Set a human-readable status line.
    fn set_status(&self, status: &str);

    /// The render finished without errors.
    fn complete(&self);

    /// The render finished with errors.
    fn fail(&self, error: &Error);

    /// Release any resources (e.g. terminal state).
    fn close(&self);
}

/// Progress sink that does nothing. Used when no sink is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn set_total(&self, _total: u64) {}
    fn set_current(&self, _current: u64) {}
    fn increment(&self, _delta: u64) {}
    fn set_status(&self, _status: &str) {}
    fn complete(&self) {}
    fn fail(&self, _error: &Error) {}
    fn close(&self) {}
}

/// Progress sink that reports through the `log` facade.
#[derive(Debug, Default)]
pub struct LogProgress {
    total: AtomicU64,
    current: AtomicU64,
}

impl LogProgress {
    /// Create a new log-backed progress sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed work units.
    pub fn current(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }

    /// Total work units.
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::SeqCst)
    }
}

impl Progress for LogProgress {
    fn set_total(&self, total: u64) {
        self.total.store(total, Ordering::SeqCst);
        log::debug!("progress: 0/{}", total);
    }

    fn set_current(&self, current: u64) {
        self.current.store(current, Ordering::SeqCst);
        log::debug!("progress: {}/{}", current, self.total());
    }

    fn increment(&self, delta: u64) {
        let current = self.current.fetch_add(delta, Ordering::SeqCst) + delta;
        log::debug!("progress: {}/{}", current, self.total());
    }

    fn set_status(&self, status: &str) {
        log::info!("{}", status);
    }

    fn complete(&self) {
        log::info!("render complete ({} units)", self.total());
    }

    fn fail(&self, error: &Error) {
        log::warn!("render failed: {}", error);
    }

    fn close(&self) {}
}
