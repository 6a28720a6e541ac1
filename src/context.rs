//! Cooperative cancellation for pipelines and renders.
//!
//! A [`Context`] combines a `tokio_util` cancellation token with an optional
//! deadline. It is polled between steps (before each operation, before each
//! format starts, before each write); running work is never preempted.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::error::CancelCause;

/// Cancellation signal and deadline shared by one render call.
///
/// Clones share state: cancelling any clone cancels all of them. Contexts
/// created with [`Context::child`] are cancelled with their parent but can be
/// cancelled on their own without affecting the parent.
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// Create a context that is never done unless cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    /// Create a child context.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Create a child context whose deadline is `timeout` from now
    /// (or the parent's deadline, whichever comes first).
    ///
    /// A timeout too large to represent as an instant adds no deadline.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self.child(),
        }
    }

    /// Create a child context with the given deadline
    /// (or the parent's deadline, whichever comes first).
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Deadline of this context, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Why the context is done, or `None` if it is still live.
    ///
    /// Explicit cancellation takes precedence over an expired deadline.
    pub fn err(&self) -> Option<CancelCause> {
        if self.token.is_cancelled() {
            return Some(CancelCause::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(CancelCause::DeadlineExceeded),
            _ => None,
        }
    }

    /// Check whether the context is cancelled or past its deadline.
    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Return `Err` with the cause if the context is done.
    pub fn check(&self) -> std::result::Result<(), CancelCause> {
        match self.err() {
            Some(cause) => Err(cause),
            None => Ok(()),
        }
    }

    /// Underlying cancellation token.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl From<CancellationToken> for Context {
    fn from(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_not_done() {
        let cx = Context::background();
        assert!(!cx.is_done());
        assert_eq!(cx.err(), None);
        assert!(cx.check().is_ok());
    }

    #[test]
    fn test_cancel_sets_cause() {
        let cx = Context::background();
        cx.cancel();
        assert!(cx.is_done());
        assert_eq!(cx.err(), Some(CancelCause::Cancelled));
    }

    #[test]
    fn test_huge_timeout_has_no_deadline() {
        let cx = Context::background().with_timeout(Duration::MAX);
        assert_eq!(cx.deadline(), None);
        assert!(!cx.is_done());

        let parent = Context::background().with_timeout(Duration::from_secs(60));
        let child = parent.with_timeout(Duration::from_secs(u64::MAX));
        assert_eq!(child.deadline(), parent.deadline());
    }

    #[test]
    fn test_clone_shares_state() {
        let cx1 = Context::background();
        let cx2 = cx1.clone();
        cx2.cancel();
        assert!(cx1.is_done());
    }

    #[test]
    fn test_child_cancelled_with_parent() {
        let parent = Context::background();
        let child = parent.child();
        parent.cancel();
        assert_eq!(child.err(), Some(CancelCause::Cancelled));
    }

    #[test]
    fn test_child_cancel_does_not_reach_parent() {
        let parent = Context::background();
        let child = parent.child();
        child.cancel();
        assert!(child.is_done());
        assert!(!parent.is_done());
    }

    #[test]
    fn test_expired_deadline() {
        let cx = Context::background().with_deadline(Instant::now());
        assert_eq!(cx.err(), Some(CancelCause::DeadlineExceeded));
    }

    #[test]
    fn test_child_keeps_earlier_deadline() {
        let soon = Instant::now() + Duration::from_secs(1);
        let parent = Context::background().with_deadline(soon);
        let child = parent.with_timeout(Duration::from_secs(3600));
        assert_eq!(child.deadline(), Some(soon));
        assert!(!child.is_done());
    }

    #[test]
    fn test_cancel_wins_over_deadline() {
        let cx = Context::background().with_deadline(Instant::now());
        cx.cancel();
        assert_eq!(cx.err(), Some(CancelCause::Cancelled));
    }
}
