//! Cancellation token passed to every transport call.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::BackendError;

/// Shared cancellation flag plus an optional absolute deadline.
///
/// Clones share the flag, so the UI keeps one clone and hands another to the
/// worker thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    /// Token with no deadline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancelled: Arc::default(),
            deadline: Some(deadline),
        }
    }

    /// Token whose deadline is `timeout` from now.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline. `None` when there is no deadline.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.remaining().is_some_and(|left| left.is_zero())
    }

    /// Fail fast if the token was cancelled or its deadline has passed.
    ///
    /// # Errors
    /// `BackendError::Cancelled` or `BackendError::Timeout`.
    pub fn check(&self) -> Result<(), BackendError> {
        if self.is_cancelled() {
            return Err(BackendError::Cancelled);
        }
        if self.is_expired() {
            return Err(BackendError::Timeout);
        }
        Ok(())
    }

    /// Effective timeout for one request: the smaller of `configured` and
    /// the time left before the deadline.
    #[must_use]
    pub fn effective_timeout(&self, configured: Duration) -> Duration {
        match self.remaining() {
            Some(left) => left.min(configured),
            None => configured,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let token = CancelToken::new();
        let worker_copy = token.clone();
        assert!(worker_copy.check().is_ok());

        token.cancel();
        assert!(worker_copy.is_cancelled());
        assert!(matches!(worker_copy.check(), Err(BackendError::Cancelled)));
    }

    #[test]
    fn test_expired_deadline_is_timeout() {
        let token = CancelToken::with_deadline(Instant::now() - Duration::from_secs(1));
        assert!(token.is_expired());
        assert!(matches!(token.check(), Err(BackendError::Timeout)));
    }

    #[test]
    fn test_effective_timeout_takes_the_tighter_bound() {
        let configured = Duration::from_secs(60);
        assert_eq!(CancelToken::new().effective_timeout(configured), configured);

        let tight = CancelToken::with_timeout(Duration::from_secs(5));
        assert!(tight.effective_timeout(configured) <= Duration::from_secs(5));

        let loose = CancelToken::with_timeout(Duration::from_secs(600));
        assert_eq!(loose.effective_timeout(configured), configured);
    }
}
