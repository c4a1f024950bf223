//! Cooperative cancellation for index builds.
//!
//! A build worker checks its token at every entry boundary and stops without
//! publishing anything once the token is cancelled.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared cancellation flag
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; idempotent
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns `Some(())` while active and `None` once cancelled, so callers
    /// can bail out with `?`.
    #[inline]
    pub fn is_cancelled(&self) -> Option<()> {
        if self.cancelled.load(Ordering::Relaxed) {
            None
        } else {
            Some(())
        }
    }

    /// Plain boolean view of [`is_cancelled`](Self::is_cancelled)
    #[inline]
    pub fn cancelled(&self) -> bool {
        self.is_cancelled().is_none()
    }
}
