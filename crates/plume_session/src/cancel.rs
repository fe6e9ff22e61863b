//! Render cancellation.
//!
//! One boolean cell shared between the host's abort signal and the engine's
//! polling loop. Relaxed ordering: a late observation only makes the cancel
//! take a little longer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag for one render session.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token in the not-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Clears the request.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// A handle that can only request cancellation.
    #[must_use]
    pub fn abort_handle(&self) -> AbortHandle {
        AbortHandle {
            token: self.clone(),
        }
    }
}

/// Write side of a [`CancellationToken`], handed to the host's abort
/// callback. Usable from any thread.
#[derive(Debug, Clone)]
pub struct AbortHandle {
    token: CancellationToken,
}

impl AbortHandle {
    /// Requests that the running render stop.
    pub fn abort(&self) {
        self.token.cancel();
    }

    /// Whether an abort is pending.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_cancel_and_reset() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
        token.reset();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn test_abort_from_another_thread() {
        let token = CancellationToken::new();
        let handle = token.abort_handle();

        thread::spawn(move || handle.abort()).join().unwrap();

        assert!(token.is_cancelled());
        assert!(token.abort_handle().is_aborted());
    }
}
