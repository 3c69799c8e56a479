//! One-shot stop signal for a crawl.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;

/// Tells a crawl to stop requesting pages.
///
/// Derived from the process shutdown token, so a shutdown also stops every
/// crawl. Triggering is idempotent and safe from concurrent extraction
/// tasks; only the first call reports `true`.
#[derive(Debug)]
pub struct StopSignal {
    token: CancellationToken,
    fired: AtomicBool,
}

impl StopSignal {
    /// Create a signal that also fires when `shutdown` is cancelled.
    pub fn new(shutdown: &CancellationToken) -> Self {
        Self {
            token: shutdown.child_token(),
            fired: AtomicBool::new(false),
        }
    }

    /// Fire the signal. Returns `true` for the call that fired it.
    pub fn trigger(&self) -> bool {
        if self.fired.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.token.cancel();
        true
    }

    /// Whether the signal fired, either directly or through shutdown.
    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Whether [`trigger`](Self::trigger) was called, as opposed to a
    /// process shutdown.
    pub fn was_triggered_locally(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    /// Wait until the signal fires. Returns immediately if it already has.
    pub async fn wait(&self) {
        self.token.cancelled().await
    }
}
