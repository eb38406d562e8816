//! Cross-thread cancellation of blocking waits.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Stops the in-flight blocking waits of the [`QueryClient`](crate::QueryClient)
/// it came from.
///
/// A cancellation only reaches waits that were already running when it was
/// issued. Cancelling while nothing is in flight has no effect on later calls.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    requests: Arc<AtomicU64>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }

    /// Start watching for cancellations issued from now on.
    pub(crate) fn token(&self) -> CancelToken {
        CancelToken {
            requests: self.requests.clone(),
            seen: self.requests.load(Ordering::SeqCst),
        }
    }
}

/// Cancellation state of a single wait.
#[derive(Debug)]
pub(crate) struct CancelToken {
    requests: Arc<AtomicU64>,
    seen: u64,
}

impl CancelToken {
    pub(crate) fn is_cancelled(&self) -> bool {
        self.requests.load(Ordering::SeqCst) != self.seen
    }
}
