//! Cooperative cancellation for long-running traversals: ancestor/descendant closure and
//! partitioning check a [`CancelToken`] at BFS-frontier granularity when one is supplied.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A shared flag a caller can set from outside a running traversal. Cloning shares the same
/// underlying flag; dropping all clones has no special effect (there is nothing to clean up).
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Visible to every clone of this token.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// True once [`cancel`](Self::cancel) has been called on this token or any of its clones.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}
