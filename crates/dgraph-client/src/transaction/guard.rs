//! One-shot flag behind the release-time discard.

use std::sync::atomic::{AtomicBool, Ordering};

/// Ensures the background discard of a released handle is scheduled at most
/// once.
#[derive(Debug, Default)]
pub(crate) struct DiscardGuard {
    released: AtomicBool,
}

impl DiscardGuard {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns true on the first call only.
    pub(crate) fn arm(&self) -> bool {
        !self.released.swap(true, Ordering::AcqRel)
    }

    pub(crate) fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}
