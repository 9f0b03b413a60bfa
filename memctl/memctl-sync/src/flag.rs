use core::sync::atomic::{AtomicBool, Ordering};

/// A sticky "please stop" flag.
///
/// Setting it is a single atomic store, so it is safe to do from a signal
/// handler.
#[derive(Debug, Default)]
pub struct CancellationFlag {
    cancelled: AtomicBool,
}

impl CancellationFlag {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Clear the flag and report whether it was set.
    #[inline]
    #[must_use]
    pub fn reset(&self) -> bool {
        self.cancelled.swap(false, Ordering::AcqRel)
    }
}
