use crate::CancellationFlag;
use alloc::sync::Arc;
use core::fmt;

/// Cloneable handle to a [`CancellationFlag`].
///
/// All clones observe the same flag. A token is either backed by a shared
/// heap allocation ([`new`](Self::new)) or by a flag in a `static`
/// ([`from_static`](Self::from_static)).
#[derive(Clone)]
pub struct CancellationToken {
    flag: Source,
}

#[derive(Clone)]
enum Source {
    Shared(Arc<CancellationFlag>),
    Static(&'static CancellationFlag),
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self {
            flag: Source::Shared(Arc::new(CancellationFlag::new())),
        }
    }

    /// Observe a flag that outlives the process, e.g. one set by a `SIGINT` handler.
    #[must_use]
    pub const fn from_static(flag: &'static CancellationFlag) -> Self {
        Self {
            flag: Source::Static(flag),
        }
    }

    #[inline]
    fn flag(&self) -> &CancellationFlag {
        match &self.flag {
            Source::Shared(flag) => flag,
            Source::Static(flag) => flag,
        }
    }

    #[inline]
    pub fn cancel(&self) {
        self.flag().cancel();
    }

    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag().is_cancelled()
    }

    /// Re-arm the token for the next operation; returns whether it had fired.
    #[inline]
    #[must_use]
    pub fn reset(&self) -> bool {
        self.flag().reset()
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
