//! # Session Configuration for the Inspected Kernel
//!
//! Device- and OS-release-specific constants that the inspection engine needs
//! but cannot discover on its own. They are resolved once when a session is
//! opened (symbol lookup and register dumps are someone else's job) and stay
//! immutable for the session's lifetime.
//!
//! ## Contents
//!
//! * [`TranslationTableBase`]: the `ttbr1_el1` equivalent the walker starts from.
//! * [`AddressHeuristics`]: the address-shape rules applied by the safety gate.
//! * [`KernelFunctions`]: addresses of the kernel routines invoked through the
//!   kernel-call primitive.
//! * [`TranslationStrategy`]: how the safety probe turns a virtual address
//!   into a physical one.
//! * [`ZoneLayout`]: versioned offsets and strides of the zone allocator's
//!   metadata.
//!
//! Nothing here performs I/O; these are plain values.

#![cfg_attr(not(any(test, doctest)), no_std)]

mod functions;
mod heuristics;
mod zone;

pub use functions::{KernelFunctions, TranslationStrategy};
pub use heuristics::AddressHeuristics;
pub use zone::ZoneLayout;

use core::fmt;
use memctl_addresses::PhysicalAddress;

/// Kernel page size on the supported targets (16 KiB).
pub const DEFAULT_PAGE_SIZE: u64 = 0x4000;

/// Start of DRAM in the physical address map; `kvtophys` results are relative to it.
pub const DEFAULT_PHYSICAL_BASE: PhysicalAddress = PhysicalAddress::new(0x8_0000_0000);

/// Physical address of the top-level kernel translation table.
///
/// Supplied once at session start and never re-read.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct TranslationTableBase(PhysicalAddress);

impl TranslationTableBase {
    #[inline]
    #[must_use]
    pub const fn new(base: PhysicalAddress) -> Self {
        Self(base)
    }

    #[inline]
    #[must_use]
    pub const fn physical_address(self) -> PhysicalAddress {
        self.0
    }
}

impl fmt::Debug for TranslationTableBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TTBR({:?})", self.0)
    }
}

impl From<u64> for TranslationTableBase {
    #[inline]
    fn from(value: u64) -> Self {
        Self(PhysicalAddress::new(value))
    }
}
