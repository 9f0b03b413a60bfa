//! # ARM64 Kernel Translation Tables
//!
//! Read-side model of the inspected kernel's stage-1 translation tables, plus
//! the one write the engine ever performs on them: clearing execute-never
//! bits.
//!
//! ## 16 KiB granule, three levels
//!
//! With a 16 KiB granule and a 39-bit kernel VA space, each virtual address is
//! split into three table indices and a page offset:
//!
//! ```text
//! | 38‒36 | 35‒25 | 24‒14 | 13‒0   |
//! |  L1   |  L2   |  L3   | Offset |
//! |  3b   |  11b  |  11b  |  14b   |
//! ```
//!
//! Every entry is 8 bytes. The low two bits classify it:
//!
//! | Level | `0b11` | `0b01` | other |
//! |:------|:-------|:-------|:------|
//! | L0–L2 | table descriptor | block (L2 only) | invalid |
//! | L3    | page descriptor | invalid | invalid |
//!
//! The [`PageTableWalker`] only ever follows `0b11`. Block mappings at L2 are
//! treated as a translation failure: the kernels this tool targets map their
//! text and data with page granularity, and the walker is not meant to be a
//! general MMU model.
//!
//! ## Execute-never bits
//!
//! | Bit | Name | Found in |
//! |-----|------|----------|
//! | 53 | `PXN` | block and page descriptors |
//! | 59 | `PXNTable` | table descriptors; applies to everything below |
//!
//! [`clear_pxn`] rewrites exactly one of these bits and nothing else.
//!
//! ## Hardware access
//!
//! Nothing in this crate touches memory directly. All reads and writes of
//! translation table entries go through [`PhysicalWords`], which the session
//! implements on top of the kernel-call primitive and tests implement on top of
//! a `HashMap`.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(clippy::inline_always)]

mod bypass;
mod descriptor;
mod granule;
mod walker;

pub use crate::bypass::{
    BypassAvailability, BypassError, BypassResolver, GrantReport, ProtectionBypass, clear_pxn,
};
pub use crate::descriptor::{BlockDescriptor, DescriptorKind, PageDescriptor, TableDescriptor};
pub use crate::granule::{TranslationGranule, TranslationLevel};
pub use crate::walker::{EntryRead, PageTableWalker, TranslationWalk};

use memctl_addresses::{AddressRange, PhysicalAddress, VirtualAddress};

/// Re-export of the session constants this crate consumes.
pub use memctl_info::TranslationTableBase;

/// 64-bit access to physical memory of the inspected machine.
///
/// Implementations perform no validation; the address is the caller's
/// responsibility. A failed access is reported once and never retried.
pub trait PhysicalWords {
    type Error: core::error::Error;

    /// Read the 64-bit word at `address`.
    ///
    /// # Errors
    /// Returns the implementation's error if the underlying transfer failed.
    fn read64(&self, address: PhysicalAddress) -> Result<u64, Self::Error>;

    /// Write the 64-bit word `value` to `address`.
    ///
    /// # Errors
    /// Returns the implementation's error if the underlying transfer failed.
    fn write64(&self, address: PhysicalAddress, value: u64) -> Result<(), Self::Error>;
}

impl<T> PhysicalWords for &T
where
    T: PhysicalWords + ?Sized,
{
    type Error = T::Error;

    #[inline]
    fn read64(&self, address: PhysicalAddress) -> Result<u64, Self::Error> {
        (**self).read64(address)
    }

    #[inline]
    fn write64(&self, address: PhysicalAddress, value: u64) -> Result<(), Self::Error> {
        (**self).write64(address, value)
    }
}

/// A virtual range could not be expressed without wrapping the address space.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum RangeError {
    #[error("range {start} + {len:#x} overflows the address space")]
    Overflow { start: VirtualAddress, len: u64 },
}

/// The page-aligned span `[align_down(start), align_up(start + len))`.
///
/// # Errors
/// [`RangeError::Overflow`] if `start + len` or its page-rounded end wraps.
pub fn page_span(
    start: VirtualAddress,
    len: u64,
    page_size: u64,
) -> Result<AddressRange, RangeError> {
    AddressRange::with_len(start, len)
        .and_then(|r| r.page_aligned(page_size))
        .ok_or(RangeError::Overflow { start, len })
}
