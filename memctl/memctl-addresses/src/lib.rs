//! # Virtual and Physical Kernel Address Types
//!
//! Strongly typed wrappers for raw kernel addresses used by the translation,
//! patching and inspection code.
//!
//! ## Overview
//!
//! The inspection engine talks to two address spaces of the target kernel:
//! the kernel's **virtual** address space (what `ttbr1_el1` translates) and
//! **physical** memory (what translation table entries point at). The two are
//! never implicitly mixed; this crate keeps them apart at compile time while
//! remaining zero-cost wrappers around `u64` values.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`MemoryAddress`] | A raw 64-bit address, either physical or virtual. |
//! | [`VirtualAddress`] | A kernel virtual address. |
//! | [`PhysicalAddress`] | A physical address (DRAM, translation tables, MMIO). |
//! | [`KernelAddress`] | A run-time tagged address for operations that accept either space. |
//! | [`AddressRange`] | A half-open `[start, end)` range with checked construction. |
//!
//! ## Arithmetic
//!
//! Address arithmetic that may be fed by user input is **checked**: helpers
//! such as [`MemoryAddress::checked_add`] return `None` instead of wrapping.
//! Plain `+` is still available for offsets that are known to be in range
//! (e.g. `table_base + 8 * index`), and panics on overflow in debug builds.
//!
//! ## Typical Usage
//!
//! ```rust
//! # use memctl_addresses::*;
//! let va = VirtualAddress::new(0xFFFF_FFF0_0700_4321);
//! assert_eq!(va.align_down(0x4000).as_u64(), 0xFFFF_FFF0_0700_4000);
//! assert_eq!(va.page_offset(0x4000), 0x0321);
//!
//! let tagged = KernelAddress::from(va);
//! assert!(!tagged.is_physical());
//! assert!(tagged.checked_add(u64::MAX).is_none());
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(clippy::inline_always)]

mod address_range;
mod kernel_address;
mod memory_address;
mod physical_address;
mod virtual_address;

pub use address_range::{AddressRange, PageIter};
pub use kernel_address::KernelAddress;
pub use memory_address::MemoryAddress;
pub use physical_address::PhysicalAddress;
pub use virtual_address::VirtualAddress;

/// Align `x` down to the nearest multiple of `a`.
///
/// This returns the greatest value `y <= x` such that `y % a == 0`.
///
/// ### Preconditions
/// - `a` must be **non-zero** and a **power of two**.
///
/// ### Examples
/// ```rust
/// # use memctl_addresses::align_down;
/// assert_eq!(align_down(0,       0x4000), 0);
/// assert_eq!(align_down(0x3FFF,  0x4000), 0);
/// assert_eq!(align_down(0x4000,  0x4000), 0x4000);
/// assert_eq!(align_down(0x12345,     16), 0x12340);
/// ```
#[inline(always)]
#[must_use]
pub const fn align_down(x: u64, a: u64) -> u64 {
    debug_assert!(a.is_power_of_two());
    x & !(a - 1)
}

/// Align `x` up to the nearest multiple of `a`.
///
/// Unlike a plain bit trick this never wraps: `None` is returned when the
/// aligned value does not fit into `u64`.
///
/// ### Examples
/// ```rust
/// # use memctl_addresses::align_up;
/// assert_eq!(align_up(0,       0x4000), Some(0));
/// assert_eq!(align_up(1,       0x4000), Some(0x4000));
/// assert_eq!(align_up(0x4000,  0x4000), Some(0x4000));
/// assert_eq!(align_up(u64::MAX, 0x4000), None);
/// ```
#[inline(always)]
#[must_use]
pub const fn align_up(x: u64, a: u64) -> Option<u64> {
    debug_assert!(a.is_power_of_two());
    match x.checked_add(a - 1) {
        Some(v) => Some(v & !(a - 1)),
        None => None,
    }
}
