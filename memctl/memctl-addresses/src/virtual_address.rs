use crate::MemoryAddress;
use core::fmt;
use core::ops::{Add, AddAssign};

/// Kernel virtual memory address.
///
/// A thin wrapper around [`MemoryAddress`] that denotes **virtual** addresses
/// of the inspected kernel. It does not validate canonicality; that is the job
/// of the safety gate. It only carries the *kind* of address at the type level
/// so virtual and physical values are never mixed by accident.
///
/// ### Examples
/// ```rust
/// # use memctl_addresses::*;
/// let va = VirtualAddress::new(0xFFFF_FFF0_0700_4321);
/// assert_eq!(va.align_down(0x4000).as_u64() & 0x3FFF, 0);
/// assert_eq!(va.page_offset(0x4000), 0x321);
/// ```
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct VirtualAddress(MemoryAddress);

impl VirtualAddress {
    #[inline]
    #[must_use]
    pub const fn new(v: u64) -> Self {
        Self(MemoryAddress::new(v))
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0.as_u64()
    }

    #[inline]
    #[must_use]
    pub const fn as_memory_address(self) -> MemoryAddress {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn checked_add(self, rhs: u64) -> Option<Self> {
        match self.0.checked_add(rhs) {
            Some(a) => Some(Self(a)),
            None => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn align_down(self, size: u64) -> Self {
        Self(self.0.align_down(size))
    }

    #[inline]
    #[must_use]
    pub const fn align_up(self, size: u64) -> Option<Self> {
        match self.0.align_up(size) {
            Some(a) => Some(Self(a)),
            None => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn page_offset(self, size: u64) -> u64 {
        self.0.page_offset(size)
    }

    /// Extract the `bits`-wide index field starting at bit `shift`.
    ///
    /// Used to decompose a virtual address into per-level table indices.
    #[inline]
    #[must_use]
    pub const fn index_bits(self, shift: u32, bits: u32) -> u64 {
        (self.as_u64() >> shift) & ((1u64 << bits) - 1)
    }
}

impl fmt::Debug for VirtualAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VA(0x{:016X})", self.as_u64())
    }
}

impl fmt::Display for VirtualAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}", self.as_u64())
    }
}

impl fmt::LowerHex for VirtualAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl From<u64> for VirtualAddress {
    #[inline]
    fn from(v: u64) -> Self {
        Self::new(v)
    }
}

impl From<VirtualAddress> for u64 {
    #[inline]
    fn from(v: VirtualAddress) -> Self {
        v.as_u64()
    }
}

impl Add<u64> for VirtualAddress {
    type Output = Self;
    #[inline]
    fn add(self, rhs: u64) -> Self::Output {
        Self(self.0 + rhs)
    }
}

impl AddAssign<u64> for VirtualAddress {
    #[inline]
    fn add_assign(&mut self, rhs: u64) {
        self.0 += rhs;
    }
}
