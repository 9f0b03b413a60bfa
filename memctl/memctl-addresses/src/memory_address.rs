use crate::{align_down, align_up};
use core::fmt;
use core::ops::{Add, AddAssign};

/// Principal raw memory address
/// ([virtual](super::VirtualAddress) or [physical](super::PhysicalAddress)).
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct MemoryAddress(u64);

impl MemoryAddress {
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// `self + rhs`, or `None` if the sum does not fit into 64 bits.
    #[inline]
    #[must_use]
    pub const fn checked_add(self, rhs: u64) -> Option<Self> {
        match self.0.checked_add(rhs) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Distance from `base` to `self`, or `None` if `self < base`.
    #[inline]
    #[must_use]
    pub const fn checked_offset_from(self, base: Self) -> Option<u64> {
        self.0.checked_sub(base.0)
    }

    /// Align down to a power-of-two boundary `size`.
    #[inline]
    #[must_use]
    pub const fn align_down(self, size: u64) -> Self {
        Self(align_down(self.0, size))
    }

    /// Align up to a power-of-two boundary `size`; `None` on overflow.
    #[inline]
    #[must_use]
    pub const fn align_up(self, size: u64) -> Option<Self> {
        match align_up(self.0, size) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// The offset within the power-of-two sized page that contains this address.
    #[inline]
    #[must_use]
    pub const fn page_offset(self, size: u64) -> u64 {
        self.0 & (size - 1)
    }

    #[inline]
    #[must_use]
    pub const fn is_aligned(self, size: u64) -> bool {
        self.page_offset(size) == 0
    }
}

impl fmt::Debug for MemoryAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemoryAddress(0x{:016X})", self.0)
    }
}

impl fmt::Display for MemoryAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}", self.0)
    }
}

impl fmt::LowerHex for MemoryAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl From<u64> for MemoryAddress {
    #[inline]
    fn from(v: u64) -> Self {
        Self::new(v)
    }
}

impl From<MemoryAddress> for u64 {
    #[inline]
    fn from(a: MemoryAddress) -> Self {
        a.as_u64()
    }
}

impl Add<u64> for MemoryAddress {
    type Output = Self;
    #[inline]
    fn add(self, rhs: u64) -> Self::Output {
        Self(self.0 + rhs)
    }
}

impl AddAssign<u64> for MemoryAddress {
    #[inline]
    fn add_assign(&mut self, rhs: u64) {
        self.0 += rhs;
    }
}
