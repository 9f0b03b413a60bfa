use crate::{PhysicalAddress, VirtualAddress};
use core::fmt;

/// An address tagged at run time with the space it belongs to.
///
/// Commands accept either space depending on the caller's `physical` flag;
/// this enum carries that decision alongside the value so the I/O layer can
/// dispatch without re-checking flags.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub enum KernelAddress {
    Virtual(VirtualAddress),
    Physical(PhysicalAddress),
}

impl KernelAddress {
    /// Tag a raw value as physical or virtual.
    #[inline]
    #[must_use]
    pub const fn new(value: u64, physical: bool) -> Self {
        if physical {
            Self::Physical(PhysicalAddress::new(value))
        } else {
            Self::Virtual(VirtualAddress::new(value))
        }
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        match self {
            Self::Virtual(va) => va.as_u64(),
            Self::Physical(pa) => pa.as_u64(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_physical(self) -> bool {
        matches!(self, Self::Physical(_))
    }

    /// Offset the address within its own space; `None` on overflow.
    #[inline]
    #[must_use]
    pub const fn checked_add(self, rhs: u64) -> Option<Self> {
        match self {
            Self::Virtual(va) => match va.checked_add(rhs) {
                Some(va) => Some(Self::Virtual(va)),
                None => None,
            },
            Self::Physical(pa) => match pa.checked_add(rhs) {
                Some(pa) => Some(Self::Physical(pa)),
                None => None,
            },
        }
    }

}

impl From<VirtualAddress> for KernelAddress {
    #[inline]
    fn from(va: VirtualAddress) -> Self {
        Self::Virtual(va)
    }
}

impl From<PhysicalAddress> for KernelAddress {
    #[inline]
    fn from(pa: PhysicalAddress) -> Self {
        Self::Physical(pa)
    }
}

impl fmt::Debug for KernelAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Virtual(va) => fmt::Debug::fmt(va, f),
            Self::Physical(pa) => fmt::Debug::fmt(pa, f),
        }
    }
}

impl fmt::Display for KernelAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}", self.as_u64())
    }
}
