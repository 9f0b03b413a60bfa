use crate::MemctlError;
use core::fmt;

bitflags::bitflags! {
    /// How a memory command treats its address.
    #[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
    pub struct MemoryAccessFlags: u8 {
        /// Skip the safety gate entirely, including the overflow check and
        /// the translation probe.
        const FORCE = 1 << 0;
        /// The address is physical rather than kernel virtual.
        const PHYSICAL = 1 << 1;
    }
}

impl MemoryAccessFlags {
    #[inline]
    #[must_use]
    pub const fn new(force: bool, physical: bool) -> Self {
        let mut flags = Self::empty();
        if force {
            flags = flags.union(Self::FORCE);
        }
        if physical {
            flags = flags.union(Self::PHYSICAL);
        }
        flags
    }

    #[inline]
    #[must_use]
    pub const fn is_forced(self) -> bool {
        self.contains(Self::FORCE)
    }

    #[inline]
    #[must_use]
    pub const fn is_physical(self) -> bool {
        self.contains(Self::PHYSICAL)
    }
}

bitflags::bitflags! {
    /// Mach-style VM protection bits.
    #[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
    pub struct VmProtection: u32 {
        const READ = 0x1;
        const WRITE = 0x2;
        const EXECUTE = 0x4;
    }
}

/// Size in bytes of one word, as used for I/O granularity and display.
///
/// Always a power of two between 1 and 8.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct AccessWidth(u8);

impl AccessWidth {
    pub const BYTE: Self = Self(1);
    pub const HALF: Self = Self(2);
    pub const WORD: Self = Self(4);
    pub const DOUBLE: Self = Self(8);

    /// `None` unless `bytes` is 1, 2, 4 or 8.
    #[must_use]
    pub const fn new(bytes: usize) -> Option<Self> {
        match bytes {
            1 => Some(Self::BYTE),
            2 => Some(Self::HALF),
            4 => Some(Self::WORD),
            8 => Some(Self::DOUBLE),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn bytes(self) -> usize {
        self.0 as usize
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0 as u64
    }
}

impl Default for AccessWidth {
    fn default() -> Self {
        Self::DOUBLE
    }
}

impl TryFrom<usize> for AccessWidth {
    type Error = MemctlError;

    fn try_from(width: usize) -> Result<Self, Self::Error> {
        Self::new(width).ok_or(MemctlError::InvalidWidth { width })
    }
}

impl fmt::Debug for AccessWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessWidth({})", self.0)
    }
}
