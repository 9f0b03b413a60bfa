/// Address-shape rules used by the safety gate when validation is active.
///
/// Neither rule is a proof that an address is mapped; they only reject values
/// that cannot possibly be a kernel pointer or a physical address on the target.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct AddressHeuristics {
    /// Required value of the top 24 bits of a kernel virtual address.
    pub kernel_upper_pattern: u64,
    /// Number of top bits that must be zero in a physical address.
    pub physical_zero_top_bits: u32,
}

impl AddressHeuristics {
    /// Shift that isolates the top 24 bits of an address.
    const KERNEL_PATTERN_SHIFT: u32 = 40;

    /// The upper-half kernel pattern (`0xffffff`) and a 48-bit physical space.
    pub const ARM64_KERNEL: Self = Self {
        kernel_upper_pattern: 0xFF_FFFF,
        physical_zero_top_bits: 16,
    };

    #[inline]
    #[must_use]
    pub const fn is_kernel_address(&self, address: u64) -> bool {
        address >> Self::KERNEL_PATTERN_SHIFT == self.kernel_upper_pattern
    }

    #[inline]
    #[must_use]
    pub const fn is_physical_address(&self, address: u64) -> bool {
        if self.physical_zero_top_bits == 0 {
            return true;
        }
        if self.physical_zero_top_bits >= 64 {
            return address == 0;
        }
        address >> (64 - self.physical_zero_top_bits) == 0
    }
}

impl Default for AddressHeuristics {
    fn default() -> Self {
        Self::ARM64_KERNEL
    }
}
