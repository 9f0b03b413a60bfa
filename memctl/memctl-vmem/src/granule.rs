//! # Translation Granule Geometry

use memctl_addresses::VirtualAddress;

/// A level of the translation table hierarchy.
///
/// The 16 KiB walker visits [`L1`](Self::L1), [`L2`](Self::L2) and
/// [`L3`](Self::L3) in that order. [`L0`](Self::L0) only exists so that the
/// descriptor rules in [`clear_pxn`](crate::clear_pxn) cover every level the
/// architecture defines.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum TranslationLevel {
    L0,
    L1,
    L2,
    L3,
}

impl TranslationLevel {
    /// Levels walked for a 16 KiB granule, root first.
    pub const WALKED: [Self; 3] = [Self::L1, Self::L2, Self::L3];

    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::L0 => 0,
            Self::L1 => 1,
            Self::L2 => 2,
            Self::L3 => 3,
        }
    }
}

/// Page size and per-level index widths used to decompose a virtual address.
///
/// Supplied once per session; the defaults describe the 16 KiB granule of the
/// supported kernels.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TranslationGranule {
    /// Number of page-offset bits (`14` for 16 KiB pages).
    pub page_shift: u32,
    pub l1_index_bits: u32,
    pub l2_index_bits: u32,
    pub l3_index_bits: u32,
    /// Width of the output address in a descriptor.
    pub output_address_bits: u32,
}

impl TranslationGranule {
    /// 16 KiB pages, 3/11/11 index bits, 40-bit output addresses.
    pub const ARM64_16K: Self = Self {
        page_shift: 14,
        l1_index_bits: 3,
        l2_index_bits: 11,
        l3_index_bits: 11,
        output_address_bits: 40,
    };

    #[inline]
    #[must_use]
    pub const fn page_size(&self) -> u64 {
        1 << self.page_shift
    }

    /// Mask selecting the next-level table or output frame in a descriptor.
    #[inline]
    #[must_use]
    pub const fn frame_mask(&self) -> u64 {
        ((1u64 << self.output_address_bits) - 1) & !(self.page_size() - 1)
    }

    #[inline]
    #[must_use]
    pub const fn page_offset(&self, va: VirtualAddress) -> u64 {
        va.page_offset(self.page_size())
    }

    /// Table index for `va` at `level`.
    ///
    /// [`TranslationLevel::L0`] is not part of this granule and always yields `0`.
    #[inline]
    #[must_use]
    pub const fn index(&self, level: TranslationLevel, va: VirtualAddress) -> u64 {
        let l3_shift = self.page_shift;
        let l2_shift = l3_shift + self.l3_index_bits;
        let l1_shift = l2_shift + self.l2_index_bits;
        match level {
            TranslationLevel::L0 => 0,
            TranslationLevel::L1 => va.index_bits(l1_shift, self.l1_index_bits),
            TranslationLevel::L2 => va.index_bits(l2_shift, self.l2_index_bits),
            TranslationLevel::L3 => va.index_bits(l3_shift, self.l3_index_bits),
        }
    }
}

impl Default for TranslationGranule {
    fn default() -> Self {
        Self::ARM64_16K
    }
}
