//! # Translation Table Descriptors
//!
//! Bitfield views of the three ARM64 VMSAv8-64 descriptor formats used by the
//! kernel's stage-1 tables. Only the fields the engine reads or rewrites are
//! exposed; everything else is carried through untouched.

use crate::granule::TranslationLevel;
use bitfield_struct::bitfield;

/// Low-bit pattern of a table (L0–L2) or page (L3) descriptor.
const TABLE_OR_PAGE: u64 = 0b11;
/// Low-bit pattern of a block descriptor.
const BLOCK: u64 = 0b01;

/// What a raw entry is, given the level it was read from.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DescriptorKind {
    Invalid,
    /// Points at the next-level table (L0–L2, low bits `0b11`).
    Table,
    /// Maps a large region directly (L2 only, low bits `0b01`).
    Block,
    /// Maps one page (L3 only, low bits `0b11`).
    Page,
}

impl DescriptorKind {
    #[must_use]
    pub const fn classify(level: TranslationLevel, raw: u64) -> Self {
        match (level, raw & 0b11) {
            (TranslationLevel::L3, TABLE_OR_PAGE) => Self::Page,
            (_, TABLE_OR_PAGE) => Self::Table,
            (TranslationLevel::L2, BLOCK) => Self::Block,
            _ => Self::Invalid,
        }
    }

    /// Whether the walker may continue past (or resolve through) this entry.
    #[inline]
    #[must_use]
    pub const fn continues_walk(self) -> bool {
        matches!(self, Self::Table | Self::Page)
    }
}

/// Table descriptor (L0–L2, low bits `0b11`).
///
/// | Bits  | Field |
/// |-------|-------|
/// | 0     | valid |
/// | 1     | table (must be 1) |
/// | 12–51 | next-level table address |
/// | 59    | `PXNTable` |
/// | 60    | `UXNTable` (`XNTable`) |
/// | 61–62 | `APTable` |
/// | 63    | `NSTable` |
#[bitfield(u64)]
pub struct TableDescriptor {
    pub valid: bool,
    pub is_table: bool,
    #[bits(10)]
    __ignored_low: u16,
    /// Bits `[51:12]` of the next-level table address.
    #[bits(40)]
    pub next_table_bits: u64,
    #[bits(7)]
    __ignored_high: u8,
    /// Privileged execute-never for everything reached through this table.
    pub pxn_table: bool,
    pub uxn_table: bool,
    #[bits(2)]
    pub ap_table: u8,
    pub ns_table: bool,
}

/// Page descriptor (L3, low bits `0b11`).
///
/// | Bits  | Field |
/// |-------|-------|
/// | 0     | valid |
/// | 1     | page (must be 1) |
/// | 2–4   | `AttrIndx` |
/// | 5     | `NS` |
/// | 6–7   | `AP[2:1]` |
/// | 8–9   | `SH` |
/// | 10    | `AF` |
/// | 11    | `nG` |
/// | 12–51 | output address |
/// | 52    | contiguous hint |
/// | 53    | `PXN` |
/// | 54    | `UXN` |
/// | 55–58 | software use |
#[bitfield(u64)]
pub struct PageDescriptor {
    pub valid: bool,
    pub is_page: bool,
    #[bits(3)]
    pub attr_index: u8,
    pub non_secure: bool,
    /// `AP[2:1]`: bit 7 set means read-only.
    #[bits(2)]
    pub access_permissions: u8,
    #[bits(2)]
    pub shareability: u8,
    pub access_flag: bool,
    pub not_global: bool,
    /// Bits `[51:12]` of the output address.
    #[bits(40)]
    pub output_address_bits: u64,
    pub contiguous: bool,
    /// Privileged execute-never.
    pub pxn: bool,
    /// Unprivileged execute-never.
    pub uxn: bool,
    #[bits(4)]
    pub software: u8,
    #[bits(5)]
    __ignored: u8,
}

/// Block descriptor (L2, low bits `0b01`).
///
/// Shares its attribute layout with [`PageDescriptor`]; only bit 1 differs.
pub type BlockDescriptor = PageDescriptor;
