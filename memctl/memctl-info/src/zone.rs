use memctl_addresses::VirtualAddress;

/// Layout of the zone allocator's bookkeeping in kernel memory.
///
/// Every offset here was recovered from a specific kernel release and is
/// expected to change between releases. Keep one named constructor per known
/// release instead of patching values at the call site.
///
/// ```text
/// zone_map      [zone_map_min, zone_map_max)   one metadata record per page
/// metadata      metadata_min + page_index * page_metadata_stride
///                 +zone_index_offset  u16 index into the zone array
/// zone array    zone_array_base + zone_index * zone_stride
///                 +element_size_offset  u64
///                 +name_pointer_offset  char *
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ZoneLayout {
    /// Lowest address of the zone map (inclusive).
    pub zone_map_min: VirtualAddress,
    /// Highest address of the zone map (exclusive).
    pub zone_map_max: VirtualAddress,
    /// Start of the per-page metadata region.
    pub metadata_min: VirtualAddress,
    /// Address of the first zone descriptor.
    pub zone_array_base: VirtualAddress,
    /// Size of one per-page metadata record.
    pub page_metadata_stride: u64,
    /// Offset of the 16-bit zone index inside a metadata record.
    pub zone_index_offset: u64,
    /// Size of one zone descriptor.
    pub zone_stride: u64,
    /// Offset of the element size inside a zone descriptor.
    pub element_size_offset: u64,
    /// Offset of the name pointer inside a zone descriptor.
    pub name_pointer_offset: u64,
}

impl ZoneLayout {
    /// Layout used by the iOS 13 kernels.
    #[must_use]
    pub const fn ios13(
        zone_map_min: VirtualAddress,
        zone_map_max: VirtualAddress,
        metadata_min: VirtualAddress,
        zone_array_base: VirtualAddress,
    ) -> Self {
        Self {
            zone_map_min,
            zone_map_max,
            metadata_min,
            zone_array_base,
            page_metadata_stride: 24,
            zone_index_offset: 0x14,
            zone_stride: 0x140,
            element_size_offset: 0xF0,
            name_pointer_offset: 0x120,
        }
    }

    #[inline]
    #[must_use]
    pub const fn contains(&self, address: VirtualAddress) -> bool {
        address.as_u64() >= self.zone_map_min.as_u64()
            && address.as_u64() < self.zone_map_max.as_u64()
    }
}
