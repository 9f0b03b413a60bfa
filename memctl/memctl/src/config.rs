use memctl_info::{
    AddressHeuristics, DEFAULT_PAGE_SIZE, KernelFunctions, TranslationStrategy,
    TranslationTableBase, ZoneLayout,
};
use memctl_vmem::TranslationGranule;

/// Everything a session needs to know about the target, fixed at session start.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct SessionConfig {
    /// Root of the kernel's translation tables (`ttbr1_el1`).
    pub table_base: TranslationTableBase,
    pub granule: TranslationGranule,
    pub heuristics: AddressHeuristics,
    pub functions: KernelFunctions,
    /// How the safety probe resolves virtual addresses.
    pub translation: TranslationStrategy,
    pub zones: ZoneLayout,
    /// Chunk size of the command layer; a power of two.
    pub page_size: u64,
    /// Probe virtual addresses before non-forced reads and writes.
    pub probe_before_access: bool,
    /// Zone names are cut off after this many bytes.
    pub max_zone_name_len: usize,
}

impl SessionConfig {
    pub const DEFAULT_MAX_ZONE_NAME_LEN: usize = 64;

    /// A configuration with the defaults of the supported 16 KiB targets.
    #[must_use]
    pub const fn new(
        table_base: TranslationTableBase,
        functions: KernelFunctions,
        zones: ZoneLayout,
    ) -> Self {
        Self {
            table_base,
            granule: TranslationGranule::ARM64_16K,
            heuristics: AddressHeuristics::ARM64_KERNEL,
            functions,
            translation: TranslationStrategy::PageTableWalk,
            zones,
            page_size: DEFAULT_PAGE_SIZE,
            probe_before_access: true,
            max_zone_name_len: Self::DEFAULT_MAX_ZONE_NAME_LEN,
        }
    }

    #[must_use]
    pub const fn with_translation(mut self, translation: TranslationStrategy) -> Self {
        self.translation = translation;
        self
    }

    #[must_use]
    pub const fn with_probe_before_access(mut self, probe: bool) -> Self {
        self.probe_before_access = probe;
        self
    }

    #[must_use]
    pub const fn with_page_size(mut self, page_size: u64) -> Self {
        debug_assert!(page_size.is_power_of_two());
        self.page_size = page_size;
        self
    }

    #[must_use]
    pub const fn with_max_zone_name_len(mut self, len: usize) -> Self {
        self.max_zone_name_len = len;
        self
    }
}
