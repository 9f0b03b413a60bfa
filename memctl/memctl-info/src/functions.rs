use crate::DEFAULT_PHYSICAL_BASE;
use memctl_addresses::{PhysicalAddress, VirtualAddress};

/// Addresses of kernel routines the engine calls through the kernel-call primitive.
///
/// The mandatory pair backs the physical word accessor. The optional entries
/// are only needed by the matching [`TranslationStrategy`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct KernelFunctions {
    /// `ml_phys_read_data(paddr, size) -> value`.
    pub phys_read_data: VirtualAddress,
    /// `ml_phys_write_data(paddr, value, size)`.
    pub phys_write_data: VirtualAddress,
}

impl KernelFunctions {
    #[inline]
    #[must_use]
    pub const fn new(phys_read_data: VirtualAddress, phys_write_data: VirtualAddress) -> Self {
        Self {
            phys_read_data,
            phys_write_data,
        }
    }
}

/// How the safety probe resolves a kernel virtual address.
///
/// Which strategy applies to a given target is an external decision; the
/// engine never infers it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum TranslationStrategy {
    /// Walk the session's translation tables through the physical word accessor.
    #[default]
    PageTableWalk,
    /// Call the kernel's `kvtophys(va)`.
    ///
    /// Zero means "not mapped", otherwise the result is an offset from
    /// `physical_base`.
    KernelVirtToPhys {
        function: VirtualAddress,
        physical_base: PhysicalAddress,
    },
    /// Call `pmap_find_phys(kernel_pmap, va)` and rebuild the address from the
    /// returned physical page number.
    PmapFindPhys {
        function: VirtualAddress,
        kernel_pmap: VirtualAddress,
    },
}

impl TranslationStrategy {
    /// `kvtophys` relative to the default DRAM base.
    #[inline]
    #[must_use]
    pub const fn kvtophys(function: VirtualAddress) -> Self {
        Self::KernelVirtToPhys {
            function,
            physical_base: DEFAULT_PHYSICAL_BASE,
        }
    }
}
