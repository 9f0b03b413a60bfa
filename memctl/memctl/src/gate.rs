//! # Safety Gate
//!
//! Pre-flight checks applied before any non-forced read or write.

use crate::GateError;
use memctl_info::AddressHeuristics;

/// Check an address/length pair.
///
/// In order: `address + length` must not wrap, then the address must have the
/// shape of a physical address (`physical`) or of a kernel virtual address.
///
/// # Errors
/// The first check that failed.
pub fn validate(
    heuristics: &AddressHeuristics,
    address: u64,
    length: u64,
    physical: bool,
) -> Result<(), GateError> {
    if address.checked_add(length).is_none() {
        return Err(GateError::Overflow { address, length });
    }

    let plausible = if physical {
        heuristics.is_physical_address(address)
    } else {
        heuristics.is_kernel_address(address)
    };
    if !plausible {
        return Err(GateError::BadAddressSpace { address, physical });
    }

    Ok(())
}
