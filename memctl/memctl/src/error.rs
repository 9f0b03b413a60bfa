use memctl_addresses::{KernelAddress, PhysicalAddress, VirtualAddress};
use std::io;

/// Failure of the kernel-call primitive.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum KernelCallError {
    #[error("kernel call to {function} failed: {reason}")]
    Failed {
        function: VirtualAddress,
        reason: String,
    },
    #[error("kernel calls take at most 7 arguments, got {given}")]
    TooManyArguments { given: usize },
    #[error("physical word at {0} crosses the end of the address space")]
    OutOfRange(PhysicalAddress),
}

/// Failure of the page-granular kernel I/O primitive.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum KernelIoError {
    #[error("kernel I/O at {address} failed: {reason}")]
    Failed {
        address: KernelAddress,
        reason: String,
    },
    #[error(transparent)]
    KernelCall(#[from] KernelCallError),
}

/// Rejection by the safety gate.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, thiserror::Error)]
pub enum GateError {
    #[error("address {address:#x} + length {length:#x} wraps the address space")]
    Overflow { address: u64, length: u64 },
    #[error("{address:#x} does not look like a {} address", space_name(.physical))]
    BadAddressSpace { address: u64, physical: bool },
}

/// Why a memory operation failed.
///
/// A failed operation never invalidates the session; the next command can
/// run as usual.
#[derive(Debug, thiserror::Error)]
pub enum MemctlError {
    #[error("address {address:#x} + length {length:#x} wraps the address space")]
    Overflow { address: u64, length: u64 },
    #[error("{address:#x} does not look like a {} address", space_name(.physical))]
    BadAddressSpace { address: u64, physical: bool },
    #[error("{address} is not mapped")]
    TranslationFailure { address: VirtualAddress },
    #[error("no bytes transferred at {address:#x}, {remaining:#x} bytes left")]
    PartialTransfer { address: u64, remaining: u64 },
    #[error("interrupted")]
    Interrupted,
    #[error("could not allocate a {size} byte buffer")]
    AllocationFailure { size: usize },
    #[error("protection bypass is not available on this target")]
    BypassUnavailable,
    #[error("invalid width {width}: must be a power of two no larger than 8")]
    InvalidWidth { width: usize },
    #[error(transparent)]
    KernelCall(#[from] KernelCallError),
    #[error(transparent)]
    KernelIo(#[from] KernelIoError),
    #[error("could not write output: {0}")]
    Output(#[from] io::Error),
}

impl From<GateError> for MemctlError {
    fn from(e: GateError) -> Self {
        match e {
            GateError::Overflow { address, length } => Self::Overflow { address, length },
            GateError::BadAddressSpace { address, physical } => {
                Self::BadAddressSpace { address, physical }
            }
        }
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn space_name(physical: &bool) -> &'static str {
    if *physical { "physical" } else { "kernel" }
}
