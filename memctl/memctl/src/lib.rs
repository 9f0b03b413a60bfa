//! # Kernel Memory Inspection and Patching
//!
//! Reads, writes and attributes kernel and physical memory of a live ARM64
//! kernel, and grants execute permission to pages the hardware would
//! otherwise keep execute-never.
//!
//! ## Data path
//!
//! ```text
//!   typed request (ReadRequest / WriteRequest / FindQuery / zone lookup)
//!          │
//!          ▼
//!   Safety gate ── overflow, address shape, translation probe (unless FORCE)
//!          │
//!          ▼
//!   KernelIo ── page-bounded reads/writes, polled for cancellation
//!
//!   PageTableWalker / ProtectionBypass
//!          │
//!          ▼
//!   PhysicalWordAccessor ── 2 × 32-bit ml_phys_{read,write}_data
//!          │
//!          ▼
//!   KernelCall ── invoke a kernel function by address
//! ```
//!
//! The two primitives at the bottom ([`KernelCall`] and [`KernelIo`]) and the
//! protection change ([`ProtectionChanger`]) are provided by the embedding
//! tool. Everything device- or release-specific is handed over once in a
//! [`SessionConfig`].
//!
//! ## Example
//!
//! ```no_run
//! # use memctl::*;
//! # fn demo<K: KernelCall, I: KernelIo>(session: &Session<'_, K, I>) -> Result<(), MemctlError> {
//! let mut out = std::io::stdout().lock();
//! let mut request = ReadRequest::new(0xFFFF_FFF0_0700_4000, ReadFormat::Dump);
//! request.width = AccessWidth::WORD;
//! session.read(&mut out, &request)?;
//! session.zone_command(&mut out, VirtualAddress::new(0xFFFF_FFE0_0123_4560))?;
//! # Ok(())
//! # }
//! ```

mod access;
mod chunks;
mod config;
mod error;
mod find;
pub mod gate;
mod kernel_call;
mod kernel_io;
mod ops;
mod read;
mod session;
mod write;
mod zone;

pub use crate::access::{AccessWidth, MemoryAccessFlags, VmProtection};
pub use crate::config::SessionConfig;
pub use crate::error::{GateError, KernelCallError, KernelIoError, MemctlError};
pub use crate::find::FindQuery;
pub use crate::kernel_call::{
    KernelCall, MAX_KERNEL_CALL_ARGS, PhysicalWordAccessor, ProtectionChanger,
};
pub use crate::kernel_io::{KernelIo, ReadOutcome};
pub use crate::ops::{DEFAULT_DUMP_LENGTH, ReadFormat, ReadRequest, WriteData, WriteRequest};
pub use crate::session::Session;
pub use crate::zone::ZoneMetadataEntry;

pub use memctl_addresses::{AddressRange, KernelAddress, PhysicalAddress, VirtualAddress};
pub use memctl_info::{
    AddressHeuristics, KernelFunctions, TranslationStrategy, TranslationTableBase, ZoneLayout,
};
pub use memctl_sync::CancellationToken;
pub use memctl_vmem::{BypassAvailability, BypassResolver, GrantReport};
