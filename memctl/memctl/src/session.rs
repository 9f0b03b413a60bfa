//! # Inspection Session
//!
//! A [`Session`] owns everything that used to be process-wide state: the
//! configuration, the primitives, the cancellation token and the resolved
//! bypass capability. Every operation takes `&self`; a failed operation leaves
//! the session usable.

use crate::kernel_call::{KernelCall, PhysicalWordAccessor, ProtectionChanger};
use crate::kernel_io::KernelIo;
use crate::{MemctlError, MemoryAccessFlags, SessionConfig, VmProtection, gate};
use memctl_addresses::{AddressRange, KernelAddress, PhysicalAddress, VirtualAddress};
use memctl_info::TranslationStrategy;
use memctl_sync::CancellationToken;
use memctl_vmem::{
    BypassError, BypassResolver, GrantReport, PageTableWalker, ProtectionBypass, page_span,
};

pub struct Session<'k, K, I>
where
    K: KernelCall + ?Sized,
    I: KernelIo + ?Sized,
{
    config: SessionConfig,
    kernel: &'k K,
    io: &'k I,
    phys: PhysicalWordAccessor<'k, K>,
    bypass: ProtectionBypass,
    cancel: CancellationToken,
}

impl<'k, K, I> Session<'k, K, I>
where
    K: KernelCall + ?Sized,
    I: KernelIo + ?Sized,
{
    /// Open a session. The bypass parameters are resolved here, once.
    pub fn new<R>(
        config: SessionConfig,
        kernel: &'k K,
        io: &'k I,
        resolver: &R,
        cancel: CancellationToken,
    ) -> Self
    where
        R: BypassResolver + ?Sized,
    {
        log::debug!(
            "opening session: tables at {:?}, {:?}",
            config.table_base,
            config.translation
        );
        Self {
            phys: PhysicalWordAccessor::new(kernel, config.functions),
            bypass: ProtectionBypass::resolve(resolver),
            config,
            kernel,
            io,
            cancel,
        }
    }

    #[inline]
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    #[inline]
    #[must_use]
    pub const fn bypass(&self) -> ProtectionBypass {
        self.bypass
    }

    #[inline]
    pub(crate) const fn io(&self) -> &'k I {
        self.io
    }

    #[inline]
    #[must_use]
    pub const fn physical_words(&self) -> &PhysicalWordAccessor<'k, K> {
        &self.phys
    }

    #[must_use]
    pub const fn walker(&self) -> PageTableWalker<'_, PhysicalWordAccessor<'k, K>> {
        PageTableWalker::new(&self.phys, self.config.table_base, self.config.granule)
    }

    /// Translate through the session's page tables.
    ///
    /// # Errors
    /// A failed physical read.
    pub fn translate(&self, va: VirtualAddress) -> Result<Option<PhysicalAddress>, MemctlError> {
        Ok(self.walker().translate(va)?)
    }

    /// Resolve `va` with the configured [`TranslationStrategy`].
    ///
    /// # Errors
    /// A failed kernel call or physical read.
    pub fn kvtophys(&self, va: VirtualAddress) -> Result<Option<PhysicalAddress>, MemctlError> {
        match self.config.translation {
            TranslationStrategy::PageTableWalk => self.translate(va),
            TranslationStrategy::KernelVirtToPhys {
                function,
                physical_base,
            } => {
                let offset = self.kernel.call(function, &[va.as_u64()])?;
                if offset == 0 {
                    return Ok(None);
                }
                Ok(physical_base.checked_add(offset))
            }
            TranslationStrategy::PmapFindPhys {
                function,
                kernel_pmap,
            } => {
                let ppnum = self
                    .kernel
                    .call(function, &[kernel_pmap.as_u64(), va.as_u64()])?;
                if ppnum == 0 {
                    return Ok(None);
                }
                let offset = self.config.granule.page_offset(va);
                Ok(ppnum
                    .checked_mul(self.config.granule.page_size())
                    .map(|frame| PhysicalAddress::new(frame | offset)))
            }
        }
    }

    /// Whether `va` currently translates to a physical frame.
    ///
    /// # Errors
    /// A failed kernel call or physical read.
    pub fn probe(&self, va: VirtualAddress) -> Result<bool, MemctlError> {
        Ok(self.kvtophys(va)?.is_some())
    }

    /// Run the safety gate for `length` bytes at `address`, unless forced.
    ///
    /// # Errors
    /// `Overflow` or `BadAddressSpace` from validation, then `TranslationFailure`
    /// if probing is enabled and the start address does not translate.
    pub fn check(
        &self,
        address: KernelAddress,
        length: u64,
        flags: MemoryAccessFlags,
    ) -> Result<(), MemctlError> {
        if flags.is_forced() {
            return Ok(());
        }

        if let Err(e) = gate::validate(
            &self.config.heuristics,
            address.as_u64(),
            length,
            address.is_physical(),
        ) {
            log::debug!("safety gate rejected {address:?}+{length:#x}: {e}");
            return Err(e.into());
        }

        if let KernelAddress::Virtual(va) = address
            && self.config.probe_before_access
            && !self.probe(va)?
        {
            log::debug!("safety gate rejected {va:?}: not mapped");
            return Err(MemctlError::TranslationFailure { address: va });
        }

        Ok(())
    }

    /// Fail with [`MemctlError::Interrupted`] if cancellation was requested.
    pub(crate) fn poll_cancelled(&self) -> Result<(), MemctlError> {
        if self.cancel.is_cancelled() {
            log::info!("operation interrupted");
            return Err(MemctlError::Interrupted);
        }
        Ok(())
    }

    /// Clear `PXN` on every page of `range`.
    ///
    /// # Errors
    /// `BypassUnavailable` without touching memory, or a failed descriptor write.
    pub fn grant_execute(&self, range: AddressRange) -> Result<GrantReport, MemctlError> {
        self.bypass
            .grant_execute(&self.walker(), range)
            .map_err(|e| match e {
                BypassError::Unavailable => MemctlError::BypassUnavailable,
                BypassError::Physical(e) => MemctlError::KernelCall(e),
            })
    }

    /// Change protection of `[address, address + size)`; for `EXECUTE` also
    /// clear the execute-never bits of every page in it.
    ///
    /// # Errors
    /// - `BypassUnavailable` for `EXECUTE` without bypass; nothing is called.
    /// - `Overflow` if the range wraps; nothing is called.
    /// - The protection change or descriptor write failure.
    pub fn protect<P>(
        &self,
        changer: &P,
        address: VirtualAddress,
        size: u64,
        protection: VmProtection,
    ) -> Result<Option<GrantReport>, MemctlError>
    where
        P: ProtectionChanger + ?Sized,
    {
        let execute = protection.contains(VmProtection::EXECUTE);
        if execute && !self.bypass.is_available() {
            return Err(MemctlError::BypassUnavailable);
        }
        let range = page_span(address, size, self.config.granule.page_size()).map_err(|_| {
            MemctlError::Overflow {
                address: address.as_u64(),
                length: size,
            }
        })?;

        changer.grant_protection(address, size, protection)?;
        if !execute {
            return Ok(None);
        }

        let report = self.grant_execute(range)?;
        log::debug!("{range:?}: {report:?}");
        Ok(Some(report))
    }
}
