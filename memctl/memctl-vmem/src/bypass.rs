//! # Protection Bypass
//!
//! Grants execute permission to kernel pages by clearing the privileged
//! execute-never bit directly in their L3 descriptors. A generic protection
//! change alone is refused by the hardware for such pages; with the bit
//! cleared, it succeeds.
//!
//! Whether this is possible on a given target depends on device- and
//! release-specific parameters. They are resolved once per session through a
//! [`BypassResolver`]; an unavailable bypass refuses every request without
//! touching a single translation table entry.

use crate::descriptor::{BlockDescriptor, DescriptorKind, PageDescriptor, TableDescriptor};
use crate::granule::TranslationLevel;
use crate::walker::PageTableWalker;
use crate::PhysicalWords;
use memctl_addresses::AddressRange;

/// Clear the execute-never bit that applies to `raw` at `level`.
///
/// - table descriptors (L0–L2): `PXNTable` (bit 59)
/// - block descriptors (L2): `PXN` (bit 53)
/// - page descriptors (L3): `PXN` (bit 53)
///
/// Anything else is returned unchanged. Permission and address bits are never
/// modified.
#[must_use]
pub const fn clear_pxn(level: TranslationLevel, raw: u64) -> u64 {
    match DescriptorKind::classify(level, raw) {
        DescriptorKind::Table => TableDescriptor::from_bits(raw)
            .with_pxn_table(false)
            .into_bits(),
        DescriptorKind::Block => BlockDescriptor::from_bits(raw).with_pxn(false).into_bits(),
        DescriptorKind::Page => PageDescriptor::from_bits(raw).with_pxn(false).into_bits(),
        DescriptorKind::Invalid => raw,
    }
}

/// Outcome of resolving the bypass parameters for the current target.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BypassAvailability {
    Available,
    Unavailable,
}

/// Source of the device/OS-specific bypass parameters.
pub trait BypassResolver {
    fn resolve_bypass_parameters(&self) -> BypassAvailability;
}

impl<F> BypassResolver for F
where
    F: Fn() -> BypassAvailability,
{
    fn resolve_bypass_parameters(&self) -> BypassAvailability {
        self()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BypassError<E> {
    #[error("protection bypass is not available on this target")]
    Unavailable,
    #[error("failed to write translation table entry: {0}")]
    Physical(E),
}

/// What [`ProtectionBypass::grant_execute`] did.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
pub struct GrantReport {
    /// Pages in the range.
    pub pages: usize,
    /// Pages whose L3 descriptor was written back.
    pub patched: usize,
    /// Pages that did not translate and were left alone.
    pub skipped: usize,
}

/// Session-scoped bypass state. The availability never changes after resolution.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ProtectionBypass {
    availability: BypassAvailability,
}

impl ProtectionBypass {
    /// Ask `resolver` once and remember the answer.
    pub fn resolve<R>(resolver: &R) -> Self
    where
        R: BypassResolver + ?Sized,
    {
        let availability = resolver.resolve_bypass_parameters();
        log::info!("protection bypass: {availability:?}");
        Self { availability }
    }

    #[inline]
    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self.availability, BypassAvailability::Available)
    }

    /// Clear `PXN` in the L3 descriptor of every page in `range`.
    ///
    /// Each page is walked exactly once. Pages that fail to translate, including
    /// those whose table reads fail, are skipped; the rest of the range is
    /// still processed.
    ///
    /// # Errors
    /// - [`BypassError::Unavailable`] if the bypass was not resolved; nothing is read or written.
    /// - [`BypassError::Physical`] if writing a descriptor back fails. Pages
    ///   before it stay patched.
    pub fn grant_execute<P>(
        &self,
        walker: &PageTableWalker<'_, P>,
        range: AddressRange,
    ) -> Result<GrantReport, BypassError<P::Error>>
    where
        P: PhysicalWords + ?Sized,
    {
        if !self.is_available() {
            return Err(BypassError::Unavailable);
        }

        let mut report = GrantReport::default();
        for page in range.pages(walker.granule().page_size()) {
            report.pages += 1;

            let leaf = match walker.walk(page) {
                Ok(walk) => walk.leaf(),
                Err(e) => {
                    log::warn!("skipping {page:?}: translation table read failed: {e}");
                    report.skipped += 1;
                    continue;
                }
            };
            let Some(leaf) = leaf else {
                log::warn!("skipping {page:?}: not mapped");
                report.skipped += 1;
                continue;
            };

            let patched = clear_pxn(leaf.level, leaf.raw);
            log::debug!(
                "{page:?}: rewriting L3 entry at {:?} {:#018x} -> {patched:#018x}",
                leaf.location,
                leaf.raw
            );
            walker
                .physical_words()
                .write64(leaf.location, patched)
                .map_err(BypassError::Physical)?;
            report.patched += 1;
        }

        Ok(report)
    }
}
