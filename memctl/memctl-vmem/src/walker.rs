//! # Page Table Walker
//!
//! Software translation of kernel virtual addresses through the session's
//! translation tables.
//!
//! The walk always starts at L1 and visits L2 and L3 in order. It stops at the
//! first entry whose low bits are not `0b11` and never reads a level below it,
//! so the number of physical reads tells exactly where translation failed.

use crate::descriptor::DescriptorKind;
use crate::granule::{TranslationGranule, TranslationLevel};
use crate::{PhysicalWords, TranslationTableBase};
use memctl_addresses::{PhysicalAddress, VirtualAddress};

/// One translation table entry as it was read during a walk.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct EntryRead {
    pub level: TranslationLevel,
    /// Physical location of the entry, for writing it back.
    pub location: PhysicalAddress,
    /// Raw 64-bit descriptor value.
    pub raw: u64,
}

impl EntryRead {
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> DescriptorKind {
        DescriptorKind::classify(self.level, self.raw)
    }
}

/// Result of walking one virtual address.
///
/// Carries every entry that was read. Levels below the one that stopped the
/// walk are `None` because they were never read.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TranslationWalk {
    pub va: VirtualAddress,
    pub l1: EntryRead,
    pub l2: Option<EntryRead>,
    pub l3: Option<EntryRead>,
    /// The translated address, if all three levels resolved.
    pub physical: Option<PhysicalAddress>,
}

impl TranslationWalk {
    #[inline]
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.physical.is_some()
    }

    /// The last entry read; on failure this is the entry that stopped the walk.
    #[must_use]
    pub const fn last(&self) -> EntryRead {
        match (self.l2, self.l3) {
            (_, Some(l3)) => l3,
            (Some(l2), None) => l2,
            (None, None) => self.l1,
        }
    }

    /// The L3 page descriptor, only if translation succeeded.
    #[must_use]
    pub const fn leaf(&self) -> Option<EntryRead> {
        if self.is_resolved() { self.l3 } else { None }
    }

    /// Number of physical reads the walk performed.
    #[must_use]
    pub const fn reads(&self) -> usize {
        match (self.l2, self.l3) {
            (_, Some(_)) => 3,
            (Some(_), None) => 2,
            (None, None) => 1,
        }
    }
}

/// Walks the translation tables rooted at a fixed [`TranslationTableBase`].
pub struct PageTableWalker<'a, P>
where
    P: PhysicalWords + ?Sized,
{
    phys: &'a P,
    base: TranslationTableBase,
    granule: TranslationGranule,
}

impl<'a, P> PageTableWalker<'a, P>
where
    P: PhysicalWords + ?Sized,
{
    #[must_use]
    pub const fn new(phys: &'a P, base: TranslationTableBase, granule: TranslationGranule) -> Self {
        Self {
            phys,
            base,
            granule,
        }
    }

    #[inline]
    #[must_use]
    pub const fn granule(&self) -> TranslationGranule {
        self.granule
    }

    #[inline]
    #[must_use]
    pub const fn physical_words(&self) -> &'a P {
        self.phys
    }

    /// Translate `va`, returning `None` if any level is not a `0b11` descriptor.
    ///
    /// # Errors
    /// Propagates the first failed physical read.
    pub fn translate(&self, va: VirtualAddress) -> Result<Option<PhysicalAddress>, P::Error> {
        Ok(self.walk(va)?.physical)
    }

    /// Translate `va` and report every entry read on the way.
    ///
    /// # Errors
    /// Propagates the first failed physical read.
    pub fn walk(&self, va: VirtualAddress) -> Result<TranslationWalk, P::Error> {
        let l1 = self.read_entry(TranslationLevel::L1, self.base.physical_address(), va)?;
        let Some(l2_table) = self.next_table(l1, va) else {
            return Ok(TranslationWalk {
                va,
                l1,
                l2: None,
                l3: None,
                physical: None,
            });
        };

        let l2 = self.read_entry(TranslationLevel::L2, l2_table, va)?;
        let Some(l3_table) = self.next_table(l2, va) else {
            return Ok(TranslationWalk {
                va,
                l1,
                l2: Some(l2),
                l3: None,
                physical: None,
            });
        };

        let l3 = self.read_entry(TranslationLevel::L3, l3_table, va)?;
        let offset = self.granule.page_offset(va);
        let physical = self
            .next_table(l3, va)
            .map(|frame| PhysicalAddress::new(frame.as_u64() | offset));

        Ok(TranslationWalk {
            va,
            l1,
            l2: Some(l2),
            l3: Some(l3),
            physical,
        })
    }

    fn read_entry(
        &self,
        level: TranslationLevel,
        table: PhysicalAddress,
        va: VirtualAddress,
    ) -> Result<EntryRead, P::Error> {
        let location = table + 8 * self.granule.index(level, va);
        let raw = self.phys.read64(location)?;
        Ok(EntryRead {
            level,
            location,
            raw,
        })
    }

    /// Frame the entry points at, if the walk may go on.
    fn next_table(&self, entry: EntryRead, va: VirtualAddress) -> Option<PhysicalAddress> {
        if !entry.kind().continues_walk() {
            log::trace!(
                "translation of {va:?} stopped at {:?}: entry {:#018x} at {:?}",
                entry.level,
                entry.raw,
                entry.location
            );
            return None;
        }
        Some(PhysicalAddress::new(entry.raw).mask(self.granule.frame_mask()))
    }
}
