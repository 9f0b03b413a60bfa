use crate::{VirtualAddress, align_down, align_up};
use core::fmt;

/// A half-open virtual address range `[start, end)`.
///
/// Construction is checked: a range whose end would wrap past `u64::MAX` is
/// rejected, so iterating it never overflows.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct AddressRange {
    start: VirtualAddress,
    end: VirtualAddress,
}

impl AddressRange {
    /// Range from explicit bounds. `None` if `end < start`.
    #[inline]
    #[must_use]
    pub const fn new(start: VirtualAddress, end: VirtualAddress) -> Option<Self> {
        if end.as_u64() < start.as_u64() {
            return None;
        }
        Some(Self { start, end })
    }

    /// Range of `len` bytes starting at `start`. `None` if `start + len` wraps.
    #[inline]
    #[must_use]
    pub const fn with_len(start: VirtualAddress, len: u64) -> Option<Self> {
        match start.checked_add(len) {
            Some(end) => Some(Self { start, end }),
            None => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn start(&self) -> VirtualAddress {
        self.start
    }

    #[inline]
    #[must_use]
    pub const fn end(&self) -> VirtualAddress {
        self.end
    }

    #[inline]
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.end.as_u64() - self.start.as_u64()
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    #[must_use]
    pub const fn contains(&self, va: VirtualAddress) -> bool {
        va.as_u64() >= self.start.as_u64() && va.as_u64() < self.end.as_u64()
    }

    /// Widen the range to whole pages of `page_size` bytes.
    ///
    /// `None` if the rounded-up end does not fit into 64 bits. An empty range
    /// stays empty.
    #[inline]
    #[must_use]
    pub const fn page_aligned(&self, page_size: u64) -> Option<Self> {
        let start = align_down(self.start.as_u64(), page_size);
        if self.is_empty() {
            let start = VirtualAddress::new(start);
            return Some(Self { start, end: start });
        }
        match align_up(self.end.as_u64(), page_size) {
            Some(end) => Some(Self {
                start: VirtualAddress::new(start),
                end: VirtualAddress::new(end),
            }),
            None => None,
        }
    }

    /// Iterate the base address of every page overlapping this range.
    ///
    /// An empty range overlaps no page, even at an unaligned start.
    #[must_use]
    pub const fn pages(&self, page_size: u64) -> PageIter {
        let next = align_down(self.start.as_u64(), page_size);
        PageIter {
            next,
            end: if self.is_empty() { next } else { self.end.as_u64() },
            page_size,
        }
    }
}

impl fmt::Debug for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}, {:?})", self.start, self.end)
    }
}

/// Iterator over page base addresses, see [`AddressRange::pages`].
#[derive(Debug, Clone)]
pub struct PageIter {
    next: u64,
    end: u64,
    page_size: u64,
}

impl Iterator for PageIter {
    type Item = VirtualAddress;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let page = VirtualAddress::new(self.next);
        match self.next.checked_add(self.page_size) {
            Some(next) => self.next = next,
            // last page of the address space
            None => self.end = 0,
        }
        Some(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: u64 = 0x4000;

    #[test]
    fn rejects_wrapping_ranges() {
        let (one, two) = (VirtualAddress::new(1), VirtualAddress::new(2));
        assert!(AddressRange::with_len(VirtualAddress::new(u64::MAX), 2).is_none());
        assert!(AddressRange::new(two, one).is_none());
        let r = AddressRange::with_len(VirtualAddress::new(0x1000), 0).unwrap();
        assert!(r.is_empty());
        assert_eq!(r.pages(PAGE).count(), 0);
    }

    #[test]
    fn empty_range_at_unaligned_start_has_no_pages() {
        let r = AddressRange::with_len(VirtualAddress::new(0x4010), 0).unwrap();
        assert_eq!(r.pages(PAGE).count(), 0);
        let r = AddressRange::with_len(VirtualAddress::new(0x4010), 1).unwrap();
        assert_eq!(
            r.pages(PAGE).map(VirtualAddress::as_u64).collect::<Vec<_>>(),
            vec![0x4000]
        );

        let aligned = AddressRange::with_len(VirtualAddress::new(0x4010), 0)
            .and_then(|r| r.page_aligned(PAGE))
            .unwrap();
        assert!(aligned.is_empty());
        assert_eq!(aligned.start().as_u64(), 0x4000);
    }

    #[test]
    fn pages_cover_partial_pages() {
        let r = AddressRange::with_len(VirtualAddress::new(0x3FFF), 2).unwrap();
        let pages: Vec<u64> = r.pages(PAGE).map(VirtualAddress::as_u64).collect();
        assert_eq!(pages, vec![0x0, 0x4000]);
        assert!(r.contains(VirtualAddress::new(0x4000)));
        assert!(!r.contains(VirtualAddress::new(0x4001)));

        let aligned = r.page_aligned(PAGE).unwrap();
        assert_eq!(aligned.start().as_u64(), 0);
        assert_eq!(aligned.end().as_u64(), 0x8000);
    }

    #[test]
    fn last_page_of_address_space_terminates() {
        let start = VirtualAddress::new(u64::MAX - PAGE + 1);
        let r = AddressRange::new(start, VirtualAddress::new(u64::MAX)).unwrap();
        assert_eq!(r.pages(PAGE).count(), 1);
    }
}
