//! # Memory scanner

use crate::chunks::{page_remainder, scratch_buffer};
use crate::kernel_call::KernelCall;
use crate::kernel_io::KernelIo;
use crate::session::Session;
use crate::{AccessWidth, MemctlError, MemoryAccessFlags, gate};
use memctl_addresses::{KernelAddress, align_up};
use std::io::Write;

/// What to look for, and where.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct FindQuery {
    /// First address to scan.
    pub start: u64,
    /// End of the scan (exclusive).
    pub end: u64,
    pub value: u64,
    /// Size of the little-endian value.
    pub width: AccessWidth,
    /// Only report matches at multiples of this.
    pub alignment: AccessWidth,
}

impl<K, I> Session<'_, K, I>
where
    K: KernelCall + ?Sized,
    I: KernelIo + ?Sized,
{
    /// Print `0x{address:x}` for every aligned occurrence of the value.
    ///
    /// Unreadable holes are skipped using the primitive's next-address hint;
    /// the scan ends early when a short read gives no hint. Address-space
    /// validation covers the whole range unless forced, but holes are
    /// expected and no translation probe is made.
    ///
    /// Returns the number of matches.
    ///
    /// # Errors
    /// Validation failures, [`MemctlError::Interrupted`] between chunks,
    /// primitive and output failures.
    pub fn find<W>(
        &self,
        out: &mut W,
        query: &FindQuery,
        flags: MemoryAccessFlags,
        access: Option<AccessWidth>,
    ) -> Result<u64, MemctlError>
    where
        W: Write + ?Sized,
    {
        let physical = flags.is_physical();
        let width = query.width.bytes();
        let alignment = query.alignment.as_u64();
        if !flags.is_forced() {
            gate::validate(
                &self.config().heuristics,
                query.start,
                query.end.saturating_sub(query.start),
                physical,
            )?;
        }

        let Some(start) = align_up(query.start, alignment) else {
            return Ok(0);
        };
        if start >= query.end || query.end - start < width as u64 {
            return Ok(0);
        }

        let page_size = self.config().page_size;
        let page = usize::try_from(page_size)
            .map_err(|_| MemctlError::AllocationFailure { size: usize::MAX })?;
        // room for the tail of the previous chunk in front of the new one
        let carry_max = width - 1;
        let mut buf = scratch_buffer(carry_max + page)?;

        let mut address = start;
        let mut carry = 0usize;
        let mut matches = 0u64;
        loop {
            self.poll_cancelled()?;

            let want = page_remainder(address, page_size).min(query.end - address);
            let want = usize::try_from(want).map_or(page, |w| w.min(page));
            let outcome = self.io().read(
                KernelAddress::new(address, physical),
                &mut buf[carry..carry + want],
                access,
            )?;
            let got = outcome.transferred.min(want);

            if got > 0 {
                let window = &buf[..carry + got];
                let window_start = address - carry as u64;
                let mut pos = align_up(window_start, alignment).unwrap_or(u64::MAX);
                let window_end = window_start + window.len() as u64;
                while pos.saturating_add(width as u64) <= window_end {
                    let off = usize::try_from(pos - window_start).unwrap_or(usize::MAX);
                    let mut le = [0u8; 8];
                    le[..width].copy_from_slice(&window[off..off + width]);
                    if u64::from_le_bytes(le) == query.value {
                        writeln!(out, "0x{pos:x}")?;
                        matches += 1;
                    }
                    pos += alignment;
                }
            }

            let next = if got == want {
                address.checked_add(got as u64)
            } else {
                outcome.next.and_then(|n| align_up(n, alignment))
            };
            let Some(next) = next.filter(|&n| n > address && n < query.end) else {
                break;
            };

            // carry the tail over only if the next chunk continues this one
            let contiguous = got == want && next == address + got as u64;
            let keep = if contiguous {
                carry_max.min(carry + got)
            } else {
                0
            };
            buf.copy_within(carry + got - keep..carry + got, 0);
            carry = keep;
            address = next;
        }

        log::debug!(
            "scan of [{:#x}, {:#x}) found {matches} matches",
            query.start,
            query.end
        );
        Ok(matches)
    }
}
