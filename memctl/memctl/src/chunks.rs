//! Page-bounded, cancellable reads shared by the command layer.

use crate::kernel_call::KernelCall;
use crate::kernel_io::KernelIo;
use crate::session::Session;
use crate::{AccessWidth, MemctlError};
use memctl_addresses::KernelAddress;

/// A zeroed scratch buffer of `size` bytes, reported as
/// [`MemctlError::AllocationFailure`] instead of aborting.
pub(crate) fn scratch_buffer(size: usize) -> Result<Vec<u8>, MemctlError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(size)
        .map_err(|_| MemctlError::AllocationFailure { size })?;
    buf.resize(size, 0);
    Ok(buf)
}

/// Bytes left before the next `page_size` boundary.
pub(crate) const fn page_remainder(address: u64, page_size: u64) -> u64 {
    page_size - (address & (page_size - 1))
}

/// Reads `[address, address + remaining)` one page-bounded chunk at a time.
///
/// Cancellation is polled before every chunk. A chunk that transfers nothing
/// ends the read with [`MemctlError::PartialTransfer`]; a short chunk simply
/// continues from where it stopped.
pub(crate) struct ChunkReader<'s, 'k, K, I>
where
    K: KernelCall + ?Sized,
    I: KernelIo + ?Sized,
{
    session: &'s Session<'k, K, I>,
    address: KernelAddress,
    remaining: u64,
    access: Option<AccessWidth>,
    buf: Vec<u8>,
}

impl<'s, 'k, K, I> ChunkReader<'s, 'k, K, I>
where
    K: KernelCall + ?Sized,
    I: KernelIo + ?Sized,
{
    pub fn new(
        session: &'s Session<'k, K, I>,
        address: KernelAddress,
        length: u64,
        access: Option<AccessWidth>,
    ) -> Result<Self, MemctlError> {
        let page_size = session.config().page_size;
        let size = usize::try_from(page_size.min(length))
            .map_err(|_| MemctlError::AllocationFailure { size: usize::MAX })?;
        Ok(Self {
            session,
            address,
            remaining: length,
            access,
            buf: scratch_buffer(size)?,
        })
    }

    /// Read the next chunk; `Ok(None)` once everything was read.
    pub fn next_chunk(&mut self) -> Result<Option<&[u8]>, MemctlError> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.session.poll_cancelled()?;

        let page_size = self.session.config().page_size;
        let want = page_remainder(self.address.as_u64(), page_size).min(self.remaining);
        // `want` never exceeds the buffer, which holds min(page, length) bytes.
        let want = usize::try_from(want).map_or(self.buf.len(), |w| w.min(self.buf.len()));

        let outcome = self
            .session
            .io()
            .read(self.address, &mut self.buf[..want], self.access)?;
        let got = outcome.transferred.min(want);
        if got == 0 {
            return Err(MemctlError::PartialTransfer {
                address: self.address.as_u64(),
                remaining: self.remaining,
            });
        }

        self.remaining -= got as u64;
        match self.address.checked_add(got as u64) {
            Some(next) => self.address = next,
            None if self.remaining == 0 => {}
            None => {
                return Err(MemctlError::Overflow {
                    address: self.address.as_u64(),
                    length: self.remaining,
                });
            }
        }
        Ok(Some(&self.buf[..got]))
    }
}
