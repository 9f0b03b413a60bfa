//! # Writes

use crate::chunks::{page_remainder, scratch_buffer};
use crate::kernel_call::KernelCall;
use crate::kernel_io::KernelIo;
use crate::session::Session;
use crate::{AccessWidth, MemctlError, MemoryAccessFlags};
use memctl_addresses::KernelAddress;

impl<K, I> Session<'_, K, I>
where
    K: KernelCall + ?Sized,
    I: KernelIo + ?Sized,
{
    /// Write `data` at `address`, one write call per page-bounded chunk.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    /// Safety gate rejections, [`MemctlError::PartialTransfer`] if a chunk
    /// writes nothing, [`MemctlError::Interrupted`] between chunks, and
    /// primitive failures.
    pub fn write_data(
        &self,
        address: u64,
        data: &[u8],
        flags: MemoryAccessFlags,
        access: Option<AccessWidth>,
    ) -> Result<u64, MemctlError> {
        let mut address = KernelAddress::new(address, flags.is_physical());
        self.check(address, data.len() as u64, flags)?;

        let page_size = self.config().page_size;
        let mut rest = data;
        while !rest.is_empty() {
            self.poll_cancelled()?;

            let bound = page_remainder(address.as_u64(), page_size);
            let len = usize::try_from(bound).map_or(rest.len(), |b| b.min(rest.len()));
            let written = self.io().write(address, &rest[..len], access)?.min(len);
            if written == 0 {
                return Err(MemctlError::PartialTransfer {
                    address: address.as_u64(),
                    remaining: rest.len() as u64,
                });
            }

            rest = &rest[written..];
            if rest.is_empty() {
                break;
            }
            address = address
                .checked_add(written as u64)
                .ok_or(MemctlError::Overflow {
                    address: address.as_u64(),
                    length: rest.len() as u64,
                })?;
        }

        Ok(data.len() as u64)
    }

    /// Write the low `width` bytes of `value`, little-endian.
    ///
    /// # Errors
    /// As [`write_data`](Self::write_data).
    pub fn write_word(
        &self,
        address: u64,
        value: u64,
        width: AccessWidth,
        flags: MemoryAccessFlags,
        access: Option<AccessWidth>,
    ) -> Result<u64, MemctlError> {
        let bytes = value.to_le_bytes();
        self.write_data(address, &bytes[..width.bytes()], flags, access)
    }

    /// Write `string` up to its first NUL, followed by a terminating NUL.
    ///
    /// # Errors
    /// [`MemctlError::AllocationFailure`], otherwise as [`write_data`](Self::write_data).
    pub fn write_string(
        &self,
        address: u64,
        string: &str,
        flags: MemoryAccessFlags,
        access: Option<AccessWidth>,
    ) -> Result<u64, MemctlError> {
        let text = string.split('\0').next().unwrap_or_default().as_bytes();
        let mut data = scratch_buffer(text.len() + 1)?;
        data[..text.len()].copy_from_slice(text);
        self.write_data(address, &data, flags, access)
    }
}
