use crate::{AccessWidth, KernelIoError};
use memctl_addresses::KernelAddress;

/// Result of one page-bounded read.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ReadOutcome {
    /// Bytes copied into the front of the buffer.
    pub transferred: usize,
    /// After a short read: the next address that may be readable, if any.
    pub next: Option<u64>,
}

/// Page-granular transfer of kernel or physical memory.
///
/// Neither call crosses a page boundary for the engine; the command layer
/// splits its work accordingly. A short transfer is not an error.
pub trait KernelIo {
    /// Read up to `buf.len()` bytes at `address`.
    ///
    /// `access` selects the transfer granularity; `None` lets the primitive choose.
    ///
    /// # Errors
    /// [`KernelIoError`] if the primitive itself failed.
    fn read(
        &self,
        address: KernelAddress,
        buf: &mut [u8],
        access: Option<AccessWidth>,
    ) -> Result<ReadOutcome, KernelIoError>;

    /// Write `data` at `address`, returning the number of bytes written.
    ///
    /// # Errors
    /// [`KernelIoError`] if the primitive itself failed.
    fn write(
        &self,
        address: KernelAddress,
        data: &[u8],
        access: Option<AccessWidth>,
    ) -> Result<usize, KernelIoError>;
}

impl<T> KernelIo for &T
where
    T: KernelIo + ?Sized,
{
    fn read(
        &self,
        address: KernelAddress,
        buf: &mut [u8],
        access: Option<AccessWidth>,
    ) -> Result<ReadOutcome, KernelIoError> {
        (**self).read(address, buf, access)
    }

    fn write(
        &self,
        address: KernelAddress,
        data: &[u8],
        access: Option<AccessWidth>,
    ) -> Result<usize, KernelIoError> {
        (**self).write(address, data, access)
    }
}
