//! # Typed operations
//!
//! The entry points a command front end calls. Each request is a plain value;
//! each variant is matched exhaustively.

use crate::kernel_call::KernelCall;
use crate::kernel_io::KernelIo;
use crate::session::Session;
use crate::{AccessWidth, MemctlError, MemoryAccessFlags};
use std::io::Write;

/// Length of a dump when none is given.
pub const DEFAULT_DUMP_LENGTH: u64 = 256;

/// Output format of a [`ReadRequest`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ReadFormat {
    /// Little-endian words of the request's width.
    Words,
    /// Hex+ASCII dump.
    Dump,
    /// Raw bytes.
    Binary,
    /// NUL-terminated string.
    String,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ReadRequest {
    pub address: u64,
    /// Bytes to read; defaults depend on the format.
    pub length: Option<u64>,
    pub flags: MemoryAccessFlags,
    pub width: AccessWidth,
    pub access: Option<AccessWidth>,
    pub format: ReadFormat,
}

impl ReadRequest {
    #[must_use]
    pub const fn new(address: u64, format: ReadFormat) -> Self {
        Self {
            address,
            length: None,
            flags: MemoryAccessFlags::empty(),
            width: AccessWidth::DOUBLE,
            access: None,
            format,
        }
    }

    /// The length actually read: one word for [`ReadFormat::Words`],
    /// [`DEFAULT_DUMP_LENGTH`] for [`ReadFormat::Dump`], unbounded for strings.
    #[must_use]
    pub const fn effective_length(&self) -> Option<u64> {
        match (self.length, self.format) {
            (Some(length), _) => Some(length),
            (None, ReadFormat::Words) => Some(self.width.as_u64()),
            (None, ReadFormat::Dump) => Some(DEFAULT_DUMP_LENGTH),
            (None, ReadFormat::Binary) => Some(0),
            (None, ReadFormat::String) => None,
        }
    }
}

/// Payload of a [`WriteRequest`].
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum WriteData {
    /// The low `width` bytes of `value`.
    Word {
        value: u64,
        width: AccessWidth,
    },
    Bytes(Vec<u8>),
    /// Written with its terminating NUL.
    String(String),
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct WriteRequest {
    pub address: u64,
    pub data: WriteData,
    pub flags: MemoryAccessFlags,
    pub access: Option<AccessWidth>,
}

impl<K, I> Session<'_, K, I>
where
    K: KernelCall + ?Sized,
    I: KernelIo + ?Sized,
{
    /// Run a read request, writing its formatted output to `out`.
    ///
    /// Returns the number of bytes read (string bytes for [`ReadFormat::String`]).
    ///
    /// # Errors
    /// See the individual read commands.
    pub fn read<W>(&self, out: &mut W, request: &ReadRequest) -> Result<u64, MemctlError>
    where
        W: Write + ?Sized,
    {
        let ReadRequest {
            address,
            flags,
            width,
            access,
            format,
            ..
        } = *request;
        let length = request.effective_length();
        match format {
            ReadFormat::Words => {
                self.read_words(out, address, length.unwrap_or(0), flags, width, access)
            }
            ReadFormat::Dump => {
                self.dump(out, address, length.unwrap_or(0), flags, width, access)
            }
            ReadFormat::Binary => {
                self.dump_binary(out, address, length.unwrap_or(0), flags, access)
            }
            ReadFormat::String => self.read_string(out, address, length, flags, access),
        }
    }

    /// Run a write request. Returns the number of bytes written.
    ///
    /// # Errors
    /// See the individual write commands.
    pub fn write(&self, request: &WriteRequest) -> Result<u64, MemctlError> {
        let WriteRequest {
            address,
            flags,
            access,
            ..
        } = *request;
        match &request.data {
            WriteData::Word { value, width } => {
                self.write_word(address, *value, *width, flags, access)
            }
            WriteData::Bytes(bytes) => self.write_data(address, bytes, flags, access),
            WriteData::String(string) => self.write_string(address, string, flags, access),
        }
    }
}
