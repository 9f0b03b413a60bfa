//! # Formatted reads
//!
//! Word listing, hex+ASCII dump, raw binary dump and C string read. Every
//! command runs the safety gate first, then reads page-bounded chunks and
//! formats them into the caller's output stream as they arrive.

use crate::chunks::ChunkReader;
use crate::kernel_call::KernelCall;
use crate::kernel_io::KernelIo;
use crate::session::Session;
use crate::{AccessWidth, MemctlError, MemoryAccessFlags};
use memctl_addresses::KernelAddress;
use std::io::Write;

/// Bytes per dump line.
const DUMP_LINE: usize = 16;

/// One line of a hex+ASCII dump, aligned to 16 bytes.
///
/// Slots before the first byte and after the last byte are printed as blanks
/// so that the columns line up regardless of the start address.
struct DumpLine {
    base: u64,
    first: usize,
    len: usize,
    bytes: [u8; DUMP_LINE],
    width: usize,
}

impl DumpLine {
    fn starting_at(address: u64, width: AccessWidth) -> Self {
        Self {
            base: address & !(DUMP_LINE as u64 - 1),
            first: usize::from(address.to_le_bytes()[0] & 0x0F),
            len: 0,
            bytes: [0; DUMP_LINE],
            width: width.bytes(),
        }
    }

    const fn is_empty(&self) -> bool {
        self.len == 0
    }

    const fn is_full(&self) -> bool {
        self.first + self.len == DUMP_LINE
    }

    const fn push(&mut self, byte: u8) {
        self.bytes[self.first + self.len] = byte;
        self.len += 1;
    }

    /// The following line. The label may wrap; it is never read from.
    const fn next(&self) -> Self {
        Self {
            base: self.base.wrapping_add(DUMP_LINE as u64),
            first: 0,
            len: 0,
            bytes: [0; DUMP_LINE],
            width: self.width,
        }
    }

    fn write<W>(&self, out: &mut W) -> std::io::Result<()>
    where
        W: Write + ?Sized,
    {
        let mut hex = String::with_capacity(3 * DUMP_LINE + DUMP_LINE);
        let mut ascii = String::with_capacity(DUMP_LINE);
        for i in 0..DUMP_LINE {
            if (self.first..self.first + self.len).contains(&i) {
                let b = self.bytes[i];
                hex.push_str(&format!("{b:02x}"));
                ascii.push(if b.is_ascii_graphic() || b == b' ' {
                    char::from(b)
                } else {
                    '.'
                });
            } else {
                hex.push_str("  ");
                ascii.push(' ');
            }
            if i & (self.width - 1) == self.width - 1 {
                hex.push(' ');
            }
        }
        writeln!(out, "0x{:016x}:  {hex} |{ascii}|", self.base)
    }
}

/// Accumulates little-endian words and prints `16 / width` of them per line.
struct WordPrinter {
    width: usize,
    per_line: usize,
    printed: usize,
    word: [u8; 8],
    fill: usize,
    /// Address of the word being accumulated.
    address: u64,
}

impl WordPrinter {
    fn new(address: u64, width: AccessWidth) -> Self {
        let width = width.bytes();
        Self {
            width,
            per_line: (16 / width).min(8),
            printed: 0,
            word: [0; 8],
            fill: 0,
            address,
        }
    }

    /// Add one byte; prints the word once `width` bytes are collected.
    fn push<W>(&mut self, out: &mut W, byte: u8, last: bool) -> std::io::Result<()>
    where
        W: Write + ?Sized,
    {
        self.word[self.fill] = byte;
        self.fill += 1;
        if self.fill == self.width || last {
            self.emit(out, last)?;
        }
        Ok(())
    }

    fn emit<W>(&mut self, out: &mut W, last: bool) -> std::io::Result<()>
    where
        W: Write + ?Sized,
    {
        let w = self.fill;
        if self.printed % self.per_line == 0 {
            write!(out, "0x{:016x}:  ", self.address)?;
        }

        let mut le = [0u8; 8];
        le[..w].copy_from_slice(&self.word[..w]);
        let value = u64::from_le_bytes(le);
        let pad = 2 * (self.width - w);
        let end = if (self.printed + 1) % self.per_line == 0 || last {
            '\n'
        } else {
            ' '
        };
        write!(out, "{:pad$}{value:0digits$x}{end}", "", digits = 2 * w)?;

        self.printed += 1;
        self.address = self.address.wrapping_add(w as u64);
        self.fill = 0;
        Ok(())
    }
}

impl<K, I> Session<'_, K, I>
where
    K: KernelCall + ?Sized,
    I: KernelIo + ?Sized,
{
    /// Print `length` bytes at `address` as `width`-byte little-endian words.
    ///
    /// A trailing partial word is printed with only the bytes that exist,
    /// padded on the left so the columns stay aligned.
    ///
    /// # Errors
    /// Safety gate rejections, [`MemctlError::PartialTransfer`],
    /// [`MemctlError::Interrupted`] and output failures.
    pub fn read_words<W>(
        &self,
        out: &mut W,
        address: u64,
        length: u64,
        flags: MemoryAccessFlags,
        width: AccessWidth,
        access: Option<AccessWidth>,
    ) -> Result<u64, MemctlError>
    where
        W: Write + ?Sized,
    {
        let address = KernelAddress::new(address, flags.is_physical());
        self.check(address, length, flags)?;

        let mut printer = WordPrinter::new(address.as_u64(), width);
        let mut reader = ChunkReader::new(self, address, length, access)?;
        let mut consumed = 0u64;
        while let Some(chunk) = reader.next_chunk()? {
            for &b in chunk {
                consumed += 1;
                printer.push(out, b, consumed == length)?;
            }
        }
        Ok(consumed)
    }

    /// Hex+ASCII dump, 16 bytes per line, hex grouped by `width`.
    ///
    /// # Errors
    /// Safety gate rejections, [`MemctlError::PartialTransfer`],
    /// [`MemctlError::Interrupted`] and output failures.
    pub fn dump<W>(
        &self,
        out: &mut W,
        address: u64,
        length: u64,
        flags: MemoryAccessFlags,
        width: AccessWidth,
        access: Option<AccessWidth>,
    ) -> Result<u64, MemctlError>
    where
        W: Write + ?Sized,
    {
        let address = KernelAddress::new(address, flags.is_physical());
        self.check(address, length, flags)?;

        let mut line = DumpLine::starting_at(address.as_u64(), width);
        let mut reader = ChunkReader::new(self, address, length, access)?;
        let mut consumed = 0u64;
        while let Some(chunk) = reader.next_chunk()? {
            for &b in chunk {
                line.push(b);
                if line.is_full() {
                    line.write(out)?;
                    line = line.next();
                }
            }
            consumed += chunk.len() as u64;
        }
        if !line.is_empty() {
            line.write(out)?;
        }
        Ok(consumed)
    }

    /// Copy `length` bytes verbatim to `out`, one chunk at a time.
    ///
    /// # Errors
    /// Safety gate rejections, [`MemctlError::PartialTransfer`],
    /// [`MemctlError::Interrupted`] and output failures.
    pub fn dump_binary<W>(
        &self,
        out: &mut W,
        address: u64,
        length: u64,
        flags: MemoryAccessFlags,
        access: Option<AccessWidth>,
    ) -> Result<u64, MemctlError>
    where
        W: Write + ?Sized,
    {
        let address = KernelAddress::new(address, flags.is_physical());
        self.check(address, length, flags)?;

        let mut reader = ChunkReader::new(self, address, length, access)?;
        let mut consumed = 0u64;
        while let Some(chunk) = reader.next_chunk()? {
            out.write_all(chunk)?;
            consumed += chunk.len() as u64;
        }
        Ok(consumed)
    }

    /// Print the NUL-terminated string at `address`.
    ///
    /// Reading stops at the first NUL, after `max_len` bytes, or when the
    /// primitive has no more data for an address after at least one byte was
    /// read. A line break follows only if something was printed. Without
    /// `max_len`, the safety gate covers one page.
    ///
    /// Returns the number of string bytes printed.
    ///
    /// # Errors
    /// Safety gate rejections, [`MemctlError::PartialTransfer`] if not even
    /// the first byte could be read, [`MemctlError::Interrupted`] and output
    /// failures.
    pub fn read_string<W>(
        &self,
        out: &mut W,
        address: u64,
        max_len: Option<u64>,
        flags: MemoryAccessFlags,
        access: Option<AccessWidth>,
    ) -> Result<u64, MemctlError>
    where
        W: Write + ?Sized,
    {
        let address = KernelAddress::new(address, flags.is_physical());
        let checked = max_len.unwrap_or(self.config().page_size);
        self.check(address, checked, flags)?;

        let mut reader = ChunkReader::new(self, address, max_len.unwrap_or(u64::MAX), access)?;
        let mut printed = 0u64;
        loop {
            let chunk = match reader.next_chunk() {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(MemctlError::PartialTransfer { .. }) if printed > 0 => break,
                Err(e) => return Err(e),
            };
            let (text, terminated) = match chunk.iter().position(|&b| b == 0) {
                Some(nul) => (&chunk[..nul], true),
                None => (chunk, false),
            };
            out.write_all(text)?;
            printed += text.len() as u64;
            if terminated {
                break;
            }
        }

        if printed > 0 {
            out.write_all(b"\n")?;
        }
        Ok(printed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_line(line: &DumpLine) -> String {
        let mut out = Vec::new();
        line.write(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn full_line_width_one() {
        let mut line = DumpLine::starting_at(0x2000, AccessWidth::BYTE);
        for b in b"Hello, World!\x00\x01\x7f" {
            line.push(*b);
        }
        assert!(line.is_full());
        assert_eq!(
            render_line(&line),
            concat!(
                "0x0000000000002000:  ",
                "48 65 6c 6c 6f 2c 20 57 6f 72 6c 64 21 00 01 7f  |Hello, World!...|\n",
            )
        );
    }

    #[test]
    fn partial_line_groups_by_width() {
        let mut line = DumpLine::starting_at(0x2004, AccessWidth::WORD);
        for b in [0xAA; 4] {
            line.push(b);
        }
        assert!(!line.is_full());
        assert_eq!(
            render_line(&line),
            format!(
                "0x0000000000002000:  {} aaaaaaaa {} {}  |    {}        |\n",
                " ".repeat(8),
                " ".repeat(8),
                " ".repeat(8),
                ".".repeat(4)
            )
        );
    }

    #[test]
    fn words_per_line_and_padding() {
        let mut out = Vec::new();
        let mut printer = WordPrinter::new(0x1000, AccessWidth::WORD);
        let bytes = [1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0, 4, 0, 0, 0, 5, 6];
        for (i, b) in bytes.iter().enumerate() {
            printer.push(&mut out, *b, i + 1 == bytes.len()).unwrap();
        }
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "0x0000000000001000:  00000001 00000002 00000003 00000004\n\
             0x0000000000001010:      0605\n"
        );
    }
}
