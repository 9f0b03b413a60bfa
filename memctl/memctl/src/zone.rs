//! # Zone Metadata Walker
//!
//! Attributes an address inside the zone map to the zone it was allocated
//! from. The zone allocator keeps one metadata record per zone-map page; the
//! record names the zone by index into the global zone array.
//!
//! Every read goes through the safety gate. The offsets come from
//! [`ZoneLayout`](memctl_info::ZoneLayout) and are specific to one kernel release.

use crate::kernel_call::KernelCall;
use crate::kernel_io::KernelIo;
use crate::session::Session;
use crate::{MemctlError, MemoryAccessFlags};
use memctl_addresses::{KernelAddress, VirtualAddress};
use std::io::Write;

/// The zone owning an address.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct ZoneMetadataEntry {
    pub zone_index: u16,
    /// Address of the zone descriptor.
    pub zone: VirtualAddress,
    /// Address of the per-page metadata record that named the zone.
    pub page_metadata: VirtualAddress,
    pub name: String,
    pub element_size: u64,
}

impl<K, I> Session<'_, K, I>
where
    K: KernelCall + ?Sized,
    I: KernelIo + ?Sized,
{
    /// Find the zone that `address` was allocated from.
    ///
    /// Addresses outside `[zone_map_min, zone_map_max)` return `Ok(None)`
    /// without reading memory.
    ///
    /// # Errors
    /// Safety gate rejections of the metadata, descriptor or name addresses,
    /// and failed reads.
    pub fn describe_allocation(
        &self,
        address: VirtualAddress,
    ) -> Result<Option<ZoneMetadataEntry>, MemctlError> {
        let layout = self.config().zones;
        if !layout.contains(address) {
            log::debug!("{address:?} is outside the zone map");
            return Ok(None);
        }

        let page_size = self.config().page_size;
        let page = address.align_down(page_size).as_memory_address();
        let Some(offset) = page.checked_offset_from(layout.zone_map_min.as_memory_address()) else {
            return Ok(None);
        };
        let page_index = offset / page_size;

        let page_metadata = offset_by(
            layout.metadata_min,
            page_index,
            layout.page_metadata_stride,
        )?;
        let zone_index =
            self.read_kernel_u16(offset_by(page_metadata, 1, layout.zone_index_offset)?)?;
        let zone = offset_by(
            layout.zone_array_base,
            u64::from(zone_index),
            layout.zone_stride,
        )?;
        let element_size =
            self.read_kernel_u64(offset_by(zone, 1, layout.element_size_offset)?)?;
        let name_pointer =
            self.read_kernel_u64(offset_by(zone, 1, layout.name_pointer_offset)?)?;
        let name = self.read_kernel_c_string(VirtualAddress::new(name_pointer))?;

        log::debug!("{address:?}: zone {zone_index} ({name}) at {zone:?}");
        Ok(Some(ZoneMetadataEntry {
            zone_index,
            zone,
            page_metadata,
            name,
            element_size,
        }))
    }

    /// Print the zone report for `address`.
    ///
    /// # Errors
    /// As [`describe_allocation`](Self::describe_allocation), plus output failures.
    pub fn zone_command<W>(
        &self,
        out: &mut W,
        address: VirtualAddress,
    ) -> Result<Option<ZoneMetadataEntry>, MemctlError>
    where
        W: Write + ?Sized,
    {
        let entry = self.describe_allocation(address)?;
        match &entry {
            Some(entry) => {
                writeln!(out, "Zone => 0x{:x}", entry.zone)?;
                writeln!(out, "ZoneName => {}", entry.name)?;
                writeln!(out, "Zone_metaData => 0x{:x}", entry.page_metadata)?;
                writeln!(out, "ElementSize => 0x{:x}", entry.element_size)?;
            }
            None => writeln!(out, "Not found address from zone")?,
        }
        Ok(entry)
    }

    /// Gated read of exactly `buf.len()` bytes of kernel memory.
    fn read_kernel_exact(
        &self,
        address: VirtualAddress,
        buf: &mut [u8],
    ) -> Result<(), MemctlError> {
        let address = KernelAddress::Virtual(address);
        self.check(address, buf.len() as u64, MemoryAccessFlags::empty())?;
        let outcome = self.io().read(address, buf, None)?;
        if outcome.transferred < buf.len() {
            return Err(MemctlError::PartialTransfer {
                address: address.as_u64(),
                remaining: (buf.len() - outcome.transferred) as u64,
            });
        }
        Ok(())
    }

    fn read_kernel_u16(&self, address: VirtualAddress) -> Result<u16, MemctlError> {
        let mut buf = [0u8; 2];
        self.read_kernel_exact(address, &mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    fn read_kernel_u64(&self, address: VirtualAddress) -> Result<u64, MemctlError> {
        let mut buf = [0u8; 8];
        self.read_kernel_exact(address, &mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    /// Read a C string one byte at a time, up to the configured name length.
    fn read_kernel_c_string(&self, address: VirtualAddress) -> Result<String, MemctlError> {
        let limit = self.config().max_zone_name_len;
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(limit)
            .map_err(|_| MemctlError::AllocationFailure { size: limit })?;

        let mut cursor = address;
        while bytes.len() < limit {
            let mut byte = [0u8; 1];
            self.read_kernel_exact(cursor, &mut byte)?;
            if byte[0] == 0 {
                break;
            }
            bytes.push(byte[0]);
            cursor = cursor.checked_add(1).ok_or(MemctlError::Overflow {
                address: cursor.as_u64(),
                length: 1,
            })?;
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// `base + index * stride`, rejecting overflow.
fn offset_by(
    base: VirtualAddress,
    index: u64,
    stride: u64,
) -> Result<VirtualAddress, MemctlError> {
    index
        .checked_mul(stride)
        .and_then(|offset| base.checked_add(offset))
        .ok_or(MemctlError::Overflow {
            address: base.as_u64(),
            length: index.saturating_mul(stride),
        })
}
