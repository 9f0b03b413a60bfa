#![allow(dead_code)]

use log::LevelFilter;
use memctl::{
    AccessWidth, BypassAvailability, CancellationToken, KernelAddress, KernelCall,
    KernelCallError, KernelFunctions, KernelIo, KernelIoError, ProtectionChanger, ReadOutcome,
    Session, SessionConfig, VirtualAddress, VmProtection, ZoneLayout,
};
use memctl_log::ConsoleLogger;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};

pub const PHYS_READ: VirtualAddress = VirtualAddress::new(0xFFFF_FFF0_0710_0000);
pub const PHYS_WRITE: VirtualAddress = VirtualAddress::new(0xFFFF_FFF0_0710_1000);
pub const KVTOPHYS: VirtualAddress = VirtualAddress::new(0xFFFF_FFF0_0710_2000);
pub const PMAP_FIND_PHYS: VirtualAddress = VirtualAddress::new(0xFFFF_FFF0_0710_3000);
pub const KERNEL_PMAP: VirtualAddress = VirtualAddress::new(0xFFFF_FFF0_0920_0000);

pub const TABLE_ROOT: u64 = 0x8_0000_0000;
pub const PAGE: u64 = 0x4000;
pub const PXN: u64 = 1 << 53;

pub const ZONE_MAP_MIN: u64 = 0xFFFF_FFE0_0000_0000;
pub const ZONE_MAP_MAX: u64 = 0xFFFF_FFE1_0000_0000;
pub const ZONE_METADATA_MIN: u64 = 0xFFFF_FFE2_0000_0000;
pub const ZONE_ARRAY: u64 = 0xFFFF_FFF0_0900_0000;

pub fn init_logging() {
    let _ = ConsoleLogger::new(LevelFilter::Trace).init();
}

/// Physical memory behind `ml_phys_{read,write}_data`, plus `kvtophys`.
#[derive(Default)]
pub struct FakeKernel {
    words: RefCell<HashMap<u64, u32>>,
    next_table: Cell<u64>,
    pub calls: Cell<usize>,
    /// Offset from the DRAM base per mapped page, for `kvtophys` and
    /// `pmap_find_phys`. Missing pages return 0.
    pub kvtophys: RefCell<HashMap<u64, u64>>,
}

impl FakeKernel {
    pub fn read64(&self, pa: u64) -> u64 {
        let words = self.words.borrow();
        let lo = u64::from(words.get(&pa).copied().unwrap_or(0));
        let hi = u64::from(words.get(&(pa + 4)).copied().unwrap_or(0));
        (hi << 32) | lo
    }

    pub fn write64(&self, pa: u64, value: u64) {
        let mut words = self.words.borrow_mut();
        words.insert(pa, (value & 0xFFFF_FFFF) as u32);
        words.insert(pa + 4, (value >> 32) as u32);
    }

    fn table_at(&self, entry: u64) -> u64 {
        let existing = self.read64(entry);
        if existing & 0b11 == 0b11 {
            return existing & 0x0000_00FF_FFFF_C000;
        }
        let next = self.next_table.get().max(TABLE_ROOT + PAGE);
        self.next_table.set(next + PAGE);
        self.write64(entry, next | 0b11);
        next
    }

    /// Map the 16 KiB page containing `va` to `pa` with `PXN` set.
    /// Returns the physical location of the L3 entry.
    pub fn map(&self, va: u64, pa: u64) -> u64 {
        let l2 = self.table_at(TABLE_ROOT + 8 * ((va >> 36) & 0x7));
        let l3 = self.table_at(l2 + 8 * ((va >> 25) & 0x7FF));
        let entry = l3 + 8 * ((va >> 14) & 0x7FF);
        self.write64(entry, (pa & !(PAGE - 1)) | PXN | (1 << 10) | 0b11);
        entry
    }

    pub fn functions() -> KernelFunctions {
        KernelFunctions::new(PHYS_READ, PHYS_WRITE)
    }
}

impl KernelCall for FakeKernel {
    fn invoke(&self, function: VirtualAddress, args: &[u64]) -> Result<u64, KernelCallError> {
        self.calls.set(self.calls.get() + 1);
        match (function, args) {
            (PHYS_READ, &[pa, 4]) => Ok(u64::from(
                self.words.borrow().get(&pa).copied().unwrap_or(0),
            )),
            (PHYS_WRITE, &[pa, value, 4]) => {
                self.words.borrow_mut().insert(pa, (value & 0xFFFF_FFFF) as u32);
                Ok(0)
            }
            (KVTOPHYS, &[va]) => Ok(self
                .kvtophys
                .borrow()
                .get(&(va & !(PAGE - 1)))
                .map_or(0, |offset| offset + (va & (PAGE - 1)))),
            (PMAP_FIND_PHYS, &[pmap, va]) if pmap == KERNEL_PMAP.as_u64() => Ok(self
                .kvtophys
                .borrow()
                .get(&(va & !(PAGE - 1)))
                .map_or(0, |offset| (TABLE_ROOT + offset) >> 14)),
            _ => Err(KernelCallError::Failed {
                function,
                reason: format!("unexpected call with {args:?}"),
            }),
        }
    }
}

/// Byte-addressed kernel and physical memory behind the I/O primitive.
#[derive(Default)]
pub struct FakeIo {
    virt: RefCell<BTreeMap<u64, u8>>,
    phys: RefCell<BTreeMap<u64, u8>>,
    pub reads: RefCell<Vec<(KernelAddress, usize)>>,
    pub writes: RefCell<Vec<(KernelAddress, Vec<u8>)>>,
    /// Cancel this token once this many reads have completed.
    pub cancel_after: RefCell<Option<(usize, CancellationToken)>>,
    /// Cancel this token once this many writes have completed.
    pub cancel_after_writes: RefCell<Option<(usize, CancellationToken)>>,
    /// Most bytes a single write call accepts.
    pub write_limit: Cell<Option<usize>>,
}

impl FakeIo {
    fn space(&self, address: KernelAddress) -> &RefCell<BTreeMap<u64, u8>> {
        if address.is_physical() { &self.phys } else { &self.virt }
    }

    pub fn fill(&self, address: KernelAddress, bytes: &[u8]) {
        let mut mem = self.space(address).borrow_mut();
        for (i, b) in bytes.iter().enumerate() {
            mem.insert(address.as_u64() + i as u64, *b);
        }
    }

    pub fn fill_u64(&self, address: KernelAddress, value: u64) {
        self.fill(address, &value.to_le_bytes());
    }

    pub fn bytes(&self, address: KernelAddress, len: usize) -> Vec<u8> {
        let mem = self.space(address).borrow();
        (0..len as u64)
            .map(|i| mem.get(&(address.as_u64() + i)).copied().unwrap_or(0))
            .collect()
    }
}

impl KernelIo for FakeIo {
    fn read(
        &self,
        address: KernelAddress,
        buf: &mut [u8],
        _access: Option<AccessWidth>,
    ) -> Result<ReadOutcome, KernelIoError> {
        self.reads.borrow_mut().push((address, buf.len()));
        let mem = self.space(address).borrow();

        let mut transferred = 0;
        for slot in buf.iter_mut() {
            let Some(at) = address.as_u64().checked_add(transferred as u64) else {
                break;
            };
            let Some(b) = mem.get(&at) else {
                break;
            };
            *slot = *b;
            transferred += 1;
        }
        let stop = address.as_u64().saturating_add(transferred as u64);
        let next = mem.range(stop..).next().map(|(a, _)| *a);

        if let Some((after, token)) = self.cancel_after.borrow().as_ref()
            && self.reads.borrow().len() >= *after
        {
            token.cancel();
        }
        Ok(ReadOutcome { transferred, next })
    }

    fn write(
        &self,
        address: KernelAddress,
        data: &[u8],
        _access: Option<AccessWidth>,
    ) -> Result<usize, KernelIoError> {
        self.writes.borrow_mut().push((address, data.to_vec()));
        let accepted = self.write_limit.get().map_or(data.len(), |l| l.min(data.len()));
        self.fill(address, &data[..accepted]);

        if let Some((after, token)) = self.cancel_after_writes.borrow().as_ref()
            && self.writes.borrow().len() >= *after
        {
            token.cancel();
        }
        Ok(accepted)
    }
}

/// Records protection changes.
#[derive(Default)]
pub struct FakeVmProtect {
    pub calls: RefCell<Vec<(VirtualAddress, u64, VmProtection)>>,
}

impl ProtectionChanger for FakeVmProtect {
    fn grant_protection(
        &self,
        address: VirtualAddress,
        size: u64,
        protection: VmProtection,
    ) -> Result<(), KernelCallError> {
        self.calls.borrow_mut().push((address, size, protection));
        Ok(())
    }
}

pub fn zone_layout() -> ZoneLayout {
    ZoneLayout::ios13(
        VirtualAddress::new(ZONE_MAP_MIN),
        VirtualAddress::new(ZONE_MAP_MAX),
        VirtualAddress::new(ZONE_METADATA_MIN),
        VirtualAddress::new(ZONE_ARRAY),
    )
}

pub fn config() -> SessionConfig {
    SessionConfig::new(TABLE_ROOT.into(), FakeKernel::functions(), zone_layout())
}

pub fn session<'k>(
    config: SessionConfig,
    kernel: &'k FakeKernel,
    io: &'k FakeIo,
    bypass: BypassAvailability,
) -> Session<'k, FakeKernel, FakeIo> {
    init_logging();
    let cancel = CancellationToken::new();
    Session::new(config, kernel, io, &move || bypass, cancel)
}
