mod common;

use common::{FakeIo, FakeKernel, PAGE, config, session};
use memctl::{
    AccessWidth, BypassAvailability, KernelAddress, MemctlError, MemoryAccessFlags, ReadFormat,
    ReadRequest, WriteData, WriteRequest,
};

const PHYSICAL: MemoryAccessFlags = MemoryAccessFlags::PHYSICAL;

fn phys(address: u64) -> KernelAddress {
    KernelAddress::new(address, true)
}

fn render(out: Vec<u8>) -> String {
    String::from_utf8(out).unwrap()
}

#[test]
fn wrapping_range_is_rejected_before_any_io() {
    let kernel = FakeKernel::default();
    let io = FakeIo::default();
    let session = session(config(), &kernel, &io, BypassAvailability::Available);

    let mut out = Vec::new();
    let flags = MemoryAccessFlags::empty();
    let err = session
        .dump(&mut out, u64::MAX, 2, flags, AccessWidth::BYTE, None)
        .unwrap_err();

    assert!(matches!(err, MemctlError::Overflow { address: u64::MAX, length: 2 }));
    assert!(io.reads.borrow().is_empty());
    assert_eq!(kernel.calls.get(), 0);
    assert!(out.is_empty());
}

#[test]
fn forced_access_skips_the_gate() {
    let kernel = FakeKernel::default();
    let io = FakeIo::default();
    let session = session(config(), &kernel, &io, BypassAvailability::Available);

    let mut out = Vec::new();
    let flags = MemoryAccessFlags::FORCE;
    let err = session
        .dump(&mut out, u64::MAX, 2, flags, AccessWidth::BYTE, None)
        .unwrap_err();

    // the primitive was asked, and had nothing
    assert!(matches!(err, MemctlError::PartialTransfer { .. }));
    assert_eq!(io.reads.borrow().len(), 1);
    assert_eq!(kernel.calls.get(), 0);
}

#[test]
fn user_addresses_are_not_kernel_addresses() {
    let kernel = FakeKernel::default();
    let io = FakeIo::default();
    let session = session(config(), &kernel, &io, BypassAvailability::Available);

    let user = MemoryAccessFlags::empty();
    let err = session
        .read_words(&mut Vec::new(), 0x1_0000_4000, 8, user, AccessWidth::DOUBLE, None)
        .unwrap_err();
    assert!(matches!(err, MemctlError::BadAddressSpace { physical: false, .. }));

    let kernel_va = 0xFFFF_FFF0_0700_4000;
    let err = session
        .read_words(&mut Vec::new(), kernel_va, 8, PHYSICAL, AccessWidth::DOUBLE, None)
        .unwrap_err();
    assert!(matches!(err, MemctlError::BadAddressSpace { physical: true, .. }));
    assert!(io.reads.borrow().is_empty());
}

#[test]
fn dump_starts_mid_line() {
    let kernel = FakeKernel::default();
    let io = FakeIo::default();
    io.fill(phys(0x1007), b"ABCDEFGHIJKLMNOP");
    let session = session(config(), &kernel, &io, BypassAvailability::Available);

    let mut out = Vec::new();
    let n = session
        .dump(&mut out, 0x1007, 16, PHYSICAL, AccessWidth::BYTE, None)
        .unwrap();
    assert_eq!(n, 16);

    let expected = format!(
        "0x0000000000001000:  {}41 42 43 44 45 46 47 48 49  |{}ABCDEFGHI|\n\
         0x0000000000001010:  4a 4b 4c 4d 4e 4f 50 {} |JKLMNOP{}|\n",
        "   ".repeat(7),
        " ".repeat(7),
        "   ".repeat(9),
        " ".repeat(9),
    );
    assert_eq!(render(out), expected);
}

#[test]
fn dump_groups_hex_by_width() {
    let kernel = FakeKernel::default();
    let io = FakeIo::default();
    io.fill(phys(0x2000), &(0u8..16).collect::<Vec<_>>());
    let session = session(config(), &kernel, &io, BypassAvailability::Available);

    let mut out = Vec::new();
    session
        .dump(&mut out, 0x2000, 16, PHYSICAL, AccessWidth::WORD, None)
        .unwrap();
    assert_eq!(
        render(out),
        "0x0000000000002000:  00010203 04050607 08090a0b 0c0d0e0f  |................|\n"
    );
}

#[test]
fn words_pad_a_trailing_partial_word() {
    let kernel = FakeKernel::default();
    let io = FakeIo::default();
    io.fill(phys(0x3000), &[0x11, 0x22, 0x33, 0x44, 0x55, 0x66]);
    let session = session(config(), &kernel, &io, BypassAvailability::Available);

    let mut out = Vec::new();
    let n = session
        .read_words(&mut out, 0x3000, 6, PHYSICAL, AccessWidth::WORD, None)
        .unwrap();
    assert_eq!(n, 6);
    assert_eq!(render(out), "0x0000000000003000:  44332211     6655\n");
}

#[test]
fn string_stops_at_nul() {
    let kernel = FakeKernel::default();
    let io = FakeIo::default();
    io.fill(phys(0x4000), b"hello\0world");
    let session = session(config(), &kernel, &io, BypassAvailability::Available);

    let mut out = Vec::new();
    let n = session
        .read_string(&mut out, 0x4000, None, PHYSICAL, None)
        .unwrap();
    assert_eq!(n, 5);
    assert_eq!(render(out), "hello\n");
}

#[test]
fn string_stops_at_max_len_and_at_unreadable_memory() {
    let kernel = FakeKernel::default();
    let io = FakeIo::default();
    io.fill(phys(0x5000), b"abcdefgh");
    let session = session(config(), &kernel, &io, BypassAvailability::Available);

    let mut out = Vec::new();
    assert_eq!(
        session.read_string(&mut out, 0x5000, Some(3), PHYSICAL, None).unwrap(),
        3
    );
    assert_eq!(render(out), "abc\n");

    // no terminator before the end of the readable memory
    let mut out = Vec::new();
    assert_eq!(
        session.read_string(&mut out, 0x5000, None, PHYSICAL, None).unwrap(),
        8
    );
    assert_eq!(render(out), "abcdefgh\n");

    // nothing readable at all
    let mut out = Vec::new();
    let err = session
        .read_string(&mut out, 0x6000, None, PHYSICAL, None)
        .unwrap_err();
    assert!(matches!(err, MemctlError::PartialTransfer { address: 0x6000, .. }));
    assert!(out.is_empty());
}

#[test]
fn empty_string_prints_nothing() {
    let kernel = FakeKernel::default();
    let io = FakeIo::default();
    io.fill(phys(0x7000), b"\0");
    let session = session(config(), &kernel, &io, BypassAvailability::Available);

    let mut out = Vec::new();
    assert_eq!(
        session.read_string(&mut out, 0x7000, None, PHYSICAL, None).unwrap(),
        0
    );
    assert!(out.is_empty());
}

#[test]
fn cancellation_stops_a_multi_page_dump() {
    let kernel = FakeKernel::default();
    let io = FakeIo::default();
    io.fill(phys(0x1_0000), &vec![b'A'; 3 * PAGE as usize]);
    let session = session(config(), &kernel, &io, BypassAvailability::Available);
    *io.cancel_after.borrow_mut() = Some((1, session.cancellation().clone()));

    let mut out = Vec::new();
    let len = 3 * PAGE;
    let err = session
        .dump(&mut out, 0x1_0000, len, PHYSICAL, AccessWidth::BYTE, None)
        .unwrap_err();

    assert!(matches!(err, MemctlError::Interrupted));
    assert_eq!(io.reads.borrow().len(), 1);
    let out = render(out);
    assert_eq!(out.lines().count(), PAGE as usize / 16);
    assert!(out.starts_with("0x0000000000010000:  41 41"));

    // the next operation is not affected once the flag is reset
    assert!(session.cancellation().reset());
    *io.cancel_after.borrow_mut() = None;
    let mut out = Vec::new();
    assert_eq!(
        session
            .dump_binary(&mut out, 0x1_0000, 4, PHYSICAL, None)
            .unwrap(),
        4
    );
    assert_eq!(out, b"AAAA");
}

#[test]
fn reads_are_split_at_page_boundaries() {
    let kernel = FakeKernel::default();
    let io = FakeIo::default();
    io.fill(phys(PAGE - 4), &[1, 2, 3, 4, 5, 6, 7, 8]);
    let session = session(config(), &kernel, &io, BypassAvailability::Available);

    let mut out = Vec::new();
    session
        .dump_binary(&mut out, PAGE - 4, 8, PHYSICAL, None)
        .unwrap();
    assert_eq!(out, [1, 2, 3, 4, 5, 6, 7, 8]);
    assert_eq!(
        *io.reads.borrow(),
        vec![(phys(PAGE - 4), 4), (phys(PAGE), 4)]
    );
}

#[test]
fn writes_words_and_strings() {
    let kernel = FakeKernel::default();
    let io = FakeIo::default();
    let session = session(config(), &kernel, &io, BypassAvailability::Available);

    let value = 0x1122_3344_5566_7788;
    session
        .write_word(0x8000, value, AccessWidth::HALF, PHYSICAL, None)
        .unwrap();
    assert_eq!(io.bytes(phys(0x8000), 3), [0x88, 0x77, 0]);

    let n = session
        .write_string(0x9000, "abc\0ignored", PHYSICAL, None)
        .unwrap();
    assert_eq!(n, 4);
    assert_eq!(io.bytes(phys(0x9000), 5), *b"abc\0\0");

    // crossing a page boundary takes two writes
    session
        .write_data(2 * PAGE - 2, &[9, 9, 9, 9], PHYSICAL, None)
        .unwrap();
    let writes = io.writes.borrow();
    assert_eq!(writes.len(), 4);
    assert_eq!(writes[2], (phys(2 * PAGE - 2), vec![9, 9]));
    assert_eq!(writes[3], (phys(2 * PAGE), vec![9, 9]));
}

#[test]
fn write_that_moves_nothing_is_a_partial_transfer() {
    let kernel = FakeKernel::default();
    let io = FakeIo::default();
    io.write_limit.set(Some(0));
    let session = session(config(), &kernel, &io, BypassAvailability::Available);

    let err = session
        .write_data(0x8000, &[1, 2, 3, 4], PHYSICAL, None)
        .unwrap_err();
    assert!(matches!(
        err,
        MemctlError::PartialTransfer {
            address: 0x8000,
            remaining: 4
        }
    ));
    assert_eq!(io.writes.borrow().len(), 1);
}

#[test]
fn short_writes_continue_where_they_stopped() {
    let kernel = FakeKernel::default();
    let io = FakeIo::default();
    io.write_limit.set(Some(3));
    let session = session(config(), &kernel, &io, BypassAvailability::Available);

    let n = session
        .write_data(0x8000, &[1, 2, 3, 4, 5], PHYSICAL, None)
        .unwrap();
    assert_eq!(n, 5);
    assert_eq!(io.bytes(phys(0x8000), 5), [1, 2, 3, 4, 5]);
    let writes = io.writes.borrow();
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[1], (phys(0x8003), vec![4, 5]));
}

#[test]
fn cancellation_stops_a_multi_page_write() {
    let kernel = FakeKernel::default();
    let io = FakeIo::default();
    let session = session(config(), &kernel, &io, BypassAvailability::Available);
    *io.cancel_after_writes.borrow_mut() = Some((1, session.cancellation().clone()));

    let data = vec![0x5A; 2 * PAGE as usize];
    let err = session
        .write_data(PAGE, &data, PHYSICAL, None)
        .unwrap_err();

    assert!(matches!(err, MemctlError::Interrupted));
    assert_eq!(io.writes.borrow().len(), 1);
    assert_eq!(io.bytes(phys(2 * PAGE), 1), [0]);
}

#[test]
fn forced_write_skips_the_gate() {
    let kernel = FakeKernel::default();
    let io = FakeIo::default();
    let session = session(config(), &kernel, &io, BypassAvailability::Available);

    // a user-space address fails the kernel address shape
    let gated = MemoryAccessFlags::empty();
    let err = session
        .write_word(0x1000, 0xAA, AccessWidth::BYTE, gated, None)
        .unwrap_err();
    assert!(matches!(err, MemctlError::BadAddressSpace { .. }));
    assert!(io.writes.borrow().is_empty());

    let forced = MemoryAccessFlags::FORCE;
    session
        .write_word(0x1000, 0xAA, AccessWidth::BYTE, forced, None)
        .unwrap();
    assert_eq!(
        *io.writes.borrow(),
        vec![(KernelAddress::new(0x1000, false), vec![0xAA])]
    );
    assert_eq!(kernel.calls.get(), 0);
}

#[test]
fn request_dispatch_uses_format_defaults() {
    let kernel = FakeKernel::default();
    let io = FakeIo::default();
    io.fill(phys(0xA000), &[0xAB; 512]);
    let session = session(config(), &kernel, &io, BypassAvailability::Available);

    let mut request = ReadRequest::new(0xA000, ReadFormat::Dump);
    request.flags = PHYSICAL;
    let mut out = Vec::new();
    assert_eq!(session.read(&mut out, &request).unwrap(), 256);
    assert_eq!(render(out).lines().count(), 16);

    let write = WriteRequest {
        address: 0xA000,
        data: WriteData::Word {
            value: 0x0102,
            width: AccessWidth::HALF,
        },
        flags: PHYSICAL,
        access: None,
    };
    assert_eq!(session.write(&write).unwrap(), 2);
    assert_eq!(io.bytes(phys(0xA000), 2), [0x02, 0x01]);
}
