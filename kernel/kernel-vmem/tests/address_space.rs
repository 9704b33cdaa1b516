use kernel_addresses::{PAGE_SIZE, PhysicalAddress, VirtualAddress};
use kernel_coremap::Coremap;
use kernel_vmem::{AddressSpace, FaultKind, Permissions, SoftTlb, handle_fault};

fn coremap() -> Coremap {
    Coremap::new(
        PhysicalAddress::new(0x0010_0000),
        PhysicalAddress::new(0x0020_0000),
    )
}

const TEXT: u32 = 0x0040_0000;
const DATA: u32 = 0x1000_0000;

/// Builds a space with two regions and touches three pages so the page
/// table holds real frames.
fn populated(cm: &Coremap) -> AddressSpace {
    let mut space = AddressSpace::new();
    space
        .define_region(
            VirtualAddress::new(TEXT),
            2 * PAGE_SIZE,
            Permissions::read_execute(),
        )
        .unwrap();
    space
        .define_region(
            VirtualAddress::new(DATA),
            4 * PAGE_SIZE,
            Permissions::read_write(),
        )
        .unwrap();

    let mut tlb = SoftTlb::<16>::new();
    space.prepare_load();
    for addr in [TEXT, DATA, DATA + PAGE_SIZE] {
        handle_fault(
            Some(&mut space),
            cm,
            &mut tlb,
            FaultKind::Write,
            VirtualAddress::new(addr),
        )
        .unwrap();
    }
    space.complete_load();
    space
}

#[test]
fn clone_duplicates_structure_with_fresh_frames() {
    let cm = coremap();
    let source = populated(&cm);
    let used_before_clone = cm.used_bytes();

    let clone = source.try_clone(&cm).expect("clone");

    // same shape
    assert_eq!(clone.regions().count(), source.regions().count());
    assert_eq!(clone.mapping_count(), source.mapping_count());
    for (a, b) in source.regions().zip(clone.regions()) {
        assert_eq!(a, b);
    }

    // every mapped page got its own frame
    assert_eq!(
        cm.used_bytes(),
        used_before_clone + 3 * u64::from(PAGE_SIZE)
    );
    for entry in source.mappings() {
        let copied = clone.lookup(entry.vpage()).expect("same virtual range");
        assert_eq!(copied.perms(), entry.perms());
        assert_ne!(copied.pframe(), entry.pframe(), "frames must not be shared");
    }

    // mutating the clone leaves the source alone
    let mut clone = clone;
    let mut tlb = SoftTlb::<16>::new();
    handle_fault(
        Some(&mut clone),
        &cm,
        &mut tlb,
        FaultKind::Write,
        VirtualAddress::new(DATA + 2 * PAGE_SIZE),
    )
    .unwrap();
    assert_eq!(clone.mapping_count(), 4);
    assert_eq!(source.mapping_count(), 3);

    clone.release_frames(&cm);
    assert_eq!(cm.used_bytes(), used_before_clone);
}

#[test]
fn failed_clone_releases_the_partial_copy() {
    // Enough physical memory to populate the source but not to duplicate
    // all three of its frames.
    let cm = Coremap::new(
        PhysicalAddress::new(0x0010_0000),
        PhysicalAddress::new(0x0010_0000 + 6 * PAGE_SIZE),
    );
    let source = populated(&cm);

    // leave exactly one free frame
    let remaining = cm.total_pages() as u64 * u64::from(PAGE_SIZE) - cm.used_bytes();
    assert!(remaining < 3 * u64::from(PAGE_SIZE), "test setup: too roomy");

    let used_before = cm.used_bytes();
    assert!(source.try_clone(&cm).is_err());
    assert_eq!(cm.used_bytes(), used_before, "partial copy must unwind");
}

#[test]
fn release_returns_every_frame_for_reuse() {
    let cm = coremap();
    let mut space = populated(&cm);
    assert_eq!(cm.used_bytes(), 3 * u64::from(PAGE_SIZE));

    space.release_frames(&cm);
    assert_eq!(cm.used_bytes(), 0);
    assert_eq!(space.mapping_count(), 0);
    assert_eq!(space.regions().count(), 0);

    // the freed frames satisfy a fresh allocation
    assert!(cm.alloc_pages(3).is_ok());
}
