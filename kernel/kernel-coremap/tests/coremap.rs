use kernel_addresses::{PAGE_SIZE, PhysicalAddress};
use kernel_coremap::{Coremap, CoremapError};

// 1 MiB of modeled physical memory starting at 1 MiB. After the record
// table reservation this leaves a small, predictable number of frames.
const FIRST: u32 = 0x0010_0000;
const LAST: u32 = 0x0020_0000;

fn fresh() -> Coremap {
    Coremap::new(PhysicalAddress::new(FIRST), PhysicalAddress::new(LAST))
}

#[test]
fn bootstrap_reserves_record_table() {
    let cm = fresh();
    // The first managed frame sits above FIRST: the record table was carved
    // off the front of the range.
    assert!(cm.first_managed().base().as_u32() > FIRST);
    assert!(cm.total_pages() > 0);
    assert_eq!(cm.used_bytes(), 0);
}

#[test]
fn alloc_marks_a_contiguous_run() {
    let cm = fresh();
    let base = cm.alloc_pages(3).expect("3 frames");
    assert!(base.is_page_aligned());

    // run head carries the block length; every frame is allocated
    let head = cm.frame(base).expect("managed");
    assert!(head.is_allocated());
    assert_eq!(head.block_length(), 3);
    for i in 1..3 {
        let f = cm.frame(base + i * PAGE_SIZE).expect("managed");
        assert!(f.is_allocated());
        assert_eq!(f.block_length(), 0);
    }

    assert_eq!(cm.used_bytes(), 3 * u64::from(PAGE_SIZE));
}

#[test]
fn matched_alloc_free_restores_used_bytes() {
    let cm = fresh();
    let before = cm.used_bytes();

    let a = cm.alloc_pages(4).unwrap();
    let b = cm.alloc_pages(1).unwrap();
    assert_eq!(cm.used_bytes(), before + 5 * u64::from(PAGE_SIZE));

    cm.free_pages(a);
    cm.free_pages(b);
    assert_eq!(cm.used_bytes(), before);

    // freed frames are reusable
    let c = cm.alloc_pages(4).unwrap();
    assert_eq!(c, a, "first-fit reuses the first freed run");
}

#[test]
fn first_fit_takes_first_qualifying_run() {
    let cm = fresh();
    let a = cm.alloc_pages(2).unwrap();
    let b = cm.alloc_pages(2).unwrap();
    let _c = cm.alloc_pages(2).unwrap();

    // punch a two-frame hole at the front, then a later one
    cm.free_pages(a);
    cm.free_pages(b);

    // a single-frame request lands in the first hole even though the
    // second would fit as well
    let d = cm.alloc_pages(1).unwrap();
    assert_eq!(d, a);
}

#[test]
fn fragmented_memory_fails_without_partial_allocation() {
    let cm = fresh();
    let total = cm.total_pages();

    // Allocate everything as alternating pairs, then free every other pair
    // so no contiguous run reaches `total / 2` frames.
    let mut runs = Vec::new();
    for _ in 0..total / 2 {
        runs.push(cm.alloc_pages(2).unwrap());
    }
    // odd leftover frame, if any
    let leftover = cm.alloc_pages(1).ok();

    for run in runs.iter().step_by(2) {
        cm.free_pages(*run);
    }
    let used_before = cm.used_bytes();

    // More free frames than this exist in total, but never contiguously.
    let want = total / 2 + 1;
    assert_eq!(
        cm.alloc_pages(want),
        Err(CoremapError::OutOfMemory { pages: want })
    );

    // no partial allocation: nothing changed
    assert_eq!(cm.used_bytes(), used_before);

    if let Some(l) = leftover {
        cm.free_pages(l);
    }
}

#[test]
fn exhausting_and_refilling_the_whole_map() {
    let cm = fresh();
    let total = cm.total_pages();

    let all = cm.alloc_pages(total).expect("whole map");
    assert_eq!(cm.used_bytes(), u64::from(total) * u64::from(PAGE_SIZE));
    assert_eq!(
        cm.alloc_pages(1),
        Err(CoremapError::OutOfMemory { pages: 1 })
    );

    cm.free_pages(all);
    assert_eq!(cm.used_bytes(), 0);
    assert!(cm.alloc_pages(total).is_ok());
}

#[test]
#[should_panic(expected = "unallocated")]
fn freeing_an_unallocated_frame_is_fatal() {
    let cm = fresh();
    cm.free_pages(cm.first_managed().base());
}

#[test]
#[should_panic(expected = "unmanaged")]
fn freeing_an_unmanaged_address_is_fatal() {
    let cm = fresh();
    cm.free_pages(PhysicalAddress::new(LAST + PAGE_SIZE));
}

#[test]
#[should_panic(expected = "not the base of a run")]
fn freeing_mid_run_is_fatal() {
    let cm = fresh();
    let base = cm.alloc_pages(2).unwrap();
    cm.free_pages(base + PAGE_SIZE);
}

#[test]
fn tlb_slot_hint_is_recorded_and_cleared() {
    let cm = fresh();
    let base = cm.alloc_pages(1).unwrap();
    assert_eq!(cm.frame(base).unwrap().tlb_slot(), None);

    cm.note_tlb_slot(base, 0, 17);
    let f = cm.frame(base).unwrap();
    assert_eq!(f.tlb_slot(), Some(17));
    assert_eq!(f.cpu_index(), 0);

    cm.free_pages(base);
    assert_eq!(cm.frame(base).unwrap().tlb_slot(), None);
}
