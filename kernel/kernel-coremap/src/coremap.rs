use alloc::vec::Vec;
use core::mem::size_of;

use kernel_addresses::{PAGE_SIZE, PhysicalAddress, PhysicalPage, page_round_up};
use kernel_sync::SpinLock;
use log::{debug, trace};

/// Bookkeeping for one physical page frame.
///
/// `block_length` is set only on the first frame of an allocated run; the
/// whole run is freed as a unit. `swap_slot` is a stub (eviction to a
/// backing store is not implemented), and `cpu_index`/`tlb_slot` anticipate
/// multiprocessor TLB maintenance that is likewise out of scope.
#[derive(Copy, Clone, Debug)]
pub struct FrameRecord {
    base: PhysicalPage,
    swap_slot: u32,
    cpu_index: u8,
    tlb_slot: Option<u8>,
    block_length: u32,
    allocated: bool,
    pinned: bool,
}

impl FrameRecord {
    const fn new(base: PhysicalPage) -> Self {
        Self {
            base,
            swap_slot: 0,
            cpu_index: 0,
            tlb_slot: None,
            block_length: 0,
            allocated: false,
            pinned: false,
        }
    }

    /// Base address of the frame this record tracks.
    #[inline]
    #[must_use]
    pub const fn base(&self) -> PhysicalPage {
        self.base
    }

    #[inline]
    #[must_use]
    pub const fn is_allocated(&self) -> bool {
        self.allocated
    }

    /// Length of the allocated run starting here; zero everywhere else.
    #[inline]
    #[must_use]
    pub const fn block_length(&self) -> u32 {
        self.block_length
    }

    #[inline]
    #[must_use]
    pub const fn is_pinned(&self) -> bool {
        self.pinned
    }

    /// Stub swap slot; always zero until eviction exists.
    #[inline]
    #[must_use]
    pub const fn swap_slot(&self) -> u32 {
        self.swap_slot
    }

    /// Index of the CPU that last touched this frame's translation.
    #[inline]
    #[must_use]
    pub const fn cpu_index(&self) -> u8 {
        self.cpu_index
    }

    /// Last TLB slot this frame's translation was installed at, if known.
    #[inline]
    #[must_use]
    pub const fn tlb_slot(&self) -> Option<u8> {
        self.tlb_slot
    }
}

/// Failures reported by the coremap.
#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum CoremapError {
    /// No contiguous run of `pages` free frames exists. Final for this
    /// call; the allocator never compacts or waits for memory.
    #[error("out of memory: no contiguous run of {pages} free frames")]
    OutOfMemory { pages: u32 },
}

struct CoremapInner {
    frames: Vec<FrameRecord>,
}

impl CoremapInner {
    /// Index of the record whose frame base is `addr`, by linear scan.
    fn index_of(&self, addr: PhysicalAddress) -> Option<usize> {
        let page = addr.page();
        self.frames.iter().position(|f| f.base == page)
    }
}

/// The global physical-frame allocator.
///
/// All operations serialize on one internal lock, so allocations and
/// releases are totally ordered: one completes before the next begins.
pub struct Coremap {
    inner: SpinLock<CoremapInner>,
    first_managed: PhysicalPage,
}

impl Coremap {
    /// Partitions `[first, last)` into page frames, one record per page.
    ///
    /// The space the record table itself would occupy in physical memory is
    /// reserved first (rounded up to whole pages), so the coremap never
    /// hands out the frames holding its own bookkeeping.
    ///
    /// # Panics
    /// If the range is empty, unaligned, or too small to hold the record
    /// table plus at least one managed frame.
    #[must_use]
    pub fn new(first: PhysicalAddress, last: PhysicalAddress) -> Self {
        assert!(first.is_page_aligned(), "coremap base must be page-aligned");
        assert!(last.is_page_aligned(), "coremap limit must be page-aligned");
        assert!(last > first, "empty physical range");

        // Reserve the record table: sized for the optimistic page count,
        // rounded up to whole pages, carved off the front of the range.
        let raw_pages = (last.as_u32() - first.as_u32()) / PAGE_SIZE;
        let table_bytes = page_round_up(raw_pages * size_of::<FrameRecord>() as u32);
        let first = first + table_bytes;
        assert!(last > first, "physical range too small for the coremap");

        let npages = (last.as_u32() - first.as_u32()) / PAGE_SIZE;
        let mut frames = Vec::with_capacity(npages as usize);
        for i in 0..npages {
            frames.push(FrameRecord::new((first + i * PAGE_SIZE).page()));
        }

        debug!(
            "coremap: managing {npages} frames at {first}..{last} ({table_bytes} bytes of records)"
        );

        Self {
            inner: SpinLock::new(CoremapInner { frames }),
            first_managed: first.page(),
        }
    }

    /// Allocates `npages` contiguous frames, first-fit.
    ///
    /// Returns the base address of the run. On failure nothing is marked:
    /// there is no partial allocation even when enough frames exist
    /// non-contiguously.
    ///
    /// # Errors
    /// [`CoremapError::OutOfMemory`] when no single free run of `npages`
    /// frames exists.
    ///
    /// # Panics
    /// If `npages` is zero.
    pub fn alloc_pages(&self, npages: u32) -> Result<PhysicalAddress, CoremapError> {
        assert!(npages > 0, "zero-page allocation");

        let mut inner = self.inner.lock();
        let mut run = 0u32;
        for i in 0..inner.frames.len() {
            if inner.frames[i].allocated {
                run = 0;
            } else {
                run += 1;
            }
            if run == npages {
                let start = i + 1 - npages as usize;
                inner.frames[start].block_length = npages;
                for frame in &mut inner.frames[start..=i] {
                    frame.allocated = true;
                }
                let base = inner.frames[start].base.base();
                trace!("coremap: alloc {npages} frame(s) at {base}");
                return Ok(base);
            }
        }
        trace!("coremap: no run of {npages} free frame(s)");
        Err(CoremapError::OutOfMemory { pages: npages })
    }

    /// Releases the run whose base address is `addr`.
    ///
    /// The whole run is freed atomically as a unit under the lock.
    ///
    /// # Panics
    /// If `addr` is not the base of a live allocation. A free of an
    /// unallocated or unmanaged frame means the allocator's state has been
    /// corrupted, which cannot be safely continued past.
    pub fn free_pages(&self, addr: PhysicalAddress) {
        let mut inner = self.inner.lock();
        let Some(start) = inner.index_of(addr) else {
            panic!("coremap: free of unmanaged frame {addr}");
        };
        let head = &inner.frames[start];
        assert!(head.allocated, "coremap: free of unallocated frame {addr}");
        assert!(
            head.block_length > 0,
            "coremap: free of {addr} which is not the base of a run"
        );

        let run = head.block_length as usize;
        for frame in &mut inner.frames[start..start + run] {
            frame.allocated = false;
            frame.block_length = 0;
            frame.tlb_slot = None;
        }
        trace!("coremap: freed {run} frame(s) at {addr}");
    }

    /// Allocated-frame count times the page size, for diagnostics.
    #[must_use]
    pub fn used_bytes(&self) -> u64 {
        let inner = self.inner.lock();
        let used = inner.frames.iter().filter(|f| f.allocated).count();
        used as u64 * u64::from(PAGE_SIZE)
    }

    /// Number of frames under management.
    #[must_use]
    pub fn total_pages(&self) -> u32 {
        self.inner.lock().frames.len() as u32
    }

    /// First frame past the bootstrap reservation.
    #[must_use]
    pub const fn first_managed(&self) -> PhysicalPage {
        self.first_managed
    }

    /// Snapshot of the record tracking `addr`'s frame, if managed.
    #[must_use]
    pub fn frame(&self, addr: PhysicalAddress) -> Option<FrameRecord> {
        let inner = self.inner.lock();
        inner.index_of(addr).map(|i| inner.frames[i])
    }

    /// Records the TLB slot (and implicitly the CPU) a frame's translation
    /// was last installed at. Bookkeeping for eventual multiprocessor TLB
    /// maintenance; nothing consumes it yet.
    pub fn note_tlb_slot(&self, addr: PhysicalAddress, cpu: u8, slot: u8) {
        let mut inner = self.inner.lock();
        if let Some(i) = inner.index_of(addr) {
            inner.frames[i].cpu_index = cpu;
            inner.frames[i].tlb_slot = Some(slot);
        }
    }
}
