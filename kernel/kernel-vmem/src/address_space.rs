//! # Per-process address space
//!
//! Owns exactly one region list and one page table. Created on process
//! creation/exec, deep-copied on fork, and torn down on exit or exec
//! replacement, which must hand every owned frame back to the coremap
//! before the object goes away.
//!
//! The space is mutated only by its owning thread, or by fork/exit code
//! acting on a space that has not been published to the scheduler yet, so
//! none of these methods take a lock.

use alloc::vec::Vec;

use kernel_addresses::{PAGE_SIZE, PhysicalPage, VirtualAddress, VirtualPage};
use kernel_coremap::{Coremap, CoremapError};
use log::{debug, trace};

use crate::layout;
use crate::page_table::{PageTable, PageTableEntry};
use crate::region::{Permissions, Region, RegionError};

/// Regions, page table, heap bounds, and the load-time write-protection
/// relaxation flag for one process.
#[derive(Debug, Default)]
pub struct AddressSpace {
    regions: Vec<Region>,
    pages: PageTable,
    heap_start: VirtualAddress,
    heap_end: VirtualAddress,
    loading: bool,
}

impl AddressSpace {
    /// An empty space: no regions, no mappings, zeroed heap bounds.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            regions: Vec::new(),
            pages: PageTable::new(),
            heap_start: VirtualAddress::zero(),
            heap_end: VirtualAddress::zero(),
            loading: false,
        }
    }

    /// Defines a segment at `vaddr` of `size` bytes with `perms`.
    ///
    /// Base and length are page-aligned (base down, length up, including
    /// the slack the base alignment introduced). Regions are kept in
    /// creation order; the heap is assumed to start above the highest
    /// region seen so far, so `heap_start`/`heap_end` move up when this
    /// region tops them.
    ///
    /// # Errors
    /// [`RegionError::Empty`] for a zero-page range,
    /// [`RegionError::Overlap`] if the range intersects an existing region,
    /// [`RegionError::OutOfRange`] if it would extend past the top of user
    /// space.
    pub fn define_region(
        &mut self,
        vaddr: VirtualAddress,
        size: u32,
        perms: Permissions,
    ) -> Result<(), RegionError> {
        // Align the base down and fold the slack into the length. Widen to
        // u64 so a size near u32::MAX cannot wrap the rounding math.
        let base = vaddr.page_align_down();
        let slack = u64::from(vaddr.as_u32() - base.as_u32());
        let bytes =
            (u64::from(size) + slack).div_ceil(u64::from(PAGE_SIZE)) * u64::from(PAGE_SIZE);
        if bytes == 0 {
            return Err(RegionError::Empty);
        }
        if u64::from(base.as_u32()) + bytes > u64::from(layout::USER_SPACE_TOP) {
            return Err(RegionError::OutOfRange);
        }
        // Fits below USER_SPACE_TOP, so both narrow losslessly.
        let size = bytes as u32;
        let npages = size / PAGE_SIZE;

        let region = Region::new(base.page(), npages, perms);
        self.push_region(region)?;

        if base > self.heap_start {
            self.heap_start = base;
        }
        let end = base + size;
        if end > self.heap_end {
            self.heap_end = end;
        }

        debug!(
            "as: region {base}..{end} ({npages} pages, {}) heap {}..{}",
            perms, self.heap_start, self.heap_end
        );
        Ok(())
    }

    /// Reserves the fixed stack window at the top of the address range and
    /// returns the initial stack pointer.
    ///
    /// The stack does not move the heap bounds; it lives above them by
    /// construction.
    ///
    /// # Errors
    /// [`RegionError::Overlap`] if a region already covers the window
    /// (calling this twice does).
    pub fn define_stack(&mut self) -> Result<VirtualAddress, RegionError> {
        let region = Region::new(
            layout::stack_base().page(),
            layout::STACK_PAGES,
            Permissions::read_write(),
        );
        self.push_region(region)?;
        Ok(VirtualAddress::new(layout::USER_SPACE_TOP))
    }

    fn push_region(&mut self, region: Region) -> Result<(), RegionError> {
        if self.regions.iter().any(|r| r.overlaps(&region)) {
            return Err(RegionError::Overlap);
        }
        self.regions.push(region);
        Ok(())
    }

    /// Marks the start of program-image population: while loading, a write
    /// fault against a read-only region is tolerated so the loader can
    /// fill segments before their permissions bind.
    pub fn prepare_load(&mut self) {
        self.loading = true;
    }

    /// Ends program-image population; permissions are enforced from here
    /// on.
    pub fn complete_load(&mut self) {
        self.loading = false;
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// First region containing `page`, in creation order.
    #[must_use]
    pub fn find_region(&self, page: VirtualPage) -> Option<&Region> {
        self.regions.iter().find(|r| r.contains(page))
    }

    /// Regions in creation order.
    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    /// Linear-scan mapping lookup by virtual page.
    #[must_use]
    pub fn lookup(&self, page: VirtualPage) -> Option<&PageTableEntry> {
        self.pages.lookup(page)
    }

    /// Installs a mapping; the page must not already be mapped.
    pub fn insert_mapping(&mut self, page: VirtualPage, frame: PhysicalPage, perms: Permissions) {
        self.pages.insert(PageTableEntry::new(page, frame, perms));
    }

    /// Installed mappings in insertion order.
    pub fn mappings(&self) -> impl Iterator<Item = &PageTableEntry> {
        self.pages.iter()
    }

    /// Number of installed mappings.
    #[must_use]
    pub fn mapping_count(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub const fn heap_start(&self) -> VirtualAddress {
        self.heap_start
    }

    #[must_use]
    pub const fn heap_end(&self) -> VirtualAddress {
        self.heap_end
    }

    /// Deep copy for fork: fresh region and page-table nodes, and a fresh
    /// physical frame per mapped page. Nothing is shared with `self`;
    /// mutating the clone never affects the source.
    ///
    /// The modeled frames carry no contents, so duplication is an
    /// ownership transfer only; a machine build copies the page bytes
    /// right after each allocation.
    ///
    /// # Errors
    /// [`CoremapError::OutOfMemory`] if any per-page allocation fails;
    /// frames already duplicated are released first, so a failed copy
    /// leaks nothing.
    pub fn try_clone(&self, coremap: &Coremap) -> Result<Self, CoremapError> {
        let mut pages = PageTable::new();
        for entry in &self.pages {
            let frame = match coremap.alloc_pages(1) {
                Ok(addr) => addr.page(),
                Err(e) => {
                    // Unwind the partial copy before reporting.
                    for copied in &pages {
                        coremap.free_pages(copied.pframe().base());
                    }
                    return Err(e);
                }
            };
            pages.insert(PageTableEntry::new(entry.vpage(), frame, entry.perms()));
        }

        trace!(
            "as: cloned {} regions, {} mappings",
            self.regions.len(),
            pages.len()
        );
        Ok(Self {
            regions: self.regions.clone(),
            pages,
            heap_start: self.heap_start,
            heap_end: self.heap_end,
            loading: self.loading,
        })
    }

    /// Returns every owned frame to the coremap and clears the region list
    /// and page table. Called on exit/exec-replacement before the space is
    /// dropped; a space dropped without this leaks its frames.
    pub fn release_frames(&mut self, coremap: &Coremap) {
        for entry in &self.pages {
            coremap.free_pages(entry.pframe().base());
        }
        trace!(
            "as: released {} frames, {} regions",
            self.pages.len(),
            self.regions.len()
        );
        self.pages.clear();
        self.regions.clear();
        self.heap_start = VirtualAddress::zero();
        self.heap_end = VirtualAddress::zero();
    }
}
