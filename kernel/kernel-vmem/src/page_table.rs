//! The per-address-space page table.
//!
//! A flat, unsorted list of virtual-to-physical mappings searched by linear
//! scan. Small and obviously correct over fast; an arena indexed by page
//! number is the upgrade path if lookup ever shows up in profiles.

use alloc::vec::Vec;
use kernel_addresses::{PhysicalPage, VirtualPage};

use crate::region::Permissions;

/// One virtual-to-physical mapping plus the permission snapshot taken when
/// it was inserted.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PageTableEntry {
    vpage: VirtualPage,
    pframe: PhysicalPage,
    perms: Permissions,
}

impl PageTableEntry {
    #[inline]
    #[must_use]
    pub const fn new(vpage: VirtualPage, pframe: PhysicalPage, perms: Permissions) -> Self {
        Self {
            vpage,
            pframe,
            perms,
        }
    }

    #[inline]
    #[must_use]
    pub const fn vpage(&self) -> VirtualPage {
        self.vpage
    }

    #[inline]
    #[must_use]
    pub const fn pframe(&self) -> PhysicalPage {
        self.pframe
    }

    #[inline]
    #[must_use]
    pub const fn perms(&self) -> Permissions {
        self.perms
    }
}

/// Unsorted mapping list, keyed by virtual page number.
#[derive(Clone, Debug, Default)]
pub struct PageTable {
    entries: Vec<PageTableEntry>,
}

impl PageTable {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Linear-scan lookup by virtual page number.
    #[must_use]
    pub fn lookup(&self, vpage: VirtualPage) -> Option<&PageTableEntry> {
        self.entries.iter().find(|e| e.vpage == vpage)
    }

    /// Appends without duplicate checking; inserting a page that is already
    /// mapped is a caller error.
    pub fn insert(&mut self, entry: PageTableEntry) {
        debug_assert!(
            self.lookup(entry.vpage).is_none(),
            "duplicate mapping for {:?}",
            entry.vpage
        );
        self.entries.push(entry);
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &PageTableEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<'a> IntoIterator for &'a PageTable {
    type Item = &'a PageTableEntry;
    type IntoIter = core::slice::Iter<'a, PageTableEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(v: u32, p: u32) -> PageTableEntry {
        PageTableEntry::new(
            VirtualPage::from_number(v),
            PhysicalPage::from_number(p),
            Permissions::read_write(),
        )
    }

    #[test]
    fn lookup_finds_inserted_entries() {
        let mut pt = PageTable::new();
        pt.insert(entry(0x400, 0x101));
        pt.insert(entry(0x7FF, 0x102));

        assert_eq!(
            pt.lookup(VirtualPage::from_number(0x400)).unwrap().pframe(),
            PhysicalPage::from_number(0x101)
        );
        assert!(pt.lookup(VirtualPage::from_number(0x401)).is_none());
        assert_eq!(pt.len(), 2);
    }

    #[test]
    fn iteration_preserves_insertion_order() {
        let mut pt = PageTable::new();
        for v in [5u32, 3, 9] {
            pt.insert(entry(v, v + 0x100));
        }
        let order: Vec<u32> = pt.iter().map(|e| e.vpage().number()).collect();
        assert_eq!(order, [5, 3, 9]);
    }
}
