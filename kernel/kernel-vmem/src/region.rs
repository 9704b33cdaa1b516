//! Memory regions: contiguous virtual ranges with uniform permissions.

use core::fmt;
use kernel_addresses::VirtualPage;

/// Read/write/execute permission triple for a region or mapping.
///
/// Named fields rather than an indexed array, so each flag has exactly one
/// place to live.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Permissions {
    pub read: bool,
    pub write: bool,
    pub execute: bool,
}

impl Permissions {
    #[inline]
    #[must_use]
    pub const fn new(read: bool, write: bool, execute: bool) -> Self {
        Self {
            read,
            write,
            execute,
        }
    }

    #[inline]
    #[must_use]
    pub const fn read_only() -> Self {
        Self::new(true, false, false)
    }

    #[inline]
    #[must_use]
    pub const fn read_write() -> Self {
        Self::new(true, true, false)
    }

    #[inline]
    #[must_use]
    pub const fn read_execute() -> Self {
        Self::new(true, false, true)
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = if self.read { 'r' } else { '-' };
        let w = if self.write { 'w' } else { '-' };
        let x = if self.execute { 'x' } else { '-' };
        write!(f, "{r}{w}{x}")
    }
}

/// A page-aligned virtual range with one set of permissions.
///
/// Regions live in creation order inside an address space; fault
/// classification takes the first region containing the fault address.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Region {
    base: VirtualPage,
    pages: u32,
    perms: Permissions,
}

impl Region {
    #[inline]
    #[must_use]
    pub const fn new(base: VirtualPage, pages: u32, perms: Permissions) -> Self {
        Self { base, pages, perms }
    }

    #[inline]
    #[must_use]
    pub const fn base(&self) -> VirtualPage {
        self.base
    }

    #[inline]
    #[must_use]
    pub const fn pages(&self) -> u32 {
        self.pages
    }

    #[inline]
    #[must_use]
    pub const fn perms(&self) -> Permissions {
        self.perms
    }

    /// One past the last page of the region (half-open).
    #[inline]
    #[must_use]
    pub const fn end(&self) -> VirtualPage {
        self.base.add_pages(self.pages)
    }

    #[inline]
    #[must_use]
    pub const fn contains(&self, page: VirtualPage) -> bool {
        page.number() >= self.base.number() && page.number() < self.end().number()
    }

    #[inline]
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.base.number() < other.end().number() && other.base.number() < self.end().number()
    }
}

/// Failures while defining a region.
#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum RegionError {
    /// The new range intersects an existing region. Overlapping regions
    /// would make "first matching region wins" permission-dependent on
    /// creation order, so they are rejected outright.
    #[error("region overlaps an existing region")]
    Overlap,
    /// The range rounds to zero pages.
    #[error("region is empty")]
    Empty,
    /// The range extends past the top of the user address range.
    #[error("region extends past the top of user space")]
    OutOfRange,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(n: u32) -> VirtualPage {
        VirtualPage::from_number(n)
    }

    #[test]
    fn containment_is_half_open() {
        let r = Region::new(page(0x400), 4, Permissions::read_only());
        assert!(!r.contains(page(0x3FF)));
        assert!(r.contains(page(0x400)));
        assert!(r.contains(page(0x403)));
        assert!(!r.contains(page(0x404)));
    }

    #[test]
    fn overlap_detection() {
        let a = Region::new(page(0x400), 4, Permissions::read_only());
        let adjacent = Region::new(page(0x404), 4, Permissions::read_only());
        let inside = Region::new(page(0x401), 1, Permissions::read_write());
        let straddle = Region::new(page(0x3FE), 4, Permissions::read_write());

        assert!(!a.overlaps(&adjacent));
        assert!(!adjacent.overlaps(&a));
        assert!(a.overlaps(&inside));
        assert!(a.overlaps(&straddle));
        assert!(straddle.overlaps(&a));
    }

    #[test]
    fn permission_display() {
        assert_eq!(format!("{}", Permissions::read_write()), "rw-");
        assert_eq!(format!("{}", Permissions::read_execute()), "r-x");
    }
}
