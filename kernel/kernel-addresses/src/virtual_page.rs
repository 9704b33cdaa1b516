use crate::{PAGE_SHIFT, VirtualAddress};
use core::fmt;

/// Number of a virtual page: the upper 20 bits of a [`VirtualAddress`].
///
/// Page-table entries key on this, and the TLB EntryHi word carries it in
/// its upper bits. Constructed via [`VirtualAddress::page`] or
/// [`VirtualPage::containing`]; converting back with [`base`](Self::base)
/// always yields an aligned address.
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct VirtualPage(u32);

impl VirtualPage {
    /// The page containing `addr`.
    #[inline]
    #[must_use]
    pub const fn containing(addr: VirtualAddress) -> Self {
        Self(addr.as_u32() >> PAGE_SHIFT)
    }

    /// Builds a page from a raw page number (lower 20 bits significant).
    #[inline]
    #[must_use]
    pub const fn from_number(n: u32) -> Self {
        Self(n)
    }

    #[inline]
    #[must_use]
    pub const fn number(self) -> u32 {
        self.0
    }

    /// Base address of this page (always page-aligned).
    #[inline]
    #[must_use]
    pub const fn base(self) -> VirtualAddress {
        VirtualAddress::new(self.0 << PAGE_SHIFT)
    }

    /// The page `count` pages above this one.
    #[inline]
    #[must_use]
    pub const fn add_pages(self, count: u32) -> Self {
        Self(self.0 + count)
    }
}

impl fmt::Debug for VirtualPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VPage(0x{:05X})", self.0)
    }
}
