use crate::{PAGE_SHIFT, PhysicalAddress};
use core::fmt;

/// Number of a physical page frame: the upper 20 bits of a
/// [`PhysicalAddress`].
///
/// The TLB EntryLo word carries this in its upper bits; page-table entries
/// store it as the target of a translation.
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PhysicalPage(u32);

impl PhysicalPage {
    /// The frame containing `addr`.
    #[inline]
    #[must_use]
    pub const fn containing(addr: PhysicalAddress) -> Self {
        Self(addr.as_u32() >> PAGE_SHIFT)
    }

    /// Builds a frame from a raw frame number (lower 20 bits significant).
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

    /// Base address of this frame (always page-aligned).
    #[inline]
    #[must_use]
    pub const fn base(self) -> PhysicalAddress {
        PhysicalAddress::new(self.0 << PAGE_SHIFT)
    }
}

impl fmt::Debug for PhysicalPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PFrame(0x{:05X})", self.0)
    }
}
