//! # Typed memory addresses for a 32-bit MIPS-style MMU
//!
//! Thin wrappers that keep virtual and physical addresses (and their page
//! numbers) apart at the type level, so the coremap and the fault handler
//! cannot accidentally mix the two. The modeled hardware translates fixed
//! 4 KiB pages only; there are no huge pages and no multi-level walks, so
//! there is exactly one page size and one shift.
//!
//! ### Semantics
//! - Use [`VirtualAddress::page`] / [`PhysicalAddress::page`] to derive the
//!   20-bit page number, and [`VirtualPage::base`] / [`PhysicalPage::base`]
//!   to get back the aligned base address.
//! - Alignment is only guaranteed for values returned from `page().base()`.

#![cfg_attr(not(any(test, doctest)), no_std)]

mod physical_address;
mod physical_page;
mod virtual_address;
mod virtual_page;

pub use physical_address::PhysicalAddress;
pub use physical_page::PhysicalPage;
pub use virtual_address::VirtualAddress;
pub use virtual_page::VirtualPage;

/// Size of one page frame in bytes.
pub const PAGE_SIZE: u32 = 4096;

/// Log2 of [`PAGE_SIZE`]; shift between an address and its page number.
pub const PAGE_SHIFT: u32 = 12;

/// Mask selecting the page-number bits of an address.
pub const PAGE_FRAME_MASK: u32 = !(PAGE_SIZE - 1);

const _: () = {
    assert!(PAGE_SIZE.is_power_of_two());
    assert!(1 << PAGE_SHIFT == PAGE_SIZE);
};

/// Rounds `len` up to the next page boundary.
#[inline]
#[must_use]
pub const fn page_round_up(len: u32) -> u32 {
    (len + PAGE_SIZE - 1) & PAGE_FRAME_MASK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_up_is_aligned_and_minimal() {
        assert_eq!(page_round_up(0), 0);
        assert_eq!(page_round_up(1), PAGE_SIZE);
        assert_eq!(page_round_up(PAGE_SIZE), PAGE_SIZE);
        assert_eq!(page_round_up(PAGE_SIZE + 1), 2 * PAGE_SIZE);
    }

    #[test]
    fn split_and_join_roundtrip() {
        let va = VirtualAddress::new(0x0040_1234);
        let vp = va.page();
        assert_eq!(vp.base().as_u32() & (PAGE_SIZE - 1), 0);
        assert_eq!(vp.base().as_u32(), 0x0040_1000);

        let pa = PhysicalAddress::new(0x01F3_2FFF);
        assert_eq!(pa.page().base().as_u32(), 0x01F3_2000);
    }
}
