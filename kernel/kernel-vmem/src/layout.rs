//! # User address-space layout
//!
//! Fixed constants of the modeled machine. User space occupies the low
//! 2 GiB; the stack grows down from its top through a fixed window the
//! fault handler accepts even before any region covers it.

use kernel_addresses::{PAGE_SIZE, VirtualAddress};

/// One past the highest user virtual address; also the initial user stack
/// pointer.
pub const USER_SPACE_TOP: u32 = 0x8000_0000;

/// Fixed size of the stack window, in pages.
pub const STACK_PAGES: u32 = 18;

const _: () = {
    assert!(USER_SPACE_TOP % PAGE_SIZE == 0);
    assert!(STACK_PAGES * PAGE_SIZE < USER_SPACE_TOP);
};

/// Lowest address of the stack window below [`USER_SPACE_TOP`].
#[inline]
#[must_use]
pub const fn stack_base() -> VirtualAddress {
    VirtualAddress::new(USER_SPACE_TOP - STACK_PAGES * PAGE_SIZE)
}

/// Whether `addr` falls inside the fixed stack window.
#[inline]
#[must_use]
pub const fn in_stack_window(addr: VirtualAddress) -> bool {
    addr.as_u32() >= stack_base().as_u32() && addr.as_u32() < USER_SPACE_TOP
}
