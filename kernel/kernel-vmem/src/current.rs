//! The scheduler-facing "current address space" slot.
//!
//! The scheduler owns one of these per processor and swaps spaces in and
//! out on context switch; the trap layer reads it to hand
//! [`crate::handle_fault`] its address space. The modeled TLB carries no
//! address-space tags, so activating a space means flushing every
//! translation the previous one installed.

use kernel_sync::{SpinLock, spl};

use crate::address_space::AddressSpace;
use crate::tlb::Tlb;

/// Holder for the address space the current thread runs in, if any.
pub struct CurrentSpace {
    slot: SpinLock<Option<AddressSpace>>,
}

impl CurrentSpace {
    /// An empty slot (kernel threads run without an address space).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slot: SpinLock::new(None),
        }
    }

    /// Installs `space`, returning the one it displaced.
    pub fn set(&self, space: AddressSpace) -> Option<AddressSpace> {
        self.slot.lock().replace(space)
    }

    /// Removes and returns the installed space.
    pub fn take(&self) -> Option<AddressSpace> {
        self.slot.lock().take()
    }

    /// Runs `f` with mutable access to the installed space (or `None`).
    pub fn with<R>(&self, f: impl FnOnce(Option<&mut AddressSpace>) -> R) -> R {
        let mut guard = self.slot.lock();
        f(guard.as_mut())
    }

    /// Makes the installed space's translations current by flushing the
    /// TLB. A kernel thread without a space leaves the prior translations
    /// in place; nothing will use them at user privilege.
    pub fn activate<T: Tlb>(&self, tlb: &mut T) {
        let guard = self.slot.lock();
        if guard.is_some() {
            let _spl = spl::raise_high();
            tlb.invalidate_all();
        }
    }

    /// Counterpart to [`activate`](Self::activate) on switch-out. Nothing
    /// to do for this design; the flush happens on the way in.
    pub fn deactivate(&self) {}
}

impl Default for CurrentSpace {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tlb::{EntryHi, EntryLo, SoftTlb};
    use kernel_addresses::{PhysicalPage, VirtualPage};

    #[test]
    fn set_take_roundtrip() {
        let current = CurrentSpace::new();
        assert!(current.take().is_none());

        assert!(current.set(AddressSpace::new()).is_none());
        assert!(current.with(|s| s.is_some()));
        assert!(current.take().is_some());
        assert!(current.take().is_none());
    }

    #[test]
    fn activate_flushes_only_with_a_space() {
        let current = CurrentSpace::new();
        let mut tlb = SoftTlb::<4>::new();
        tlb.write_random(
            EntryHi::for_page(VirtualPage::from_number(1)),
            EntryLo::translation(PhysicalPage::from_number(2), false),
        );

        // kernel thread: prior translations stay
        current.activate(&mut tlb);
        assert_eq!(tlb.occupied(), 1);

        current.set(AddressSpace::new());
        current.activate(&mut tlb);
        assert_eq!(tlb.occupied(), 0);
    }
}
