//! # Page-fault handling
//!
//! The trap layer lands here with a fault kind and the faulting virtual
//! address; this module classifies the fault against the current address
//! space, allocates a frame on first touch, and installs the translation
//! in the TLB.
//!
//! Ordering matters: everything that can fail (validation, frame
//! allocation, page-table insertion) happens first, and only then is the
//! interrupt level raised around the bare TLB write. That keeps the
//! raised-spl window minimal and guarantees a re-fault on the same address
//! on this processor cannot interleave with the install.

use kernel_addresses::{PhysicalPage, VirtualAddress};
use kernel_coremap::{Coremap, CoremapError};
use kernel_sync::spl;
use log::trace;

use crate::address_space::AddressSpace;
use crate::layout;
use crate::region::Permissions;
use crate::tlb::{EntryHi, EntryLo, Tlb};

/// The processor this handler runs on. The model is uniprocessor; the
/// frame-record bookkeeping still records it.
const CURRENT_CPU: u8 = 0;

/// Classification of a hardware translation trap.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FaultKind {
    /// Read through a missing translation.
    Read,
    /// Write through a missing translation.
    Write,
    /// Write through a translation whose dirty bit is clear.
    ReadOnly,
}

/// Outcomes the trap layer turns into a fatal user-level fault or a
/// resource-exhaustion error.
#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum VmFault {
    /// Address outside every region and the stack window, or a disallowed
    /// permission violation. Fatal to the faulting process only.
    #[error("invalid access at {addr}")]
    InvalidAccess { addr: VirtualAddress },
    /// No contiguous physical frame available for a first touch.
    #[error("out of physical memory")]
    OutOfMemory,
    /// A read-only fault arrived for a page with no installed mapping; the
    /// TLB and the page table disagree. Surfaced like an invalid access.
    #[error("read-only fault at {addr} with no mapping installed")]
    MissingMapping { addr: VirtualAddress },
}

/// Handles one translation trap against `space`.
///
/// - No current space (kernel thread, or fault before exec finished):
///   invalid access.
/// - The address must fall in some region (first match in creation order)
///   or in the fixed stack window, which implies read/write.
/// - `ReadOnly` requires a writable region or an in-progress load, and an
///   existing mapping; the entry is reinstalled dirty.
/// - `Read`/`Write` allocate exactly one frame on first touch, carrying
///   the region's permission snapshot into the page table; a page already
///   mapped but evicted from the TLB is reinstalled without allocating.
///
/// # Errors
/// [`VmFault::InvalidAccess`], [`VmFault::OutOfMemory`], or
/// [`VmFault::MissingMapping`] as above; the caller decides process fate.
pub fn handle_fault<T: Tlb>(
    space: Option<&mut AddressSpace>,
    coremap: &Coremap,
    tlb: &mut T,
    kind: FaultKind,
    addr: VirtualAddress,
) -> Result<(), VmFault> {
    let Some(space) = space else {
        return Err(VmFault::InvalidAccess { addr });
    };
    let page = addr.page();

    let perms = match space.find_region(page) {
        Some(region) => region.perms(),
        None if layout::in_stack_window(addr) => Permissions::read_write(),
        None => {
            trace!("vm: {kind:?} fault at {addr} outside every region");
            return Err(VmFault::InvalidAccess { addr });
        }
    };

    match kind {
        FaultKind::ReadOnly => {
            // Tolerated only for a writable region or while the loader is
            // populating the image.
            if !(perms.write || space.is_loading()) {
                trace!("vm: write to read-only page at {addr}");
                return Err(VmFault::InvalidAccess { addr });
            }
            let entry = space
                .lookup(page)
                .ok_or(VmFault::MissingMapping { addr })?;
            let frame = entry.pframe();

            let hi = EntryHi::for_page(page);
            let lo = EntryLo::translation(frame, true);
            let slot = {
                let _spl = spl::raise_high();
                match tlb.probe(hi) {
                    Some(slot) => {
                        tlb.write_indexed(slot, hi, lo);
                        slot
                    }
                    None => tlb.write_random(hi, lo),
                }
            };
            note_slot_hint(coremap, frame, slot);
        }

        FaultKind::Read | FaultKind::Write => {
            let frame = match space.lookup(page) {
                // Mapped but evicted from the TLB: reinstall, no allocation.
                Some(entry) => entry.pframe(),
                // First touch: allocate one frame before touching the TLB,
                // so nothing inside the raised-spl window can fail.
                None => {
                    let base = coremap
                        .alloc_pages(1)
                        .map_err(|CoremapError::OutOfMemory { .. }| VmFault::OutOfMemory)?;
                    space.insert_mapping(page, base.page(), perms);
                    trace!("vm: first touch of {addr}, frame {base}");
                    base.page()
                }
            };

            let hi = EntryHi::for_page(page);
            let lo = EntryLo::translation(frame, false);
            let slot = {
                let _spl = spl::raise_high();
                tlb.write_random(hi, lo)
            };
            note_slot_hint(coremap, frame, slot);
        }
    }

    Ok(())
}

/// Records which TLB slot a frame's translation landed in. The frame
/// record stores the hint as a `u8`; a cache wider than 256 slots simply
/// goes unhinted.
fn note_slot_hint(coremap: &Coremap, frame: PhysicalPage, slot: usize) {
    if let Ok(slot) = u8::try_from(slot) {
        coremap.note_tlb_slot(frame.base(), CURRENT_CPU, slot);
    }
}
