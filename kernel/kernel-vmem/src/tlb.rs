//! # Hardware translation cache (TLB) interface
//!
//! The modeled MMU consults a small fully-associative cache of
//! ([`EntryHi`], [`EntryLo`]) pairs before the page table. The kernel only
//! ever drives it through four operations: write at an index, write at a
//! random replacement slot, probe for an address, and invalidate an index —
//! captured here as the [`Tlb`] trait so the fault handler stays
//! machine-independent and testable.
//!
//! [`SoftTlb`] is the software implementation used on the hosted build; the
//! machine-dependent layer supplies the real one from the corresponding
//! cp0 instructions.
//!
//! Cross-processor invalidation is deliberately fatal, not a no-op: nothing
//! on this path knows how to keep another CPU's TLB consistent, and
//! pretending otherwise would corrupt translations silently.

use bitfield_struct::bitfield;
use kernel_addresses::{PhysicalPage, VirtualPage};

/// TLB key word: which virtual page an entry translates.
///
/// Bit layout of the modeled hardware:
///
/// | Bits  | Name    | Meaning |
/// |-------|---------|---------|
/// | 0–11  | —       | unused by this kernel (ASID space) |
/// | 12–31 | `vpage` | virtual page number |
#[bitfield(u32)]
#[derive(Eq, PartialEq)]
pub struct EntryHi {
    #[bits(12)]
    __: u32,
    /// Virtual page number.
    #[bits(20)]
    pub vpage: u32,
}

impl EntryHi {
    /// Key for the entry translating `page`.
    #[inline]
    #[must_use]
    pub fn for_page(page: VirtualPage) -> Self {
        Self::new().with_vpage(page.number())
    }

    #[inline]
    #[must_use]
    pub const fn page(self) -> VirtualPage {
        VirtualPage::from_number(self.vpage())
    }
}

/// TLB data word: where an entry translates to, and how.
///
/// | Bits  | Name     | Meaning |
/// |-------|----------|---------|
/// | 0–7   | —        | unused |
/// | 8     | `global` | match regardless of ASID (unused by this kernel) |
/// | 9     | `valid`  | translation usable |
/// | 10    | `dirty`  | writable; writes through a clean entry re-fault |
/// | 11    | —        | uncached attribute, unused |
/// | 12–31 | `pframe` | physical frame number |
#[bitfield(u32)]
#[derive(Eq, PartialEq)]
pub struct EntryLo {
    #[bits(8)]
    __: u32,
    pub global: bool,
    pub valid: bool,
    pub dirty: bool,
    /// Uncached attribute; carried but never set by this kernel.
    pub uncached: bool,
    /// Physical frame number.
    #[bits(20)]
    pub pframe: u32,
}

impl EntryLo {
    /// A usable translation to `frame`; `dirty` grants write access.
    #[inline]
    #[must_use]
    pub fn translation(frame: PhysicalPage, dirty: bool) -> Self {
        Self::new()
            .with_pframe(frame.number())
            .with_valid(true)
            .with_dirty(dirty)
    }

    #[inline]
    #[must_use]
    pub const fn frame(self) -> PhysicalPage {
        PhysicalPage::from_number(self.pframe())
    }
}

/// Operations the hardware translation cache provides.
///
/// Callers install entries only with the interrupt level raised
/// ([`kernel_sync::spl::raise_high`]); the trait itself carries no locking.
pub trait Tlb {
    /// Number of slots in the cache.
    fn entry_count(&self) -> usize;

    /// Overwrites the entry at `slot`.
    fn write_indexed(&mut self, slot: usize, hi: EntryHi, lo: EntryLo);

    /// Writes at a hardware-chosen replacement slot, returning the slot
    /// used.
    fn write_random(&mut self, hi: EntryHi, lo: EntryLo) -> usize;

    /// Slot currently keyed by `hi`, if any.
    fn probe(&self, hi: EntryHi) -> Option<usize>;

    /// Discards the entry at `slot`.
    fn invalidate(&mut self, slot: usize);

    /// Discards every entry (context-switch flush).
    fn invalidate_all(&mut self) {
        for slot in 0..self.entry_count() {
            self.invalidate(slot);
        }
    }
}

/// Software TLB standing in for the hardware cache on the hosted build.
///
/// Replacement is a rotor rather than the hardware's pseudo-random
/// register, which makes fault-handler tests deterministic while keeping
/// the same "any slot may be evicted at any time" contract.
pub struct SoftTlb<const N: usize = 64> {
    slots: [Option<(EntryHi, EntryLo)>; N],
    rotor: usize,
}

impl<const N: usize> SoftTlb<N> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: [None; N],
            rotor: 0,
        }
    }

    /// The entry at `slot`, if valid.
    #[must_use]
    pub const fn entry(&self, slot: usize) -> Option<(EntryHi, EntryLo)> {
        self.slots[slot]
    }

    /// The data word keyed by `page`, if present.
    #[must_use]
    pub fn lookup(&self, page: VirtualPage) -> Option<EntryLo> {
        self.probe(EntryHi::for_page(page))
            .and_then(|slot| self.slots[slot].map(|(_, lo)| lo))
    }

    /// Number of live entries.
    #[must_use]
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

impl<const N: usize> Default for SoftTlb<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Tlb for SoftTlb<N> {
    fn entry_count(&self) -> usize {
        N
    }

    fn write_indexed(&mut self, slot: usize, hi: EntryHi, lo: EntryLo) {
        self.slots[slot] = Some((hi, lo));
    }

    fn write_random(&mut self, hi: EntryHi, lo: EntryLo) -> usize {
        let slot = self.rotor;
        self.rotor = (self.rotor + 1) % N;
        self.slots[slot] = Some((hi, lo));
        slot
    }

    fn probe(&self, hi: EntryHi) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| matches!(s, Some((h, _)) if h.vpage() == hi.vpage()))
    }

    fn invalidate(&mut self, slot: usize) {
        self.slots[slot] = None;
    }
}

/// A request to invalidate a translation on another processor.
#[derive(Copy, Clone, Debug)]
pub struct TlbShootdown {
    pub cpu: u8,
    pub vpage: VirtualPage,
}

/// Cross-processor invalidation of one translation. Unimplemented and
/// fatal by design.
pub fn shootdown(request: &TlbShootdown) -> ! {
    panic!(
        "tlb shootdown requested for cpu {} page {:?}; cross-processor TLB consistency is not implemented",
        request.cpu, request.vpage
    );
}

/// Cross-processor flush of every translation. Unimplemented and fatal by
/// design.
pub fn shootdown_all() -> ! {
    panic!("tlb shootdown-all requested; cross-processor TLB consistency is not implemented");
}
