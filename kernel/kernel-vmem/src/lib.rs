//! # Per-process virtual memory: regions, page table, fault handling
//!
//! This crate carries everything between the trap frame and the coremap:
//!
//! ```text
//! hardware trap
//!      │
//! ┌────▼───────────────────────────────────────┐
//! │ Fault handler (fault)                      │
//! │   • classify READ / WRITE / READONLY       │
//! │   • region lookup, stack window            │
//! └────┬───────────────────────────────────────┘
//!      │
//! ┌────▼───────────────────────────────────────┐
//! │ AddressSpace (address_space)               │
//! │   • ordered Region list (region)           │
//! │   • PageTable, linear scan (page_table)    │
//! └────┬───────────────────────────────────────┘
//!      │ first touch
//! ┌────▼───────────────────────────────────────┐
//! │ Coremap (kernel-coremap)                   │
//! └────┬───────────────────────────────────────┘
//!      │
//! ┌────▼───────────────────────────────────────┐
//! │ TLB install (tlb), spl raised              │
//! └────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//!
//! An address space's region list and page table are owned exclusively by
//! it: they are mutated only by the owning thread, or by fork/exit code
//! acting on a space that has not been published yet, so the page table
//! itself carries no lock. The TLB-install step runs with the interrupt
//! level raised ([`kernel_sync::spl`]) and nothing inside that window can
//! fail or block.
//!
//! ## Non-goals
//!
//! Swap-backed eviction, copy-on-write fork (cloning duplicates frames),
//! and cross-processor TLB shootdown (fatal if requested, never a silent
//! no-op).

#![cfg_attr(not(any(test, doctest)), no_std)]

extern crate alloc;

pub mod address_space;
pub mod current;
pub mod fault;
pub mod layout;
pub mod page_table;
pub mod region;
pub mod tlb;

pub use address_space::AddressSpace;
pub use current::CurrentSpace;
pub use fault::{FaultKind, VmFault, handle_fault};
pub use page_table::{PageTable, PageTableEntry};
pub use region::{Permissions, Region, RegionError};
pub use tlb::{EntryHi, EntryLo, SoftTlb, Tlb};
