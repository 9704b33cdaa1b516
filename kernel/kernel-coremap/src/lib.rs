//! # Coremap: the global physical-frame allocator
//!
//! Owns every physical page frame above the kernel image and serves
//! contiguous multi-frame allocation and release requests under one global
//! lock. This is the sole arbiter of physical-memory ownership; address
//! spaces and the kernel heap all draw from it.
//!
//! ## Design
//!
//! - One [`FrameRecord`] per managed page, built at bootstrap after the
//!   coremap reserves the physical space its own record table occupies.
//! - [`Coremap::alloc_pages`] is a single linear first-fit scan keeping a
//!   running count of consecutive free frames, O(total frames) per call,
//!   executed entirely under the lock. The first qualifying run wins; there
//!   is no compaction and no fairness.
//! - There is no backing store, so allocation failure is immediate and
//!   final for that call: the caller must treat it as resource exhaustion.
//! - Freeing anything that is not the base of a live allocation indicates
//!   allocator-state corruption and is fatal.
//!
//! The lock is only ever held for the bounded scans; nothing blocks or
//! sleeps while holding it.

#![cfg_attr(not(any(test, doctest)), no_std)]

extern crate alloc;

mod coremap;

pub use coremap::{Coremap, CoremapError, FrameRecord};
