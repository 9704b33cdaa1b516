//! # Kernel synchronization primitives
//!
//! The two collaborators the memory core consumes:
//!
//! - [`SpinLock`], a mutual-exclusion primitive for short, bounded critical
//!   sections (the coremap scan). It must never be acquired from interrupt
//!   context and is never held across a blocking wait.
//! - [`spl`], the interrupt-priority-level facility bracketing TLB writes so
//!   a re-fault on the same address cannot interleave with the install.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

pub mod spl;
mod spin_lock;

pub use spin_lock::{SpinLock, SpinLockGuard};
pub use spl::{Spl, SplGuard};
