//! Software interrupt priority level (spl).
//!
//! The fault handler must install TLB entries atomically with respect to a
//! re-fault on the same address on the same processor, which on the modeled
//! hardware means raising the interrupt level to its highest value for the
//! duration of the write. This module tracks that level in software and
//! hands out a snapshot/restore guard; the machine-dependent layer hooks the
//! actual status-register write into the same two points.
//!
//! The guard is deliberately minimal: it brackets only the TLB-install step
//! and nothing inside it may fail or block.
//!
//! # Examples
//!
//! ```
//! use kernel_sync::spl;
//!
//! assert_eq!(spl::current(), spl::Spl::Low);
//! {
//!     let _g = spl::raise_high();
//!     assert_eq!(spl::current(), spl::Spl::High);
//!     // install TLB entry here
//! }
//! assert_eq!(spl::current(), spl::Spl::Low);
//! ```

use core::sync::atomic::{AtomicU8, Ordering};

/// Interrupt priority level of the current processor.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
#[repr(u8)]
pub enum Spl {
    /// All interrupts deliverable.
    Low = 0,
    /// All interrupts masked.
    High = 1,
}

impl Spl {
    const fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Low,
            _ => Self::High,
        }
    }
}

// Per-processor on real hardware; the model is uniprocessor.
static CURRENT: AtomicU8 = AtomicU8::new(Spl::Low as u8);

/// The current interrupt priority level.
#[inline]
#[must_use]
pub fn current() -> Spl {
    Spl::from_raw(CURRENT.load(Ordering::Acquire))
}

/// Raises the level to [`Spl::High`], returning a guard that restores the
/// prior level on drop.
///
/// Nesting is fine; each guard restores exactly what it observed.
#[inline]
#[must_use]
pub fn raise_high() -> SplGuard {
    let prior = CURRENT.swap(Spl::High as u8, Ordering::Acquire);
    SplGuard {
        prior: Spl::from_raw(prior),
    }
}

/// RAII guard produced by [`raise_high`]; restores the saved level on drop.
pub struct SplGuard {
    /// Level in effect when the guard was created.
    prior: Spl,
}

impl SplGuard {
    /// The level this guard will restore.
    #[inline]
    #[must_use]
    pub const fn prior(&self) -> Spl {
        self.prior
    }
}

impl Drop for SplGuard {
    fn drop(&mut self) {
        CURRENT.store(self.prior as u8, Ordering::Release);
    }
}
