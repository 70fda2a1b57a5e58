//! One-shot registration guard.
//!
//! Host environments may signal "ready" more than once and from several
//! threads. A [`RegistrationLatch`] lets exactly one of those signals run the
//! registration routine.
//!
//! ```
//! use dynamic_search::search::RegistrationLatch;
//!
//! let latch = RegistrationLatch::new();
//! let mut runs = 0;
//! for _ in 0..3 {
//!     latch.run_once(|| runs += 1);
//! }
//! assert_eq!(runs, 1);
//! assert!(latch.is_done());
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

/// Runs a routine at most once, race-free.
#[derive(Debug, Default)]
pub struct RegistrationLatch {
    fired: AtomicBool,
}

impl RegistrationLatch {
    /// Creates an unfired latch.
    pub const fn new() -> Self {
        Self {
            fired: AtomicBool::new(false),
        }
    }

    /// Fires the latch; returns true only for the first caller.
    pub fn try_fire(&self) -> bool {
        self.fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Runs `f` if this call fires the latch, returning its output.
    pub fn run_once<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        if self.try_fire() {
            tracing::info!("Running entity registration");
            Some(f())
        } else {
            tracing::debug!("Entity registration already performed, skipping");
            None
        }
    }

    /// Returns true once the latch has fired.
    pub fn is_done(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}
