//! # Gate
//!
//! A binary blocking lock that is not bound to the thread that closed it.
//!
//! `std::sync::Mutex` and `parking_lot::Mutex` tie an acquisition to a guard
//! living on the acquiring thread. The reader batch protocol needs more than
//! that: the first reader of a batch closes the exclusion gate and the last
//! reader, usually a different thread, opens it again. A `Gate` is just the
//! open/closed bit behind a `parking_lot` mutex plus a condition variable, so
//! any thread may open what another thread closed.
//!
//! ```text
//!   close()  : wait until open, then mark closed
//!   open()   : mark open, wake waiters
//!   pass()   : wait until open, leave it open   (probe without hold)
//! ```

use parking_lot::{Condvar, Mutex};

/// Binary blocking lock without owner affinity.
#[derive(Debug, Default)]
pub struct Gate {
    /// `true` while some party holds the gate.
    closed: Mutex<bool>,
    /// Signalled whenever the gate opens.
    opened: Condvar,
}

impl Gate {
    /// Creates an open gate.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            closed: Mutex::new(false),
            opened: Condvar::new(),
        }
    }

    /// Blocks until the gate is open, then closes it.
    ///
    /// The caller becomes the holder and must eventually call [`Gate::open`]
    /// (or hand that duty to another thread).
    pub fn close(&self) {
        let mut closed = self.closed.lock();
        while *closed {
            self.opened.wait(&mut closed);
        }
        *closed = true;
    }

    /// Opens the gate and wakes every thread waiting on it.
    ///
    /// # Panics
    ///
    /// Panics if the gate is already open: that is an unmatched release.
    pub fn open(&self) {
        let mut closed = self.closed.lock();
        assert!(*closed, "gate opened while already open (unmatched release)");
        *closed = false;
        drop(closed);
        // Both closers and probers wait on the same condvar.
        self.opened.notify_all();
    }

    /// Blocks until the gate is open and returns without holding it.
    ///
    /// Equivalent to `close()` immediately followed by `open()`, minus the
    /// wake-up traffic: the caller synchronizes with whoever last opened the
    /// gate but never becomes a holder, so concurrent probers never contend
    /// with one another.
    pub fn pass(&self) {
        let mut closed = self.closed.lock();
        while *closed {
            self.opened.wait(&mut closed);
        }
    }

    /// Returns whether the gate is currently held. Advisory only.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        *self.closed.lock()
    }
}
