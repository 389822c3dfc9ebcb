//! # Lock State Snapshots
//!
//! Diagnostic view of a [`RawPriorityRwLock`](crate::RawPriorityRwLock).
//!
//! ```text
//!            acquire_write                 first acquire_read
//!   ┌──────┐ ─────────────► ┌─────────┐   ┌──────┐ ────────────► ┌─────────┐
//!   │ Idle │                │ Writing │   │ Idle │               │ Reading │
//!   └──────┘ ◄───────────── └─────────┘   └──────┘ ◄──────────── └─────────┘
//!            last release_write                  last release_read
//! ```
//!
//! There is no direct `Reading → Writing` edge. A writer arriving during
//! `Reading` is already counted (and has closed the admission gate) but only
//! owns the resource once the last reader of the batch leaves.

/// Coarse phase of a lock, derived from its counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LockPhase {
    /// No writers, no readers.
    Idle,
    /// No writers, at least one reader inside.
    Reading,
    /// At least one writer active or queued.
    Writing,
}

/// Point-in-time copy of a lock's bookkeeping.
///
/// Stale as soon as it is returned; use it for assertions in tests and for
/// logging, never for synchronization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LockSnapshot {
    /// Writers that have entered `acquire_write` and not yet left `release_write`.
    pub writers: usize,
    /// Readers currently counted in the batch.
    pub readers: usize,
    /// Whether new readers are currently held at the admission gate.
    pub admission_closed: bool,
}

impl LockSnapshot {
    /// Returns the state-machine phase implied by the counters.
    #[must_use]
    pub const fn phase(&self) -> LockPhase {
        if self.writers > 0 {
            LockPhase::Writing
        } else if self.readers > 0 {
            LockPhase::Reading
        } else {
            LockPhase::Idle
        }
    }

    /// Returns whether the writer count is nonzero (active or waiting).
    #[inline]
    #[must_use]
    pub const fn has_writers(&self) -> bool {
        self.writers > 0
    }
}
