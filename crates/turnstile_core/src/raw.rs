//! # Raw Writer-Priority Lock
//!
//! The four-operation primitive with no data attached.
//!
//! ## Layout
//!
//! ```text
//!   ┌──────────────────────── RawPriorityRwLock ─────────────────────────┐
//!   │                                                                    │
//!   │  writers: Mutex<usize>  ──0→1 closes──►  admission: Gate           │
//!   │                         ◄─1→0 opens───   (readers probe only)      │
//!   │                                                                    │
//!   │  readers: Mutex<usize>  ──0→1 closes──►  resource: Gate            │
//!   │                         ◄─1→0 opens───   (writers close directly)  │
//!   └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A writer is counted before it waits for `resource`, so the moment it
//! arrives the admission gate shuts and every reader that shows up later
//! stalls at the probe. Readers already counted finish as a batch; the last of
//! them opens `resource` and the writer gets in.
//!
//! ## Misuse
//!
//! Releasing without a matching acquire panics. Acquiring write twice on one
//! thread deadlocks; the lock is not reentrant.

use parking_lot::Mutex;

use crate::gate::Gate;
use crate::state::LockSnapshot;

/// Reader/writer lock in which a waiting writer blocks newly arriving readers.
///
/// Use through [`PriorityRwLock`](crate::PriorityRwLock) unless the acquire
/// and release points cannot be expressed as a guard's lifetime.
#[derive(Debug, Default)]
pub struct RawPriorityRwLock {
    /// Exclusive ownership of the protected resource: one writer, or the
    /// reader batch as a whole.
    resource: Gate,
    /// Closed while any writer is active or queued.
    admission: Gate,
    /// Active plus queued writers.
    writers: Mutex<usize>,
    /// Readers in the current batch.
    readers: Mutex<usize>,
}

impl RawPriorityRwLock {
    /// Creates an unlocked instance.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            resource: Gate::new(),
            admission: Gate::new(),
            writers: Mutex::new(0),
            readers: Mutex::new(0),
        }
    }

    /// Blocks until the caller has exclusive access.
    ///
    /// From the moment this call is entered, readers that arrive afterwards
    /// wait until every writer is done.
    pub fn acquire_write(&self) {
        {
            let mut writers = self.writers.lock();
            *writers += 1;
            if *writers == 1 {
                // Only a reader mid-probe can hold this up, and only briefly.
                self.admission.close();
                tracing::trace!(target: "turnstile::lock", "admission closed");
            }
        }

        self.resource.close();
    }

    /// Gives up exclusive access.
    ///
    /// # Panics
    ///
    /// Panics if no writer is registered.
    pub fn release_write(&self) {
        self.resource.open();

        let mut writers = self.writers.lock();
        assert!(*writers > 0, "release_write without matching acquire_write");
        *writers -= 1;
        if *writers == 0 {
            self.admission.open();
            tracing::trace!(target: "turnstile::lock", "admission reopened");
        }
    }

    /// Blocks until the caller has shared access.
    ///
    /// Waits at the admission gate while any writer is registered, then joins
    /// the current reader batch. The first reader of a batch waits for the
    /// resource on behalf of everyone queued behind it on the reader count.
    pub fn acquire_read(&self) {
        self.admission.pass();

        let mut readers = self.readers.lock();
        *readers += 1;
        if *readers == 1 {
            // Held across the wait: later readers must not slip past the
            // batch leader while a writer still owns the resource.
            self.resource.close();
            tracing::trace!(target: "turnstile::lock", "reader batch opened");
        }
    }

    /// Gives up shared access. The last reader out releases the resource.
    ///
    /// # Panics
    ///
    /// Panics if no reader is registered.
    pub fn release_read(&self) {
        let mut readers = self.readers.lock();
        assert!(*readers > 0, "release_read without matching acquire_read");
        *readers -= 1;
        if *readers == 0 {
            self.resource.open();
            tracing::trace!(target: "turnstile::lock", "reader batch closed");
        }
    }

    /// Returns whether a writer is active or queued, judged by the admission
    /// gate. Never waits on the counters. Advisory only.
    #[must_use]
    pub fn writer_pending(&self) -> bool {
        self.admission.is_closed()
    }

    /// Takes a diagnostic snapshot of the counters.
    ///
    /// Locks each counter in turn. It may wait while the leader of a reader
    /// batch is blocked on a writer, since the leader keeps the reader count
    /// locked for that wait.
    #[must_use]
    pub fn snapshot(&self) -> LockSnapshot {
        let writers = *self.writers.lock();
        let readers = *self.readers.lock();
        LockSnapshot {
            writers,
            readers,
            admission_closed: self.admission.is_closed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::LockPhase;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_new_lock_is_idle() {
        let lock = RawPriorityRwLock::new();
        let snap = lock.snapshot();
        assert_eq!(snap.phase(), LockPhase::Idle);
        assert!(!snap.admission_closed);
    }

    #[test]
    fn test_write_cycle_restores_idle() {
        let lock = RawPriorityRwLock::new();

        lock.acquire_write();
        let snap = lock.snapshot();
        assert_eq!(snap.phase(), LockPhase::Writing);
        assert!(snap.admission_closed);

        lock.release_write();
        assert_eq!(lock.snapshot().phase(), LockPhase::Idle);
        assert!(!lock.snapshot().admission_closed);
    }

    #[test]
    fn test_readers_share_one_batch() {
        let lock = RawPriorityRwLock::new();

        lock.acquire_read();
        lock.acquire_read();
        assert_eq!(lock.snapshot().readers, 2);
        assert_eq!(lock.snapshot().phase(), LockPhase::Reading);

        lock.release_read();
        assert_eq!(lock.snapshot().phase(), LockPhase::Reading);
        lock.release_read();
        assert_eq!(lock.snapshot().phase(), LockPhase::Idle);

        // The batch handed the resource back.
        lock.acquire_write();
        lock.release_write();
    }

    #[test]
    fn test_batch_released_by_other_thread() {
        let lock = Arc::new(RawPriorityRwLock::new());
        // First in: this thread closes the resource.
        lock.acquire_read();

        let (joined_tx, joined_rx) = std::sync::mpsc::channel();
        let (leave_tx, leave_rx) = std::sync::mpsc::channel::<()>();
        let other = {
            let lock = Arc::clone(&lock);
            thread::spawn(move || {
                lock.acquire_read();
                joined_tx.send(()).unwrap();
                leave_rx.recv().unwrap();
                // Last out: this thread opens it.
                lock.release_read();
            })
        };

        joined_rx.recv().unwrap();
        lock.release_read();
        assert_eq!(lock.snapshot().phase(), LockPhase::Reading);

        leave_tx.send(()).unwrap();
        other.join().unwrap();
        assert_eq!(lock.snapshot().phase(), LockPhase::Idle);

        lock.acquire_write();
        lock.release_write();
    }

    #[test]
    fn test_writer_waits_for_batch_and_closes_admission() {
        let lock = Arc::new(RawPriorityRwLock::new());
        lock.acquire_read();

        let entered = Arc::new(AtomicBool::new(false));
        let writer = {
            let lock = Arc::clone(&lock);
            let entered = Arc::clone(&entered);
            thread::spawn(move || {
                lock.acquire_write();
                entered.store(true, Ordering::Release);
                lock.release_write();
            })
        };

        while !lock.snapshot().has_writers() {
            thread::yield_now();
        }
        let snap = lock.snapshot();
        assert!(snap.admission_closed);
        assert_eq!(snap.readers, 1);

        thread::sleep(Duration::from_millis(50));
        assert!(!entered.load(Ordering::Acquire));

        lock.release_read();
        writer.join().unwrap();
        assert!(entered.load(Ordering::Acquire));
        assert_eq!(lock.snapshot().phase(), LockPhase::Idle);
    }

    #[test]
    fn test_writers_serialize() {
        let lock = Arc::new(RawPriorityRwLock::new());
        let inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let lock = Arc::clone(&lock);
                let inside = Arc::clone(&inside);
                thread::spawn(move || {
                    for _ in 0..200 {
                        lock.acquire_write();
                        assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                        inside.fetch_sub(1, Ordering::SeqCst);
                        lock.release_write();
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(lock.snapshot().phase(), LockPhase::Idle);
    }

    #[test]
    #[should_panic(expected = "release_read without matching acquire_read")]
    fn test_unmatched_release_read_panics() {
        let lock = RawPriorityRwLock::new();
        lock.release_read();
    }

    #[test]
    #[should_panic(expected = "unmatched release")]
    fn test_unmatched_release_write_panics() {
        let lock = RawPriorityRwLock::new();
        lock.release_write();
    }
}
