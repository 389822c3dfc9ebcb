//! # Typed Writer-Priority Lock
//!
//! RAII wrapper pairing a [`RawPriorityRwLock`] with the data it protects.
//!
//! ## Safety Note
//!
//! The data lives in an `UnsafeCell`; the raw lock's exclusion guarantees are
//! what make handing out `&T` / `&mut T` sound. Every unsafe block below
//! relies on exactly one fact: a guard exists only between a matching
//! acquire and release on `raw`.

#![allow(unsafe_code)]

use std::cell::UnsafeCell;
use std::fmt;
use std::ops::{Deref, DerefMut};

use crate::raw::RawPriorityRwLock;
use crate::state::LockSnapshot;

/// Reader/writer lock with writer priority.
///
/// Once a writer calls [`write`](Self::write), readers that call
/// [`read`](Self::read) afterwards wait until that writer (and any writer
/// queued with it) has finished, even if the current readers are still
/// inside.
///
/// ## Usage
///
/// ```rust
/// use turnstile_core::PriorityRwLock;
///
/// let lock = PriorityRwLock::new(vec![1, 2, 3]);
///
/// {
///     let a = lock.read();
///     let b = lock.read();
///     assert_eq!(a.len() + b.len(), 6);
/// }
///
/// lock.write().push(4);
/// assert_eq!(lock.into_inner(), vec![1, 2, 3, 4]);
/// ```
///
/// ## Differences from `std::sync::RwLock`
///
/// - No poisoning; a panicking holder releases normally.
/// - Guards are `Send`: a guard may be dropped on another thread, because the
///   underlying gates are not owner-bound.
/// - Not reentrant. Calling `write` while holding any guard on the same lock
///   deadlocks, and so does `read` while a writer is queued.
pub struct PriorityRwLock<T: ?Sized> {
    raw: RawPriorityRwLock,
    data: UnsafeCell<T>,
}

// SAFETY: moving the lock moves the value; nothing is shared yet.
unsafe impl<T: ?Sized + Send> Send for PriorityRwLock<T> {}
// SAFETY: writers get `&mut T` exclusively (needs `Send`), readers get
// concurrent `&T` (needs `Sync`).
unsafe impl<T: ?Sized + Send + Sync> Sync for PriorityRwLock<T> {}

impl<T> PriorityRwLock<T> {
    /// Creates an unlocked lock holding `value`.
    #[must_use]
    pub const fn new(value: T) -> Self {
        Self {
            raw: RawPriorityRwLock::new(),
            data: UnsafeCell::new(value),
        }
    }

    /// Consumes the lock and returns the data.
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

impl<T: ?Sized> PriorityRwLock<T> {
    /// Acquires shared access, blocking while any writer is active or queued.
    pub fn read(&self) -> PriorityRwLockReadGuard<'_, T> {
        self.raw.acquire_read();
        PriorityRwLockReadGuard { lock: self }
    }

    /// Acquires exclusive access, blocking until the current reader batch or
    /// writer is done.
    pub fn write(&self) -> PriorityRwLockWriteGuard<'_, T> {
        self.raw.acquire_write();
        PriorityRwLockWriteGuard { lock: self }
    }

    /// Returns a mutable reference without locking; `&mut self` proves no
    /// guard is alive.
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }

    /// Takes a diagnostic snapshot of the lock's counters.
    ///
    /// See [`RawPriorityRwLock::snapshot`]; the same waiting caveat applies.
    #[must_use]
    pub fn snapshot(&self) -> LockSnapshot {
        self.raw.snapshot()
    }

    /// Returns whether a writer is active or queued, judged by the admission
    /// gate. Never waits. Advisory only.
    ///
    /// The raw acquire/release operations are not reachable from a
    /// `PriorityRwLock`; shared or exclusive access ends only when its guard
    /// drops.
    ///
    /// ```compile_fail
    /// use turnstile_core::PriorityRwLock;
    ///
    /// let lock = PriorityRwLock::new(0_u32);
    /// let guard = lock.read();
    /// lock.raw().release_read();
    /// *lock.write() = 5;
    /// drop(guard);
    /// ```
    #[must_use]
    pub fn writer_pending(&self) -> bool {
        self.raw.writer_pending()
    }
}

impl<T: Default> Default for PriorityRwLock<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> From<T> for PriorityRwLock<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: ?Sized> fmt::Debug for PriorityRwLock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never acquire inside a formatter: the caller may hold a guard.
        f.debug_struct("PriorityRwLock")
            .field("writer_pending", &self.writer_pending())
            .finish_non_exhaustive()
    }
}

/// Shared access to the data of a [`PriorityRwLock`]. Released on drop.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct PriorityRwLockReadGuard<'a, T: ?Sized> {
    lock: &'a PriorityRwLock<T>,
}

impl<T: ?Sized> Deref for PriorityRwLockReadGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: this guard keeps the reader batch open, so no writer holds
        // the resource.
        unsafe { &*self.lock.data.get() }
    }
}

impl<T: ?Sized> Drop for PriorityRwLockReadGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.raw.release_read();
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for PriorityRwLockReadGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

/// Exclusive access to the data of a [`PriorityRwLock`]. Released on drop.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct PriorityRwLockWriteGuard<'a, T: ?Sized> {
    lock: &'a PriorityRwLock<T>,
}

impl<T: ?Sized> Deref for PriorityRwLockWriteGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: this guard holds the resource exclusively.
        unsafe { &*self.lock.data.get() }
    }
}

impl<T: ?Sized> DerefMut for PriorityRwLockWriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: this guard holds the resource exclusively, and `&mut self`
        // rules out another borrow through the same guard.
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T: ?Sized> Drop for PriorityRwLockWriteGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.raw.release_write();
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for PriorityRwLockWriteGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}
