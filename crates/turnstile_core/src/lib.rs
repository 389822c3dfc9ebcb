//! # TURNSTILE Core
//!
//! Reader/writer lock with writer priority, composed from plain blocking
//! mutexes.
//!
//! - Many readers may hold the lock at once
//! - A writer holds it alone
//! - Once a writer arrives, readers that arrive after it wait until it is done
//!
//! ## Architecture Rules
//!
//! 1. **Two gates, two counters** - an exclusion gate owned by one writer or
//!    one reader batch, an admission gate closed while any writer is pending
//! 2. **First in, last out** - only the 0→1 and 1→0 transitions of a counter
//!    touch a gate
//! 3. **Instance state only** - no globals; independent locks never interact
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::thread;
//! use turnstile_core::PriorityRwLock;
//!
//! let config = Arc::new(PriorityRwLock::new(String::from("v1")));
//!
//! let writer = {
//!     let config = Arc::clone(&config);
//!     thread::spawn(move || *config.write() = String::from("v2"))
//! };
//! writer.join().unwrap();
//!
//! assert_eq!(*config.read(), "v2");
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod gate;
pub mod lock;
pub mod raw;
pub mod state;

pub use gate::Gate;
pub use lock::{PriorityRwLock, PriorityRwLockReadGuard, PriorityRwLockWriteGuard};
pub use raw::RawPriorityRwLock;
pub use state::{LockPhase, LockSnapshot};
