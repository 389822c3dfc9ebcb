//! # TURNSTILE
//!
//! Torture harness for [`turnstile_core::PriorityRwLock`].
//!
//! ## Design Principles
//!
//! 1. **Check from inside** - every critical section verifies who else is in
//! 2. **Deterministic mix** - the read/write sequence of worker `i` depends
//!    only on `seed + i`
//! 3. **External configuration** - run shape comes from a TOML file, flags
//!    override it
//!
//! ## Example
//!
//! ```rust,no_run
//! use turnstile::{torture, TortureConfig};
//!
//! let config = TortureConfig::load("torture.toml")?;
//! let report = torture::run(&config)?;
//! println!("{} reads, {} writes", report.reads, report.writes);
//! # Ok::<(), turnstile::TortureError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod torture;

pub use config::TortureConfig;
pub use error::{TortureError, TortureResult};
pub use torture::{TortureReport, WorkerReport};
pub use turnstile_core::{PriorityRwLock, RawPriorityRwLock};
