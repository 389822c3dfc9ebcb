//! # Lock Torture Run
//!
//! Hammers a [`PriorityRwLock`] from many threads and checks, from inside
//! every critical section, that the lock actually excludes.
//!
//! ```text
//!   worker 0 ─┐                            ┌─ Occupancy { readers, writers }
//!   worker 1 ─┼─► PriorityRwLock<Ledger> ──┤   checked inside each section
//!   worker N ─┘                            └─ Ledger { writes, checksum }
//!        │
//!        └──► crossbeam channel ──► WorkerReport ──► TortureReport
//! ```
//!
//! Occupancy counters live outside the lock. They are bumped after acquiring
//! and dropped before releasing, so any overlap the lock lets through shows
//! up as a writer seeing company.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::unbounded;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use turnstile_core::PriorityRwLock;

use crate::config::TortureConfig;
use crate::error::{TortureError, TortureResult};

/// State the lock protects during a run.
#[derive(Debug, Default)]
struct Ledger {
    /// Bumped by every writer.
    writes: u64,
    /// Checksum of writer ids, read back by readers.
    checksum: u64,
}

/// Who is inside a critical section right now.
#[derive(Debug, Default)]
struct Occupancy {
    readers: AtomicUsize,
    writers: AtomicUsize,
    max_readers: AtomicUsize,
    violations: AtomicU64,
}

impl Occupancy {
    fn enter_write(&self) {
        let writers_before = self.writers.fetch_add(1, Ordering::SeqCst);
        let readers = self.readers.load(Ordering::SeqCst);
        if writers_before != 0 || readers != 0 {
            self.violations.fetch_add(1, Ordering::Relaxed);
            tracing::error!(writers_before, readers, "writer entered an occupied section");
        }
    }

    fn leave_write(&self) {
        self.writers.fetch_sub(1, Ordering::SeqCst);
    }

    fn enter_read(&self) {
        let readers = self.readers.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_readers.fetch_max(readers, Ordering::Relaxed);
        let writers = self.writers.load(Ordering::SeqCst);
        if writers != 0 {
            self.violations.fetch_add(1, Ordering::Relaxed);
            tracing::error!(writers, readers, "reader entered alongside a writer");
        }
    }

    fn leave_read(&self) {
        self.readers.fetch_sub(1, Ordering::SeqCst);
    }

    /// Turns any recorded overlap into an error.
    fn verdict(&self) -> TortureResult<()> {
        match self.violations.load(Ordering::Acquire) {
            0 => Ok(()),
            count => Err(TortureError::MutualExclusionViolated { count }),
        }
    }
}

/// What a single worker did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkerReport {
    /// Worker index.
    pub worker: usize,
    /// Read sections completed.
    pub reads: u64,
    /// Write sections completed.
    pub writes: u64,
}

/// Outcome of a run that upheld every invariant.
///
/// Carries no violation count: a run that saw any overlap returns
/// [`TortureError::MutualExclusionViolated`] instead of a report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TortureReport {
    /// Read sections completed across all workers.
    pub reads: u64,
    /// Write sections completed across all workers.
    pub writes: u64,
    /// Highest number of readers seen inside at once.
    pub max_concurrent_readers: usize,
    /// Per-worker breakdown, ordered by worker index.
    pub workers: Vec<WorkerReport>,
    /// Wall-clock time of the run.
    pub elapsed: Duration,
}

impl TortureReport {
    /// Lock acquisitions per second.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn ops_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        (self.reads + self.writes) as f64 / secs
    }
}

/// Runs one torture pass as described by `config`.
///
/// # Errors
///
/// Returns `TortureError::InvalidConfig` for a bad config,
/// `TortureError::WorkerPanicked` if a worker dies,
/// `TortureError::MutualExclusionViolated` if any section saw an overlap and
/// `TortureError::LedgerMismatch` if writes were lost.
pub fn run(config: &TortureConfig) -> TortureResult<TortureReport> {
    config.validate()?;
    tracing::info!(
        threads = config.threads,
        write_percent = config.write_percent,
        operations = config.total_operations(),
        "torture run starting"
    );

    let lock = Arc::new(PriorityRwLock::new(Ledger::default()));
    let occupancy = Arc::new(Occupancy::default());
    let (tx, rx) = unbounded();
    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|worker| {
            let lock = Arc::clone(&lock);
            let occupancy = Arc::clone(&occupancy);
            let tx = tx.clone();
            let config = config.clone();
            thread::spawn(move || {
                let report = work(worker, &config, &lock, &occupancy);
                tracing::debug!(worker, reads = report.reads, writes = report.writes, "worker finished");
                // Receiver outlives every worker.
                let _ = tx.send(report);
            })
        })
        .collect();
    drop(tx);

    let mut panicked = None;
    for (worker, handle) in handles.into_iter().enumerate() {
        if handle.join().is_err() && panicked.is_none() {
            panicked = Some(worker);
        }
    }
    let elapsed = start.elapsed();
    if let Some(worker) = panicked {
        return Err(TortureError::WorkerPanicked(worker));
    }

    let mut workers: Vec<WorkerReport> = rx.iter().collect();
    workers.sort_by_key(|r| r.worker);
    let reads: u64 = workers.iter().map(|r| r.reads).sum();
    let writes: u64 = workers.iter().map(|r| r.writes).sum();

    occupancy.verdict()?;

    let recorded = lock.read().writes;
    if recorded != writes {
        return Err(TortureError::LedgerMismatch { reported: writes, recorded });
    }

    let report = TortureReport {
        reads,
        writes,
        max_concurrent_readers: occupancy.max_readers.load(Ordering::Acquire),
        workers,
        elapsed,
    };
    tracing::info!(
        reads = report.reads,
        writes = report.writes,
        max_readers = report.max_concurrent_readers,
        elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        "torture run passed"
    );
    Ok(report)
}

/// Body of one worker thread.
fn work(
    worker: usize,
    config: &TortureConfig,
    lock: &PriorityRwLock<Ledger>,
    occupancy: &Occupancy,
) -> WorkerReport {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed.wrapping_add(worker as u64));
    let hold = Duration::from_micros(config.hold_micros);
    let mut report = WorkerReport { worker, reads: 0, writes: 0 };

    for _ in 0..config.operations_per_thread {
        if rng.gen_range(0..100_u8) < config.write_percent {
            let mut ledger = lock.write();
            occupancy.enter_write();
            ledger.writes += 1;
            ledger.checksum = ledger.checksum.wrapping_add(worker as u64 + 1);
            pause(hold);
            occupancy.leave_write();
            report.writes += 1;
        } else {
            let ledger = lock.read();
            occupancy.enter_read();
            // Checksum can only be zero before the first write.
            debug_assert!(ledger.writes == 0 || ledger.checksum != 0);
            pause(hold);
            occupancy.leave_read();
            report.reads += 1;
        }
    }

    report
}

fn pause(hold: Duration) {
    if hold.is_zero() {
        thread::yield_now();
    } else {
        thread::sleep(hold);
    }
}
