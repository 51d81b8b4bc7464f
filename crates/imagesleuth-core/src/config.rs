/// Scan tunables: worker count, batch sizing, pixel sampling, report location.
///
/// Every field has a production default; front ends override only what the
/// operator asks for.
use std::path::PathBuf;

/// Workers started per logical core.
///
/// Validation alternates between blocking reads and CPU-bound decode, so the
/// pool is oversubscribed to keep cores busy while some workers wait on I/O.
pub const DEFAULT_WORKERS_PER_CORE: usize = 2;

/// Upper bound on the worker pool, regardless of core count.
pub const DEFAULT_MAX_WORKERS: usize = 16;

/// Smallest batch handed to a worker.
pub const DEFAULT_MIN_BATCH_SIZE: usize = 10;

/// Target number of batches in flight per worker.
///
/// Four batches per worker keeps enough work queued to rebalance when one
/// worker lands a run of very large files.
pub const DEFAULT_BATCHES_PER_WORKER: usize = 4;

/// Random pixel probes taken per image, on top of the four corners and centre.
pub const DEFAULT_RANDOM_SAMPLES: usize = 3;

/// Configuration for a [`crate::scanner::ScanCoordinator`].
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Explicit worker count. `None` derives it from the core count.
    pub workers: Option<usize>,
    pub workers_per_core: usize,
    pub max_workers: usize,
    pub min_batch_size: usize,
    pub batches_per_worker: usize,
    pub random_samples: usize,
    /// Fixed seed for the random pixel probes. Batch `i` uses `seed + i`.
    /// `None` seeds every batch from the OS.
    pub sample_seed: Option<u64>,
    /// Directory the report is written into. `None` uses
    /// [`crate::report::default_report_dir`].
    pub report_dir: Option<PathBuf>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            workers: None,
            workers_per_core: DEFAULT_WORKERS_PER_CORE,
            max_workers: DEFAULT_MAX_WORKERS,
            min_batch_size: DEFAULT_MIN_BATCH_SIZE,
            batches_per_worker: DEFAULT_BATCHES_PER_WORKER,
            random_samples: DEFAULT_RANDOM_SAMPLES,
            sample_seed: None,
            report_dir: None,
        }
    }
}

impl ScanConfig {
    /// Number of pool workers: `min(workers_per_core × cores, max_workers)`,
    /// or the explicit override. Never zero.
    pub fn worker_count(&self) -> usize {
        let derived = self
            .workers
            .unwrap_or_else(|| (self.workers_per_core * num_cpus::get()).min(self.max_workers));
        derived.max(1)
    }
}
