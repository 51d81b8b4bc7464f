/// Worker pool: a fixed-size rayon pool that validates batches.
///
/// Built once per scan and dropped when every batch has reported back.
/// Holds no state between scans.
///
/// Every batch produces exactly one [`BatchOutcome`], even if the work
/// function panics: the panic is caught and reported as an infrastructure
/// failure so the coordinator's progress counters cannot stall.
use crate::model::{Batch, CorruptFinding};
use crate::scanner::progress::BatchOutcome;
use crossbeam_channel::Receiver;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

pub struct WorkerPool {
    pool: ThreadPool,
}

impl WorkerPool {
    /// Start `workers` threads (at least one).
    pub fn new(workers: usize) -> Result<Self, ThreadPoolBuildError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("imagesleuth-worker-{i}"))
            .build()?;
        Ok(Self { pool })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Queue every batch and return a receiver yielding one outcome per
    /// batch, in completion order. The receiver disconnects once all
    /// outcomes have been sent.
    pub fn dispatch<F>(&self, batches: Vec<Batch>, work: F) -> Receiver<BatchOutcome>
    where
        F: Fn(&Batch) -> Vec<CorruptFinding> + Send + Sync + 'static,
    {
        // Capacity covers every outcome, so workers never block on send.
        let (tx, rx) = crossbeam_channel::bounded(batches.len().max(1));
        let work = Arc::new(work);

        for batch in batches {
            let tx = tx.clone();
            let work = Arc::clone(&work);
            self.pool.spawn(move || {
                let result =
                    panic::catch_unwind(AssertUnwindSafe(|| work(&batch))).map_err(panic_message);
                let _ = tx.send(BatchOutcome {
                    index: batch.index,
                    len: batch.items.len(),
                    result,
                });
            });
        }

        rx
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
