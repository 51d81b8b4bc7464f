/// Batching: partitions work items into fixed-size chunks for the pool.
///
/// One task per file would spend more time scheduling than validating small
/// images. One task per worker would leave cores idle whenever a worker draws
/// a run of large files. The batch size sits between the two: roughly
/// `batches_per_worker` batches per worker, but never fewer than
/// `min_batch_size` items each.
use crate::model::{Batch, WorkItem};

/// `max(min_batch_size, items / (workers × batches_per_worker))`, never zero.
pub fn batch_size(
    items: usize,
    workers: usize,
    min_batch_size: usize,
    batches_per_worker: usize,
) -> usize {
    let slots = workers.saturating_mul(batches_per_worker).max(1);
    (items / slots).max(min_batch_size).max(1)
}

/// Slice `items` in order into consecutive batches of `size` (the last may
/// be smaller).
pub fn make_batches(items: Vec<WorkItem>, size: usize) -> Vec<Batch> {
    let size = size.max(1);
    let mut batches = Vec::with_capacity(items.len().div_ceil(size));
    let mut iter = items.into_iter().peekable();
    while iter.peek().is_some() {
        let chunk: Vec<WorkItem> = iter.by_ref().take(size).collect();
        batches.push(Batch {
            index: batches.len(),
            items: chunk,
        });
    }
    batches
}
