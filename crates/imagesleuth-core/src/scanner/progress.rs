/// Worker-to-coordinator messages.
///
/// Workers never touch the shared scan state. Each finished batch sends one
/// `BatchOutcome` over a crossbeam channel; the coordinator folds it into
/// the state under its lock.
use crate::model::CorruptFinding;

/// Result of one batch.
#[derive(Debug)]
pub struct BatchOutcome {
    pub index: usize,
    /// Items in the batch. Progress advances by this much whether or not
    /// the batch succeeded.
    pub len: usize,
    /// Findings, or a description of the infrastructure failure that stopped
    /// the batch (a panicking worker).
    pub result: Result<Vec<CorruptFinding>, String>,
}
