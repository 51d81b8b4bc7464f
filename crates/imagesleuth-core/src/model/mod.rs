/// Data model for ImageSleuth scans.
///
/// Re-exports the work-unit types and the shared scan state.
pub mod state;
pub mod work_item;

pub use state::{CorruptFinding, ScanState};
pub use work_item::{Batch, WorkItem};
