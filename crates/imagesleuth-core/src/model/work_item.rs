/// A single file slated for corruption evaluation, and the batches that
/// carry work items to the pool.
use compact_str::CompactString;
use std::path::PathBuf;

/// One image file, tagged with the folder label it was found under.
///
/// Immutable once created. The label and file name are what appear in the
/// report; `path` is only used to open the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// Full path to the file on disk.
    pub path: PathBuf,
    /// Folder label exactly as the operator entered it (trimmed).
    pub folder_label: CompactString,
    /// File name only, without the folder.
    pub file_name: CompactString,
}

impl WorkItem {
    pub fn new(
        path: PathBuf,
        folder_label: impl Into<CompactString>,
        file_name: impl Into<CompactString>,
    ) -> Self {
        Self {
            path,
            folder_label: folder_label.into(),
            file_name: file_name.into(),
        }
    }
}

/// An ordered run of work items dispatched to a worker as one unit.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    /// Position of this batch in dispatch order. Used to derive a
    /// per-batch sampling seed.
    pub index: usize,
    pub items: Vec<WorkItem>,
}
