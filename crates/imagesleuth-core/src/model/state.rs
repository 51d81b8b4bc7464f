/// The shared scan state: the job record status pollers read.
///
/// Only the scan coordinator mutates a `ScanState`, always under its lock.
/// Pollers receive a cloned snapshot, never a reference into the live value.
use chrono::{DateTime, Local};
use compact_str::CompactString;
use serde::Serialize;
use std::path::PathBuf;

/// A file classified as corrupt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CorruptFinding {
    pub folder: CompactString,
    pub image: CompactString,
}

/// Progress and results of the current (or most recent) scan.
///
/// Created all-zero at process start. Reset at the start of every scan and
/// kept after completion so the final figures remain queryable.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanState {
    pub is_running: bool,
    /// Folder label currently being enumerated.
    pub current_folder: CompactString,
    pub total_folders: u64,
    pub processed_folders: u64,
    /// Fixed once enumeration finishes; never revised during the run.
    pub total_images: u64,
    /// Monotonically non-decreasing, never above `total_images`.
    pub processed_images: u64,
    /// Append-only during a run. Entry order is not meaningful.
    pub corrupt_findings: Vec<CorruptFinding>,
    pub started_at: Option<DateTime<Local>>,
    /// Images per second, recomputed on every batch completion.
    pub throughput: f64,
    /// Final human-readable summary, written once at completion.
    pub message: String,
    /// Report file path, once written.
    pub result_file: Option<PathBuf>,
}

impl ScanState {
    /// Fresh running state for a new scan.
    pub fn begin(total_folders: u64) -> Self {
        Self {
            is_running: true,
            total_folders,
            started_at: Some(Local::now()),
            ..Self::default()
        }
    }

    /// Fold one completed batch into the aggregate counters.
    ///
    /// `processed_images` is clamped to `total_images` so a batch reported
    /// twice can never push progress past 100%.
    pub fn record_batch(
        &mut self,
        batch_len: usize,
        findings: Vec<CorruptFinding>,
        elapsed_secs: f64,
    ) {
        self.corrupt_findings.extend(findings);
        self.processed_images = (self.processed_images + batch_len as u64).min(self.total_images);
        if elapsed_secs > 0.0 {
            self.throughput = self.processed_images as f64 / elapsed_secs;
        }
    }

    /// Completion as a fraction in `0.0..=1.0`.
    pub fn fraction_done(&self) -> f64 {
        if self.total_images == 0 {
            return if self.is_running { 0.0 } else { 1.0 };
        }
        self.processed_images as f64 / self.total_images as f64
    }

    /// Serialise the snapshot for a status endpoint.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(folder: &str, image: &str) -> CorruptFinding {
        CorruptFinding {
            folder: folder.into(),
            image: image.into(),
        }
    }

    #[test]
    fn default_state_is_idle_and_empty() {
        let state = ScanState::default();
        assert!(!state.is_running);
        assert_eq!(state.total_images, 0);
        assert!(state.corrupt_findings.is_empty());
        assert!(state.started_at.is_none());
    }

    #[test]
    fn begin_marks_running_with_folder_total() {
        let state = ScanState::begin(4);
        assert!(state.is_running);
        assert_eq!(state.total_folders, 4);
        assert_eq!(state.processed_folders, 0);
        assert!(state.started_at.is_some());
    }

    #[test]
    fn record_batch_accumulates_and_recomputes_throughput() {
        let mut state = ScanState::begin(1);
        state.total_images = 30;

        state.record_batch(10, vec![finding("A", "x.png")], 2.0);
        assert_eq!(state.processed_images, 10);
        assert!((state.throughput - 5.0).abs() < f64::EPSILON);

        state.record_batch(20, Vec::new(), 3.0);
        assert_eq!(state.processed_images, 30);
        assert!((state.throughput - 10.0).abs() < f64::EPSILON);
        assert_eq!(state.corrupt_findings, vec![finding("A", "x.png")]);
    }

    #[test]
    fn processed_never_exceeds_total() {
        let mut state = ScanState::begin(1);
        state.total_images = 5;
        state.record_batch(4, Vec::new(), 1.0);
        state.record_batch(4, Vec::new(), 1.0);
        assert_eq!(state.processed_images, 5);
    }

    /// Zero elapsed time must not divide by zero.
    #[test]
    fn zero_elapsed_keeps_previous_throughput() {
        let mut state = ScanState::begin(1);
        state.total_images = 10;
        state.record_batch(10, Vec::new(), 0.0);
        assert_eq!(state.throughput, 0.0);
    }

    #[test]
    fn json_uses_camel_case_fields() {
        let mut state = ScanState::begin(2);
        state.corrupt_findings.push(finding("A", "bad.png"));
        let json = state.to_json().unwrap();
        assert!(json.contains("\"isRunning\":true"));
        assert!(json.contains("\"totalFolders\":2"));
        assert!(json.contains("\"corruptFindings\":[{\"folder\":\"A\",\"image\":\"bad.png\"}]"));
    }
}
