/// Scanner module: orchestrates a corrupt-image scan.
///
/// Pipeline: [`tasks`] enumerates work items, [`batch`] partitions them,
/// [`pool`] validates batches in parallel, and the [`ScanCoordinator`] folds
/// every [`progress::BatchOutcome`] into the shared [`ScanState`] before
/// handing the findings to a [`ReportWriter`].
///
/// The scan runs on its own background thread. Callers poll
/// [`ScanCoordinator::status`] for a snapshot while it runs.
pub mod batch;
pub mod pool;
pub mod progress;
pub mod tasks;

use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::model::{Batch, CorruptFinding, ScanState};
use crate::report::{ReportWriter, TsvReportWriter};
use crate::validate::ImageValidator;
use compact_str::CompactString;
use parking_lot::Mutex;
use pool::WorkerPool;
use progress::BatchOutcome;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tasks::FolderProgress;
use tracing::{debug, error, info, warn};

/// The scan state shared between the scan thread and status pollers.
///
/// The scan thread holds the lock briefly per batch. Pollers hold it only
/// long enough to clone a snapshot.
pub type SharedState = Arc<Mutex<ScanState>>;

/// A start-scan request as received from a front end.
#[derive(Debug, Clone, Default)]
pub struct ScanRequest {
    /// Directory containing the labelled subfolders.
    pub root_path: String,
    /// Newline-separated subfolder labels.
    pub folder_labels: String,
}

impl ScanRequest {
    pub fn new(root_path: impl Into<String>, folder_labels: impl Into<String>) -> Self {
        Self {
            root_path: root_path.into(),
            folder_labels: folder_labels.into(),
        }
    }

    /// Check the inputs and return the root path and parsed labels.
    ///
    /// Checks only the request itself; whether a scan is already running is
    /// decided by the coordinator.
    pub fn validate(&self) -> Result<(PathBuf, Vec<CompactString>), ScanError> {
        let root = self.root_path.trim();
        let labels_text = self.folder_labels.trim();
        if root.is_empty() || labels_text.is_empty() {
            return Err(ScanError::MissingInput);
        }

        let root = PathBuf::from(root);
        if !root.exists() {
            return Err(ScanError::RootNotFound(root));
        }

        let labels = tasks::parse_labels(labels_text);
        if labels.is_empty() {
            return Err(ScanError::NoFolderLabels);
        }
        Ok((root, labels))
    }
}

/// Owns the shared scan state and runs at most one scan at a time.
///
/// `Idle → Running → Idle`. There is no pause or cancel: a started scan runs
/// to completion.
pub struct ScanCoordinator {
    state: SharedState,
    config: ScanConfig,
    reporter: Arc<dyn ReportWriter>,
    thread: Mutex<Option<thread::JoinHandle<()>>>,
}

impl ScanCoordinator {
    /// Coordinator that writes reports with the default tab-separated writer.
    pub fn new(config: ScanConfig) -> Self {
        let reporter = Arc::new(TsvReportWriter::new(config.report_dir.clone()));
        Self::with_reporter(config, reporter)
    }

    pub fn with_reporter(config: ScanConfig, reporter: Arc<dyn ReportWriter>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ScanState::default())),
            config,
            reporter,
            thread: Mutex::new(None),
        }
    }

    /// Snapshot of the current (or last) scan.
    pub fn status(&self) -> ScanState {
        self.state.lock().clone()
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().is_running
    }

    /// Validate `request` and start a scan on a background thread.
    ///
    /// Returns as soon as the scan thread is running. Rejected requests leave
    /// the state untouched, including any scan already in progress.
    pub fn start_scan(&self, request: &ScanRequest) -> Result<(), ScanError> {
        let (root, labels) = request.validate()?;

        // Check-and-set under one lock so two concurrent starts cannot both
        // pass the running check.
        {
            let mut state = self.state.lock();
            if state.is_running {
                return Err(ScanError::AlreadyRunning);
            }
            *state = ScanState::begin(labels.len() as u64);
        }

        let job = ScanJob {
            state: Arc::clone(&self.state),
            config: self.config.clone(),
            reporter: Arc::clone(&self.reporter),
            root,
            labels,
        };

        let spawned = thread::Builder::new()
            .name("imagesleuth-scanner".into())
            .spawn(move || job.run());

        match spawned {
            Ok(handle) => {
                *self.thread.lock() = Some(handle);
                Ok(())
            }
            Err(err) => {
                let mut state = self.state.lock();
                state.is_running = false;
                state.message = format!("Could not start scan: {err}");
                Err(ScanError::Spawn(err))
            }
        }
    }

    /// Block until the current scan thread (if any) has finished.
    pub fn wait(&self) {
        let handle = self.thread.lock().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("scan thread panicked");
            }
        }
    }
}

/// Clears `is_running` if the scan thread unwinds before finishing.
///
/// Disarmed once the scan completes normally: by then a new scan may already
/// own the state and its flag must not be cleared.
struct RunningGuard {
    state: SharedState,
    armed: bool,
}

impl RunningGuard {
    fn new(state: SharedState) -> Self {
        Self { state, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        if self.armed {
            let mut state = self.state.lock();
            state.is_running = false;
            state.message = "Scan stopped unexpectedly".to_string();
        }
    }
}

/// Everything the background scan thread needs.
struct ScanJob {
    state: SharedState,
    config: ScanConfig,
    reporter: Arc<dyn ReportWriter>,
    root: PathBuf,
    labels: Vec<CompactString>,
}

impl ScanJob {
    fn run(self) {
        let mut guard = RunningGuard::new(Arc::clone(&self.state));
        let start = Instant::now();
        info!(
            "Starting scan of {} ({} folders)",
            self.root.display(),
            self.labels.len()
        );

        // ── Enumerate ───────────────────────────────────────────────────
        let enumeration = tasks::enumerate(&self.root, &self.labels, |event| {
            let mut state = self.state.lock();
            match event {
                FolderProgress::Entering(label) => state.current_folder = label.into(),
                FolderProgress::Done { label, images } => {
                    state.processed_folders += 1;
                    debug!("folder {label}: {images} images");
                }
            }
        });
        let total = enumeration.total();
        self.state.lock().total_images = total as u64;
        info!("Enumerated {total} images in {} folders", enumeration.folders);

        // ── Batch ───────────────────────────────────────────────────────
        let workers = self.config.worker_count();
        let size = batch::batch_size(
            total,
            workers,
            self.config.min_batch_size,
            self.config.batches_per_worker,
        );
        let batches = batch::make_batches(enumeration.items, size);

        // ── Validate ────────────────────────────────────────────────────
        if !batches.is_empty() {
            let seed = self.config.sample_seed;
            let samples = self.config.random_samples;
            self.validate_batches(batches, workers, start, move |batch| {
                validate_batch(batch, seed, samples)
            });
        }

        self.finish(start.elapsed(), &mut guard);
    }

    /// Run `check` over every batch on a fresh pool and fold each outcome
    /// into the shared state.
    fn validate_batches<F>(&self, batches: Vec<Batch>, workers: usize, start: Instant, check: F)
    where
        F: Fn(&Batch) -> Vec<CorruptFinding> + Send + Sync + 'static,
    {
        let pool = match WorkerPool::new(workers) {
            Ok(pool) => pool,
            Err(err) => {
                // Nothing can be validated; count everything so the run ends.
                error!("Could not build worker pool: {err}");
                let mut state = self.state.lock();
                state.processed_images = state.total_images;
                return;
            }
        };
        info!(
            "Validating {} batches across {} workers",
            batches.len(),
            pool.workers()
        );

        for outcome in pool.dispatch(batches, check) {
            self.apply(outcome, start.elapsed());
        }
    }

    fn apply(&self, outcome: BatchOutcome, elapsed: Duration) {
        let findings = match outcome.result {
            Ok(findings) => {
                debug!(
                    "batch {} done: {} items, {} corrupt",
                    outcome.index,
                    outcome.len,
                    findings.len()
                );
                findings
            }
            Err(msg) => {
                warn!("Error processing batch {}: {msg}", outcome.index);
                Vec::new()
            }
        };
        self.state
            .lock()
            .record_batch(outcome.len, findings, elapsed.as_secs_f64());
    }

    fn finish(&self, elapsed: Duration, guard: &mut RunningGuard) {
        let findings = self.state.lock().corrupt_findings.clone();
        let written = self.reporter.write_report(&findings);

        let mut state = self.state.lock();
        match written {
            Ok(path) => {
                state.message = summary(state.total_images, elapsed, findings.len(), &path);
                info!("{}", state.message);
                state.result_file = Some(path);
            }
            Err(err) => {
                error!("Report write failed: {err}");
                state.message = format!("Error saving file: {err}");
            }
        }
        state.is_running = false;
        guard.disarm();
    }
}

/// Validate every item of one batch. Runs on a pool worker.
fn validate_batch(batch: &Batch, seed: Option<u64>, random_samples: usize) -> Vec<CorruptFinding> {
    let mut validator = ImageValidator::for_batch(seed, batch.index, random_samples);
    batch
        .items
        .iter()
        .filter(|item| validator.is_corrupt(&item.path))
        .map(|item| CorruptFinding {
            folder: item.folder_label.clone(),
            image: item.file_name.clone(),
        })
        .collect()
}

/// Final status line.
fn summary(total: u64, elapsed: Duration, corrupt: usize, report: &Path) -> String {
    let secs = elapsed.as_secs_f64();
    let rate = if secs > 0.0 { total as f64 / secs } else { 0.0 };
    format!(
        "Processed {total} images in {secs:.1}s ({rate:.0} images/sec). \
         Found {corrupt} corrupt images. Results saved to: {}",
        report.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn request_requires_both_fields() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().to_string_lossy().to_string();
        assert!(matches!(
            ScanRequest::new("", "A").validate(),
            Err(ScanError::MissingInput)
        ));
        assert!(matches!(
            ScanRequest::new(root, " \n ").validate(),
            Err(ScanError::MissingInput)
        ));
    }

    #[test]
    fn request_rejects_missing_root() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope").to_string_lossy().to_string();
        assert!(matches!(
            ScanRequest::new(missing, "A").validate(),
            Err(ScanError::RootNotFound(_))
        ));
    }

    #[test]
    fn request_parses_labels() {
        let tmp = TempDir::new().unwrap();
        let root = format!("  {}  ", tmp.path().display());
        let (path, labels) = ScanRequest::new(root, "A\n\n B \nA").validate().unwrap();
        assert_eq!(path, tmp.path());
        assert_eq!(labels, vec!["A", "B"]);
    }

    #[test]
    fn summary_mentions_counts_and_path() {
        let msg = summary(
            100,
            Duration::from_secs(4),
            3,
            Path::new("/tmp/Corrupt Image.txt"),
        );
        assert_eq!(
            msg,
            "Processed 100 images in 4.0s (25 images/sec). Found 3 corrupt images. \
             Results saved to: /tmp/Corrupt Image.txt"
        );
    }

    fn job(state: &SharedState) -> ScanJob {
        ScanJob {
            state: Arc::clone(state),
            config: ScanConfig::default(),
            reporter: Arc::new(TsvReportWriter::default()),
            root: PathBuf::new(),
            labels: Vec::new(),
        }
    }

    fn batch_of(index: usize, names: &[&str]) -> Batch {
        Batch {
            index,
            items: names
                .iter()
                .map(|name| crate::model::WorkItem::new(PathBuf::from(name), "A", *name))
                .collect(),
        }
    }

    /// A batch whose check panics still advances progress and contributes
    /// no findings; the other batches are unaffected.
    #[test]
    fn failed_batch_advances_progress_without_findings() {
        let state: SharedState = Arc::new(Mutex::new(ScanState::begin(1)));
        state.lock().total_images = 5;

        let batches = vec![
            batch_of(0, &["a.png", "b.png"]),
            batch_of(1, &["c.png", "d.png", "e.png"]),
        ];
        job(&state).validate_batches(batches, 2, Instant::now(), |batch| {
            if batch.index == 1 {
                panic!("decoder exploded");
            }
            vec![CorruptFinding {
                folder: "A".into(),
                image: batch.items[0].file_name.clone(),
            }]
        });

        let state = state.lock();
        assert_eq!(state.processed_images, 5);
        assert_eq!(
            state.corrupt_findings,
            vec![CorruptFinding {
                folder: "A".into(),
                image: "a.png".into(),
            }]
        );
        assert!(state.is_running);
    }

    #[test]
    fn validate_batch_flags_only_corrupt_items() {
        use crate::model::WorkItem;

        let tmp = TempDir::new().unwrap();
        let empty = tmp.path().join("bad.png");
        fs::write(&empty, b"").unwrap();
        let good = tmp.path().join("good.png");
        image::RgbImage::from_pixel(8, 8, image::Rgb([1, 2, 3]))
            .save(&good)
            .unwrap();

        let batch = Batch {
            index: 0,
            items: vec![
                WorkItem::new(good, "A", "good.png"),
                WorkItem::new(empty, "A", "bad.png"),
            ],
        };
        let findings = validate_batch(&batch, Some(1), 3);
        assert_eq!(
            findings,
            vec![CorruptFinding {
                folder: "A".into(),
                image: "bad.png".into(),
            }]
        );
    }
}
