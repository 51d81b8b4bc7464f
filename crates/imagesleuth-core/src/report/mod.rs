/// Report persistence: writes the final corrupt-file list to disk.
///
/// The default writer produces a tab-separated text file with a
/// `Folder\tImages` header and one row per finding, in a `Corrupt Image`
/// folder on the user's desktop. Existing reports are never overwritten:
/// `Corrupt Image.txt`, then `Corrupt Image 2.txt`, `Corrupt Image 3.txt`, …
use crate::error::ReportError;
use crate::model::CorruptFinding;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Folder created on the desktop to hold reports.
pub const REPORT_DIR_NAME: &str = "Corrupt Image";
/// Report file stem, before any collision suffix.
pub const REPORT_BASE_NAME: &str = "Corrupt Image";
pub const REPORT_EXTENSION: &str = "txt";
const HEADER: [&str; 2] = ["Folder", "Images"];

/// Persists a finished scan's findings. Returns where they were written.
pub trait ReportWriter: Send + Sync {
    fn write_report(&self, findings: &[CorruptFinding]) -> Result<PathBuf, ReportError>;
}

/// `<home>/Desktop/Corrupt Image`, if a home directory is known.
pub fn default_report_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join("Desktop").join(REPORT_DIR_NAME))
}

/// First path in `dir` named `<base>.<ext>` or `<base> N.<ext>` (N ≥ 2)
/// that does not exist yet.
pub fn unique_report_path(dir: &Path, base: &str, ext: &str) -> PathBuf {
    let first = dir.join(format!("{base}.{ext}"));
    if !first.exists() {
        return first;
    }
    (2u64..)
        .map(|n| dir.join(format!("{base} {n}.{ext}")))
        .find(|candidate| !candidate.exists())
        .unwrap_or(first)
}

/// Write `findings` as tab-separated rows under a `Folder\tImages` header.
pub fn write_tsv(path: &Path, findings: &[CorruptFinding]) -> Result<(), ReportError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(csv::QuoteStyle::Never)
        .has_headers(false)
        .from_path(path)?;
    writer.write_record(HEADER)?;
    for finding in findings {
        writer.write_record([finding.folder.as_str(), finding.image.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

/// The default tab-separated report writer.
#[derive(Debug, Clone, Default)]
pub struct TsvReportWriter {
    dir: Option<PathBuf>,
}

impl TsvReportWriter {
    /// Writer targeting `dir`, or [`default_report_dir`] when `None`.
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }
}

impl ReportWriter for TsvReportWriter {
    fn write_report(&self, findings: &[CorruptFinding]) -> Result<PathBuf, ReportError> {
        let dir = self
            .dir
            .clone()
            .or_else(default_report_dir)
            .ok_or(ReportError::NoReportDirectory)?;
        fs::create_dir_all(&dir)?;

        let path = unique_report_path(&dir, REPORT_BASE_NAME, REPORT_EXTENSION);
        write_tsv(&path, findings)?;
        debug!("wrote {} findings to {}", findings.len(), path.display());
        Ok(path)
    }
}
