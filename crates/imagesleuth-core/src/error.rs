/// Typed errors surfaced by the core crate.
///
/// Per-file and per-batch failures never appear here: the scanner converts
/// them into a classification or a counted skip. Only caller-input errors,
/// report persistence failures, and structural verification failures are
/// represented as values.
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A start-scan request was rejected. The scan state is left untouched.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Please provide both folder path and folder names")]
    MissingInput,

    #[error("Main folder path does not exist: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("Please provide at least one folder name")]
    NoFolderLabels,

    #[error("Processing is already in progress")]
    AlreadyRunning,

    #[error("failed to spawn scan thread: {0}")]
    Spawn(#[source] io::Error),
}

/// The final report could not be written.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("could not determine a report directory (no home directory)")]
    NoReportDirectory,

    #[error("I/O error writing report: {0}")]
    Io(#[from] io::Error),

    #[error("could not write report row: {0}")]
    Csv(#[from] csv::Error),
}

/// A structural verification pass rejected a file.
///
/// The display text of each variant is what the verify-stage keyword
/// classifier inspects, so wording matters.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("I/O error during verification: {0}")]
    Io(#[from] io::Error),

    #[error("premature end of {format} data at offset {offset}")]
    PrematureEnd { format: &'static str, offset: usize },

    #[error("invalid {format} signature")]
    BadSignature { format: &'static str },

    #[error("invalid JPEG marker 0x{marker:02X} at offset {offset}")]
    InvalidMarker { marker: u8, offset: usize },

    #[error("JPEG scan data before frame header is invalid")]
    ScanBeforeFrame,

    #[error("incomplete JPEG: missing end-of-image marker")]
    MissingEndOfImage,

    #[error("invalid PNG chunk type {0:?}")]
    InvalidChunkType([u8; 4]),

    #[error("invalid PNG header chunk")]
    InvalidHeader,

    #[error("incomplete PNG: no image data chunk before IEND")]
    MissingImageData,

    #[error("invalid GIF block introducer 0x{introducer:02X} at offset {offset}")]
    InvalidBlock { introducer: u8, offset: usize },

    #[error("truncated bitmap: header declares {declared} bytes, file has {actual}")]
    TruncatedBitmap { declared: u64, actual: u64 },

    #[error("invalid bitmap pixel data offset {0}")]
    InvalidPixelOffset(u64),
}
