/// Task enumeration: turns folder labels into a flat list of work items.
///
/// Each label names a direct subfolder of the scan root. Only the immediate
/// entries of that subfolder are listed (no recursion). A missing folder
/// contributes zero items and is still counted as processed; a folder that
/// cannot be listed is logged and also contributes zero items.
use crate::model::WorkItem;
use compact_str::CompactString;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

/// Folder-level progress reported while enumerating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderProgress<'a> {
    /// About to list this folder.
    Entering(&'a str),
    /// Finished with this folder (listed, missing, or unreadable).
    Done { label: &'a str, images: usize },
}

/// Result of enumerating every requested folder.
#[derive(Debug, Default)]
pub struct Enumeration {
    pub items: Vec<WorkItem>,
    /// Folders processed, including missing and unreadable ones.
    pub folders: u64,
}

impl Enumeration {
    /// Denominator for image progress.
    #[inline]
    pub fn total(&self) -> usize {
        self.items.len()
    }
}

/// Split newline-separated labels: trimmed, empty lines dropped, duplicates
/// dropped (first occurrence wins).
pub fn parse_labels(text: &str) -> Vec<CompactString> {
    let mut seen = HashSet::new();
    text.lines()
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .filter(|label| seen.insert(*label))
        .map(CompactString::new)
        .collect()
}

/// Whether a file extension (without the dot) is a scanned image type.
///
/// Case-insensitive, lowercased into a stack buffer so the hot path does
/// not allocate.
pub fn is_supported_extension(ext: &str) -> bool {
    let bytes = ext.as_bytes();
    if bytes.is_empty() || bytes.len() > 4 {
        return false;
    }
    let mut lower = [0u8; 4];
    for (dest, &src) in lower.iter_mut().zip(bytes) {
        *dest = src.to_ascii_lowercase();
    }
    matches!(
        &lower[..bytes.len()],
        b"jpg" | b"jpeg" | b"png" | b"gif" | b"bmp" | b"tiff" | b"webp" | b"ico"
    )
}

/// Enumerate image files directly inside `root/label` for every label.
///
/// Labels are trimmed; empty labels are skipped and not counted.
/// `on_folder` is called as each folder is entered and finished.
pub fn enumerate<F>(root: &Path, labels: &[CompactString], mut on_folder: F) -> Enumeration
where
    F: FnMut(FolderProgress<'_>),
{
    let mut result = Enumeration::default();

    for label in labels {
        let label = label.trim();
        if label.is_empty() {
            continue;
        }
        on_folder(FolderProgress::Entering(label));

        let folder = root.join(label);
        let before = result.items.len();
        if !folder.exists() {
            debug!("folder {} does not exist; skipping", folder.display());
        } else if let Err(err) = list_folder(&folder, label, &mut result.items) {
            warn!("Error accessing folder {label}: {err}");
            result.items.truncate(before);
        }

        result.folders += 1;
        on_folder(FolderProgress::Done {
            label,
            images: result.items.len() - before,
        });
    }

    result
}

/// Append one work item per supported image file directly inside `folder`.
///
/// Entries that fail individually are skipped; failure to read the folder
/// itself is returned.
fn list_folder(folder: &Path, label: &str, out: &mut Vec<WorkItem>) -> io::Result<()> {
    // Surface an unreadable folder before walking its entries.
    fs::read_dir(folder)?;

    let walker = jwalk::WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .skip_hidden(false)
        .follow_links(true)
        .sort(true)
        .parallelism(jwalk::Parallelism::Serial);

    for entry_result in walker {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(err) => {
                debug!("skipping unreadable entry in {}: {err}", folder.display());
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let supported = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(is_supported_extension);
        if !supported {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy();
        out.push(WorkItem::new(path, label, file_name.as_ref()));
    }
    Ok(())
}
