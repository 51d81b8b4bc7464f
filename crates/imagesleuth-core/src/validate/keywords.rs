/// Error classification: decides whether a decode or verify failure means
/// the file is corrupt or merely unsupported.
///
/// Structured signals from `image::ImageError` are used first. Substring
/// matching against the keyword sets below is the fallback for errors that
/// only carry a message (decoder-specific `Decoding` errors, unclassified
/// I/O errors, verifier messages).
///
/// Anything that matches nothing is treated as benign. A false "corrupt"
/// invites the operator to delete a good file; a false "intact" does not.
use image::error::ImageError;
use std::io;

/// Keywords that mark a forced-decode failure as corruption.
///
/// Rust decoders report a short read as "unexpected end"/"unexpected EOF"
/// where other libraries say "truncated", so both spellings are listed.
pub const DECODE_CORRUPTION_KEYWORDS: &[&str] = &[
    "truncated",
    "corrupt",
    "broken",
    "invalid",
    "damaged",
    "unexpected end",
    "unexpected eof",
];

/// Keywords that mark a structural-verification failure as corruption.
pub const VERIFY_CORRUPTION_KEYWORDS: &[&str] = &[
    "truncated",
    "corrupt",
    "broken",
    "invalid",
    "damaged",
    "premature end",
    "incomplete",
    "bad",
    "unexpected end",
    "unexpected eof",
];

/// Keywords applied to any error that escaped the staged checks.
pub const FALLBACK_CORRUPTION_KEYWORDS: &[&str] = &[
    "truncated",
    "corrupt",
    "broken",
    "invalid",
    "damaged",
    "premature end",
    "incomplete",
    "bad data",
    "unexpected end",
    "unexpected eof",
];

/// How a failure should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The file content is damaged.
    Corrupt,
    /// The file could not be read at all (permissions, sharing violations).
    Inaccessible,
    /// Unsupported feature or resource limit; the file is presumed intact.
    Benign,
}

/// Case-insensitive substring test against a keyword set.
pub fn matches_any(message: &str, keywords: &[&str]) -> bool {
    let lower = message.to_ascii_lowercase();
    keywords.iter().any(|kw| lower.contains(kw))
}

/// Classify a bare message.
pub fn classify_message(message: &str, keywords: &[&str]) -> ErrorClass {
    if matches_any(message, keywords) {
        ErrorClass::Corrupt
    } else {
        ErrorClass::Benign
    }
}

/// Classify an I/O error by kind, falling back to its message.
pub fn classify_io(err: &io::Error, keywords: &[&str]) -> ErrorClass {
    match err.kind() {
        io::ErrorKind::PermissionDenied | io::ErrorKind::NotFound => ErrorClass::Inaccessible,
        io::ErrorKind::UnexpectedEof => ErrorClass::Corrupt,
        _ => classify_message(&err.to_string(), keywords),
    }
}

/// Classify an `image` crate error.
pub fn classify_image_error(err: &ImageError, keywords: &[&str]) -> ErrorClass {
    match err {
        ImageError::Unsupported(_) | ImageError::Limits(_) | ImageError::Parameter(_) => {
            ErrorClass::Benign
        }
        ImageError::IoError(io_err) => classify_io(io_err, keywords),
        // Decoding errors only carry decoder-specific text.
        _ => classify_message(&err.to_string(), keywords),
    }
}
