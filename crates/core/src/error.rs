//! Error types for PPTX geometry normalization.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while opening, editing, or saving a presentation.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open or read the input file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// The file format is not supported or could not be detected.
    #[error("Unsupported or unrecognized file format: {0}")]
    UnsupportedFormat(String),

    /// ZIP archive error (PPTX container).
    #[error("ZIP error: {0}")]
    Zip(String),

    /// XML parsing or rewriting error.
    #[error("XML error: {0}")]
    Xml(String),

    /// Invalid or corrupted file.
    #[error("Invalid or corrupted file: {0}")]
    Corrupted(String),

    /// Failed to compute or apply geometry/border for a single shape.
    #[error("Shape error: {0}")]
    Shape(String),

    /// Save failed because the target file is held open by another process.
    #[error("File is open in another application: {}. Close it and retry.", .0.display())]
    SaveLocked(PathBuf),

    /// Save failed for any other reason.
    #[error("Failed to save file: {0}")]
    Save(String),

    /// Border weight was not a finite, non-negative number.
    #[error("Invalid border weight: {0}")]
    InvalidWeight(String),
}
