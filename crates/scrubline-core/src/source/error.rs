//! Audio source error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while opening or querying an audio source
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    /// File could not be read, or its container/codec is not supported
    #[error("Failed to open '{path}': {reason}")]
    Open { path: PathBuf, reason: String },

    /// Channel count other than mono or stereo
    #[error("Unsupported format: {channels} channels (only mono and stereo are supported)")]
    UnsupportedFormat { channels: u16 },

    /// Region does not lie inside the file
    #[error("Invalid region {start}..{end} (file has {total} frames)")]
    InvalidRegion { start: u64, end: u64, total: u64 },

    /// Reading sample data failed after the file was opened
    #[error("Read error: {0}")]
    Read(String),
}

impl SourceError {
    pub(crate) fn open(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        SourceError::Open {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for audio source operations
pub type SourceResult<T> = Result<T, SourceError>;
