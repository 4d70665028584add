//! Overview widget errors

use scrubline_core::source::SourceError;
use scrubline_core::transcode::TranscodeError;
use thiserror::Error;

/// Errors surfaced by the overview widget
#[derive(Error, Debug, Clone)]
pub enum OverviewError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("Transcoding failed: {0}")]
    Transcode(#[from] TranscodeError),

    /// The background computation thread is gone
    #[error("Peaks computer thread disconnected")]
    WorkerDisconnected,
}

pub type OverviewResult<T> = Result<T, OverviewError>;
