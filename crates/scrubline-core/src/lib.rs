//! Scrubline Core - audio access, configuration and conversion for waveform overviews

pub mod audio_file;
pub mod config;
pub mod source;
pub mod transcode;
pub mod types;

pub use types::*;
