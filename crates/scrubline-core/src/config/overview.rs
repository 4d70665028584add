//! Overview widget configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::source::AccessStrategy;
use crate::types::{Rgba, DEFAULT_PADDING, DEFAULT_TICK_INTERVAL_MS};

/// Largest padding accepted; a padding of 1.0 would scale every bar to zero
const MAX_PADDING: f64 = 0.99;

/// Settings for one overview widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverviewConfig {
    /// How audio files are accessed
    /// Default: full_cache
    pub access_strategy: AccessStrategy,

    /// Vertical headroom reserved above the loudest peak, as a fraction
    /// Default: 0.3
    pub padding: f64,

    /// Colour of bars after the playback position
    /// Default: #0000FF
    pub waveform_color: Rgba,

    /// Colour of bars before the playback position
    /// Default: #F68656
    pub progress_color: Rgba,

    /// Default: transparent
    pub background_color: Rgba,

    /// Default: white
    pub marker_color: Rgba,

    /// Whether clicks on the overview request a seek
    /// Default: false
    pub clickable: bool,

    /// Interval between host ticks in milliseconds
    /// Default: 100
    pub tick_interval_ms: u64,

    pub transcode: TranscodeConfig,
}

impl Default for OverviewConfig {
    fn default() -> Self {
        Self {
            access_strategy: AccessStrategy::FullCache,
            padding: DEFAULT_PADDING,
            waveform_color: Rgba::BLUE,
            progress_color: Rgba::rgb(0xF6, 0x86, 0x56),
            background_color: Rgba::TRANSPARENT,
            marker_color: Rgba::WHITE,
            clickable: false,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            transcode: TranscodeConfig::default(),
        }
    }
}

impl OverviewConfig {
    /// Padding clamped to `[0, 0.99]`; non-finite values use the default
    pub fn effective_padding(&self) -> f64 {
        if self.padding.is_finite() {
            self.padding.clamp(0.0, MAX_PADDING)
        } else {
            DEFAULT_PADDING
        }
    }

    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

/// External ffmpeg conversion settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscodeConfig {
    /// Path to the ffmpeg executable; `None` disables conversion
    pub ffmpeg_path: Option<PathBuf>,

    /// Downmix to mono while converting
    /// Default: true
    pub convert_to_mono: bool,

    /// Where converted files are written; `None` uses the system temp dir
    pub output_dir: Option<PathBuf>,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            convert_to_mono: true,
            output_dir: None,
        }
    }
}
