//! Colour scheme for the overview widget

use scrubline_core::config::OverviewConfig;
use scrubline_core::Rgba;

/// Default colour of bars after the playback position (#0000FF)
pub const WAVEFORM_COLOR: Rgba = Rgba::BLUE;

/// Default colour of bars before the playback position (#F68656)
pub const PROGRESS_COLOR: Rgba = Rgba::rgb(0xF6, 0x86, 0x56);

/// Default background fill
pub const BACKGROUND_COLOR: Rgba = Rgba::TRANSPARENT;

/// Default marker line colour
pub const MARKER_COLOR: Rgba = Rgba::WHITE;

/// Colours used when compositing one overview frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverviewColors {
    pub waveform: Rgba,
    pub progress: Rgba,
    pub background: Rgba,
    pub marker: Rgba,
}

impl Default for OverviewColors {
    fn default() -> Self {
        Self {
            waveform: WAVEFORM_COLOR,
            progress: PROGRESS_COLOR,
            background: BACKGROUND_COLOR,
            marker: MARKER_COLOR,
        }
    }
}

impl From<&OverviewConfig> for OverviewColors {
    fn from(config: &OverviewConfig) -> Self {
        Self {
            waveform: config.waveform_color,
            progress: config.progress_color,
            background: config.background_color,
            marker: config.marker_color,
        }
    }
}
