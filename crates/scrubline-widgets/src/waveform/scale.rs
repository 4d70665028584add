//! Amplitude normalization
//!
//! One scale factor per file, derived from the whole-file peak so bar heights
//! do not change as progress moves or the viewport is resized:
//!
//! ```text
//! scale = (1 / global_peak) * (1 - padding)
//! ```

/// Multiplier applied to column peaks before drawing
///
/// Only exists for files with a non-zero peak; a silent file has no scale
/// and draws no bars.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactor(f32);

impl ScaleFactor {
    /// Scale for a file whose loudest sample is `global_peak`
    ///
    /// `padding` is the headroom fraction and is clamped to `[0, 1]`.
    pub fn from_global_peak(global_peak: f32, padding: f64) -> Option<Self> {
        if !global_peak.is_finite() || global_peak <= 0.0 {
            return None;
        }
        let headroom = 1.0 - padding.clamp(0.0, 1.0) as f32;
        Some(Self((1.0 / global_peak) * headroom))
    }

    /// Scale from per-channel peaks, using the loudest finite channel
    pub fn from_channel_peaks(peaks: &[f32], padding: f64) -> Option<Self> {
        let loudest = peaks
            .iter()
            .copied()
            .filter(|p| p.is_finite())
            .fold(0.0f32, f32::max);
        Self::from_global_peak(loudest, padding)
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Distance a bar extends above (and below) its lane midpoint
    ///
    /// The full bar is `(lane_height / 2) * peak * scale` tall, so each half
    /// is a quarter lane times the scaled peak. Clipped to the lane.
    pub fn bar_half_extent(self, lane_height: f32, peak: f32) -> f32 {
        let half = lane_height / 4.0 * peak.abs() * self.0;
        half.clamp(0.0, lane_height / 2.0)
    }
}
