//! Viewport state for the overview widget
//!
//! Pure data: pixel size, playback progress and the optional marker. Mutated
//! by resize and progress updates, never rebuilt.

use std::time::Duration;

/// Current size and overlay state of the overview
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportState {
    width: usize,
    height: usize,
    /// Playback progress (0.0 to 1.0)
    progress: f64,
    /// Marker column, if set
    marker: Option<usize>,
}

impl ViewportState {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            progress: 0.0,
            marker: None,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn marker(&self) -> Option<usize> {
        self.marker
    }

    /// Record a new size; returns true if it changed
    pub fn resize(&mut self, width: usize, height: usize) -> bool {
        if self.width == width && self.height == height {
            return false;
        }
        self.width = width;
        self.height = height;
        true
    }

    /// Set progress, clamped to `[0, 1]`; NaN counts as 0
    pub fn set_progress(&mut self, progress: f64) {
        self.progress = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };
    }

    pub fn set_marker(&mut self, marker: Option<usize>) {
        self.marker = marker;
    }

    /// Number of leading columns drawn in the progress colour
    ///
    /// Column `p` is a progress column iff `p < progress * width`.
    pub fn progress_columns(&self) -> usize {
        let edge = self.progress * self.width as f64;
        (edge.ceil() as usize).min(self.width)
    }

    /// Whether column `column` lies before the playback position
    pub fn is_progress_column(&self, column: usize) -> bool {
        (column as f64) < self.progress * self.width as f64
    }

    /// Map a horizontal pixel offset to a position in a file of `duration`
    ///
    /// `offset = x / width * duration`, with `x` clamped to the viewport.
    pub fn position_at(&self, x: f64, duration: Duration) -> Duration {
        if self.width == 0 || !x.is_finite() {
            return Duration::ZERO;
        }
        let fraction = (x / self.width as f64).clamp(0.0, 1.0);
        duration.mul_f64(fraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_columns_threshold() {
        let mut viewport = ViewportState::new(100, 20);
        viewport.set_progress(0.0);
        assert_eq!(viewport.progress_columns(), 0);

        viewport.set_progress(0.255);
        assert_eq!(viewport.progress_columns(), 26);
        assert!(viewport.is_progress_column(25));
        assert!(!viewport.is_progress_column(26));

        viewport.set_progress(0.25);
        assert_eq!(viewport.progress_columns(), 25);
        assert!(!viewport.is_progress_column(25));
    }

    #[test]
    fn test_progress_clamped() {
        let mut viewport = ViewportState::new(100, 20);
        viewport.set_progress(1.7);
        assert_eq!(viewport.progress(), 1.0);
        assert_eq!(viewport.progress_columns(), 100);
        viewport.set_progress(-3.0);
        assert_eq!(viewport.progress(), 0.0);
        viewport.set_progress(f64::NAN);
        assert_eq!(viewport.progress(), 0.0);
    }

    #[test]
    fn test_resize_reports_change() {
        let mut viewport = ViewportState::new(100, 20);
        assert!(!viewport.resize(100, 20));
        assert!(viewport.resize(200, 20));
        assert_eq!(viewport.width(), 200);
    }

    #[test]
    fn test_position_at() {
        let viewport = ViewportState::new(200, 20);
        let duration = Duration::from_secs(100);
        assert_eq!(viewport.position_at(50.0, duration), Duration::from_secs(25));
        assert_eq!(viewport.position_at(-10.0, duration), Duration::ZERO);
        assert_eq!(viewport.position_at(500.0, duration), duration);

        let empty = ViewportState::new(0, 0);
        assert_eq!(empty.position_at(10.0, duration), Duration::ZERO);
    }
}
