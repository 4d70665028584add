//! Redraw throttling
//!
//! Checked once per tick. A frame is only composited when something visible
//! changed since the last one: the number of progress columns, the marker,
//! the installed envelope, or anything else flagged dirty (colours, size).
//! Progress moving within a single pixel column never causes a redraw.

use super::state::ViewportState;

#[derive(Debug, Clone, Default)]
pub struct RedrawGate {
    /// Progress columns at the last draw; `None` before the first draw
    drawn_progress_columns: Option<usize>,
    marker_changed: bool,
    envelope_changed: bool,
    dirty: bool,
}

impl RedrawGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_marker_changed(&mut self) {
        self.marker_changed = true;
    }

    pub fn mark_envelope_changed(&mut self) {
        self.envelope_changed = true;
    }

    /// Force the next check to redraw
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Whether the next frame would differ from the last one drawn
    pub fn needs_redraw(&self, viewport: &ViewportState) -> bool {
        self.dirty
            || self.marker_changed
            || self.envelope_changed
            || self.drawn_progress_columns != Some(viewport.progress_columns())
    }

    /// Check and, if a redraw is due, record it as done
    ///
    /// Returns true when the caller must composite a new frame.
    pub fn check(&mut self, viewport: &ViewportState) -> bool {
        if !self.needs_redraw(viewport) {
            return false;
        }
        self.drawn_progress_columns = Some(viewport.progress_columns());
        self.marker_changed = false;
        self.envelope_changed = false;
        self.dirty = false;
        true
    }
}
