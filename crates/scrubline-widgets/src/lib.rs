//! Waveform overview widget for scrubline hosts
//!
//! Toolkit-independent: the widget produces RGBA pixel buffers and events,
//! and the host UI presents the buffers and forwards ticks, resizes and
//! clicks.
//!
//! ## Current Features
//!
//! - **Peak envelope**: one absolute peak per channel per pixel column
//! - **Normalization**: whole-file scale factor with configurable headroom
//! - **Background recompute**: at most one pass in flight, invalidations coalesced
//! - **Compositing**: mono/stereo lanes, progress colouring, marker overlay
//! - **Redraw gate**: frames are only composited when something visible changed

pub mod theme;
pub mod waveform;

pub use theme::OverviewColors;

pub use waveform::{
    build_envelope, render_overview, EnvelopeSnapshot, OverviewError, OverviewEvent,
    OverviewResult, OverviewWidget, PeakEnvelope, PixelBuffer, RecomputeState, ScaleFactor,
    ViewportState,
};
