//! Waveform overview
//!
//! Pipeline, leaf first:
//!
//! - **peaks**: downsample an audio source to one peak per channel per column
//! - **scale**: whole-file normalization factor
//! - **peaks_computer**: background thread running envelope + scale passes
//! - **scheduler**: Idle/Stale/Recomputing state machine with coalescing
//! - **canvas**: pure compositing function producing a pixel buffer
//! - **redraw**: per-tick check that skips frames identical to the last one
//! - **view**: `OverviewWidget`, the glue a host UI talks to
//!
//! Source change or resize marks the envelope stale; the next tick dispatches
//! a pass to the worker; a later tick installs the result; the redraw gate
//! notices and a fresh buffer replaces the displayed one.

mod canvas;
mod error;
mod peaks;
mod peaks_computer;
mod redraw;
mod scale;
mod scheduler;
mod state;
mod view;

pub use canvas::{render_overview, PixelBuffer, RenderInputs};
pub use error::{OverviewError, OverviewResult};
pub use peaks::{build_envelope, PeakEnvelope};
pub use peaks_computer::{
    compute_snapshot, EnvelopeSnapshot, PeaksComputeRequest, PeaksComputeResult, PeaksComputer,
};
pub use redraw::RedrawGate;
pub use scale::ScaleFactor;
pub use scheduler::{PassOutcome, RecomputeScheduler, RecomputeState};
pub use state::ViewportState;
pub use view::{OverviewEvent, OverviewWidget};
