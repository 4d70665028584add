//! Overview widget glue
//!
//! [`OverviewWidget`] ties the pieces together for a host UI:
//!
//! - `set_source` opens a file (through ffmpeg first when configured) and
//!   marks the envelope stale
//! - `resize` records the new size and marks the envelope stale
//! - `tick` advances the recompute scheduler and, if the redraw gate allows,
//!   composites a new frame and swaps it in
//! - `handle_click`, `set_marker` and `clear_marker` queue [`OverviewEvent`]s
//!   for the host to drain
//!
//! ## Usage
//!
//! ```ignore
//! let mut overview = OverviewWidget::new(config, 800, 60);
//! overview.set_source(&path)?;
//!
//! // every tick_interval_ms:
//! overview.set_position(player.position());
//! if overview.tick() {
//!     surface.present(overview.displayed().as_bytes());
//! }
//! for event in overview.drain_events() {
//!     // SeekRequested / MarkerSet / MarkerCleared / RecomputeFailed
//! }
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use scrubline_core::config::OverviewConfig;
use scrubline_core::source::{open_source, AccessStrategy, AudioSource};
use scrubline_core::transcode::{needs_transcode, transcode_to_wav};
use scrubline_core::Rgba;

use super::canvas::{render_overview, PixelBuffer, RenderInputs};
use super::error::{OverviewError, OverviewResult};
use super::peaks::PeakEnvelope;
use super::peaks_computer::EnvelopeSnapshot;
use super::redraw::RedrawGate;
use super::scale::ScaleFactor;
use super::scheduler::{PassOutcome, RecomputeScheduler, RecomputeState};
use super::state::ViewportState;
use crate::theme::OverviewColors;

/// Notifications for the host
#[derive(Debug, Clone)]
pub enum OverviewEvent {
    /// The user clicked the overview while it was clickable
    SeekRequested(Duration),
    /// A marker was placed at column `x`, corresponding to `position`
    MarkerSet { x: usize, position: Duration },
    MarkerCleared,
    /// A recompute pass failed; the previous envelope is still shown
    RecomputeFailed(OverviewError),
}

/// Waveform overview with progress and marker overlays
pub struct OverviewWidget {
    config: OverviewConfig,
    colors: OverviewColors,
    viewport: ViewportState,
    source: Option<Arc<dyn AudioSource>>,
    /// Installed envelope and scale, replaced as a unit
    snapshot: Option<Arc<EnvelopeSnapshot>>,
    scheduler: RecomputeScheduler,
    gate: RedrawGate,
    /// Frame currently handed to the host
    displayed: Arc<PixelBuffer>,
    buffer_writes: u64,
    events: Vec<OverviewEvent>,
}

impl OverviewWidget {
    pub fn new(config: OverviewConfig, width: usize, height: usize) -> Self {
        let colors = OverviewColors::from(&config);
        let mut scheduler = RecomputeScheduler::new(config.effective_padding());
        scheduler.set_width(width);

        Self {
            displayed: Arc::new(PixelBuffer::new(width, height, colors.background)),
            config,
            colors,
            viewport: ViewportState::new(width, height),
            source: None,
            snapshot: None,
            scheduler,
            gate: RedrawGate::new(),
            buffer_writes: 0,
            events: Vec::new(),
        }
    }

    // =========================================================================
    // Source
    // =========================================================================

    /// Open `path` with the configured access strategy
    ///
    /// Runs the ffmpeg conversion first when it applies. Any previously
    /// shown envelope is discarded. On failure the widget is left without a
    /// source and draws background only.
    pub fn set_source<P: AsRef<Path>>(&mut self, path: P) -> OverviewResult<()> {
        let path = path.as_ref();
        log::info!("OverviewWidget: setting source {:?}", path);

        match self.open(path) {
            Ok(source) => {
                self.install_source(Some(source));
                Ok(())
            }
            Err(e) => {
                log::warn!("OverviewWidget: failed to open {:?}: {}", path, e);
                self.install_source(None);
                Err(e)
            }
        }
    }

    fn open(&self, path: &Path) -> OverviewResult<Arc<dyn AudioSource>> {
        let transcode = &self.config.transcode;
        let converted = if needs_transcode(path, transcode) {
            Some(transcode_to_wav(path, transcode)?)
        } else {
            None
        };
        let resolved = converted.as_deref().unwrap_or(path);
        Ok(open_source(resolved, self.config.access_strategy)?)
    }

    /// Use an already opened source
    pub fn set_audio_source(&mut self, source: Arc<dyn AudioSource>) {
        self.install_source(Some(source));
    }

    /// Drop the current source and its envelope
    pub fn clear_source(&mut self) {
        self.install_source(None);
    }

    fn install_source(&mut self, source: Option<Arc<dyn AudioSource>>) {
        self.source = source.clone();
        self.snapshot = None;
        self.scheduler.set_source(source);
        self.gate.mark_envelope_changed();
    }

    pub fn source(&self) -> Option<&Arc<dyn AudioSource>> {
        self.source.as_ref()
    }

    /// Duration of the current source, zero without one
    pub fn duration(&self) -> Duration {
        self.source
            .as_ref()
            .map(|s| s.duration())
            .unwrap_or(Duration::ZERO)
    }

    // =========================================================================
    // Viewport
    // =========================================================================

    /// New pixel size
    ///
    /// A width change makes the envelope stale. Columns do not depend on the
    /// height, so a height-only change just redraws the installed envelope.
    pub fn resize(&mut self, width: usize, height: usize) {
        if self.viewport.resize(width, height) {
            log::debug!("OverviewWidget: resized to {}x{}", width, height);
            self.scheduler.set_width(width);
            self.gate.mark_dirty();
        }
    }

    /// Playback progress as a fraction of the duration (clamped to `[0, 1]`)
    pub fn set_progress_fraction(&mut self, progress: f64) {
        self.viewport.set_progress(progress);
    }

    /// Playback progress as a position in the current source
    pub fn set_position(&mut self, position: Duration) {
        let duration = self.duration();
        if duration.is_zero() {
            self.viewport.set_progress(0.0);
        } else {
            self.viewport
                .set_progress(position.as_secs_f64() / duration.as_secs_f64());
        }
    }

    pub fn viewport(&self) -> &ViewportState {
        &self.viewport
    }

    // =========================================================================
    // Interaction
    // =========================================================================

    pub fn set_clickable(&mut self, clickable: bool) {
        self.config.clickable = clickable;
    }

    pub fn is_clickable(&self) -> bool {
        self.config.clickable
    }

    /// Translate a click at horizontal pixel `x` into a seek request
    ///
    /// Ignored (returns `None`) unless the widget is clickable and has a source.
    pub fn handle_click(&mut self, x: f64) -> Option<Duration> {
        if !self.config.clickable || self.source.is_none() || self.viewport.width() == 0 {
            return None;
        }
        let position = self.viewport.position_at(x, self.duration());
        log::debug!("OverviewWidget: click at {} -> seek {:?}", x, position);
        self.events.push(OverviewEvent::SeekRequested(position));
        Some(position)
    }

    /// Place the marker at column `x` (clamped to the viewport)
    pub fn set_marker(&mut self, x: usize) {
        let x = x.min(self.viewport.width().saturating_sub(1));
        let position = self.viewport.position_at(x as f64, self.duration());
        self.viewport.set_marker(Some(x));
        self.gate.mark_marker_changed();
        self.events.push(OverviewEvent::MarkerSet { x, position });
    }

    pub fn clear_marker(&mut self) {
        if self.viewport.marker().is_some() {
            self.viewport.set_marker(None);
            self.gate.mark_marker_changed();
            self.events.push(OverviewEvent::MarkerCleared);
        }
    }

    /// Take all queued events
    pub fn drain_events(&mut self) -> Vec<OverviewEvent> {
        std::mem::take(&mut self.events)
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Strategy used by the next `set_source`
    pub fn set_access_strategy(&mut self, strategy: AccessStrategy) {
        self.config.access_strategy = strategy;
    }

    pub fn access_strategy(&self) -> AccessStrategy {
        self.config.access_strategy
    }

    /// Change the headroom fraction; triggers a recompute
    pub fn set_padding(&mut self, padding: f64) {
        self.config.padding = padding;
        self.scheduler.set_padding(self.config.effective_padding());
    }

    pub fn set_waveform_color(&mut self, color: Rgba) {
        self.config.waveform_color = color;
        self.colors.waveform = color;
        self.gate.mark_dirty();
    }

    pub fn set_progress_color(&mut self, color: Rgba) {
        self.config.progress_color = color;
        self.colors.progress = color;
        self.gate.mark_dirty();
    }

    pub fn set_background_color(&mut self, color: Rgba) {
        self.config.background_color = color;
        self.colors.background = color;
        self.gate.mark_dirty();
    }

    pub fn set_marker_color(&mut self, color: Rgba) {
        self.config.marker_color = color;
        self.colors.marker = color;
        self.gate.mark_dirty();
    }

    pub fn config(&self) -> &OverviewConfig {
        &self.config
    }

    // =========================================================================
    // Tick
    // =========================================================================

    /// Periodic update; returns true if a new frame was swapped in
    pub fn tick(&mut self) -> bool {
        if let Some(outcome) = self.scheduler.tick() {
            self.apply_outcome(outcome);
        }

        if !self.gate.check(&self.viewport) {
            return false;
        }

        let snapshot = self.snapshot.as_deref();
        let frame = render_overview(RenderInputs {
            envelope: snapshot.map(|s| &s.envelope),
            scale: snapshot.and_then(|s| s.scale),
            viewport: &self.viewport,
            colors: &self.colors,
        });
        self.displayed = Arc::new(frame);
        self.buffer_writes += 1;
        true
    }

    fn apply_outcome(&mut self, outcome: PassOutcome) {
        match outcome {
            PassOutcome::Completed(snapshot) => {
                self.snapshot = Some(Arc::new(snapshot));
                self.gate.mark_envelope_changed();
            }
            PassOutcome::Empty => {
                if self.snapshot.take().is_some() {
                    self.gate.mark_envelope_changed();
                }
            }
            PassOutcome::Failed(e) => {
                log::warn!("OverviewWidget: recompute failed, keeping last envelope: {}", e);
                self.events.push(OverviewEvent::RecomputeFailed(e));
            }
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Frame currently on display
    pub fn displayed(&self) -> Arc<PixelBuffer> {
        Arc::clone(&self.displayed)
    }

    /// Number of frames composited so far
    pub fn buffer_writes(&self) -> u64 {
        self.buffer_writes
    }

    pub fn envelope(&self) -> Option<&PeakEnvelope> {
        self.snapshot.as_ref().map(|s| &s.envelope)
    }

    pub fn scale_factor(&self) -> Option<ScaleFactor> {
        self.snapshot.as_ref().and_then(|s| s.scale)
    }

    /// Installed snapshot, shared with the caller
    pub fn snapshot(&self) -> Option<Arc<EnvelopeSnapshot>> {
        self.snapshot.clone()
    }

    pub fn recompute_state(&self) -> RecomputeState {
        self.scheduler.state()
    }
}
