//! Peak envelope generation
//!
//! Downsamples an [`AudioSource`] to one absolute peak per channel per pixel
//! column. Each column covers `increment = T / W` frames (at least one); the
//! final column covers whatever is left, so nothing at the end of the file is
//! dropped. When `T` is not a multiple of `W` this yields one more column
//! than the viewport is wide.

use scrubline_core::source::{AudioSource, SourceResult};
use scrubline_core::ChannelLayout;

/// Per-column peaks for one viewport width
///
/// Values are interleaved `[L, R, L, R, ...]` for stereo. The envelope is
/// built into a fresh buffer and never modified afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct PeakEnvelope {
    values: Vec<f32>,
    layout: ChannelLayout,
    /// Viewport width that produced this envelope
    width: usize,
    /// Frames covered by each column (the last one may cover fewer)
    increment: u64,
}

impl PeakEnvelope {
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    pub fn channel_count(&self) -> usize {
        self.layout.count()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn increment(&self) -> u64 {
        self.increment
    }

    /// Number of columns (region steps) in the envelope
    pub fn columns(&self) -> usize {
        self.values.len() / self.layout.count()
    }

    /// Peak of `channel` in `column`, or 0.0 outside the envelope
    pub fn peak(&self, column: usize, channel: usize) -> f32 {
        let channels = self.layout.count();
        if channel >= channels {
            return 0.0;
        }
        self.values
            .get(column * channels + channel)
            .copied()
            .unwrap_or(0.0)
    }
}

/// Build the envelope of `source` for a viewport `width` pixels wide
///
/// Returns `Ok(None)` without touching the source when either the width or
/// the file length is zero. A region query that reports fewer channels than
/// the file declares is padded with `0.0` so every column keeps its arity.
pub fn build_envelope(
    source: &dyn AudioSource,
    width: usize,
) -> SourceResult<Option<PeakEnvelope>> {
    let total = source.total_frame_count();
    if width == 0 || total == 0 {
        return Ok(None);
    }

    let layout = source.layout();
    let channels = layout.count();
    let increment = (total / width as u64).max(1);
    let steps = total.div_ceil(increment) as usize;

    let mut values = Vec::with_capacity(steps * channels);
    let mut short_regions = 0usize;
    let mut start = 0u64;
    while start < total {
        let end = (start + increment).min(total);
        let peaks = source.peak_for_region(start, end)?;
        if peaks.len() < channels {
            short_regions += 1;
        }
        values.extend((0..channels).map(|ch| peaks.get(ch).copied().unwrap_or(0.0)));
        start = end;
    }

    if short_regions > 0 {
        log::warn!(
            "build_envelope: {} region(s) of {:?} reported fewer than {} channels, zero-filled",
            short_regions,
            source.path(),
            channels
        );
    }

    Ok(Some(PeakEnvelope {
        values,
        layout,
        width,
        increment,
    }))
}
