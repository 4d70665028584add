//! Overview compositing
//!
//! [`render_overview`] is a pure function: envelope, scale, viewport and
//! colours in, a complete [`PixelBuffer`] out. Nothing is drawn into a
//! buffer the host is displaying.
//!
//! Layout:
//! - mono: one lane spanning the full height, midline at `h/2`
//! - stereo: left lane centred at `h/4`, right lane centred at `3h/4`
//!
//! Drawing order is background, bars, marker, so the marker is always on top.

use scrubline_core::Rgba;

use super::peaks::PeakEnvelope;
use super::scale::ScaleFactor;
use super::state::ViewportState;
use crate::theme::OverviewColors;

// =============================================================================
// Pixel Buffer
// =============================================================================

/// Row-major RGBA8 image
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    pixels: Vec<Rgba>,
}

impl PixelBuffer {
    /// Buffer of `width x height` pixels filled with `fill`
    pub fn new(width: usize, height: usize, fill: Rgba) -> Self {
        Self {
            width,
            height,
            pixels: vec![fill; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    /// Raw RGBA bytes, four per pixel
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y * self.width + x).copied()
    }

    /// Fill rows `[y0, y1)` of column `x`
    fn fill_column(&mut self, x: usize, y0: usize, y1: usize, color: Rgba) {
        if x >= self.width {
            return;
        }
        for y in y0..y1.min(self.height) {
            self.pixels[y * self.width + x] = color;
        }
    }
}

// =============================================================================
// Renderer
// =============================================================================

/// Everything needed to composite one frame
#[derive(Debug, Clone, Copy)]
pub struct RenderInputs<'a> {
    pub envelope: Option<&'a PeakEnvelope>,
    pub scale: Option<ScaleFactor>,
    pub viewport: &'a ViewportState,
    pub colors: &'a OverviewColors,
}

/// Composite one overview frame
///
/// Without an envelope, or with no scale (silent file), only the background
/// and marker are drawn.
pub fn render_overview(inputs: RenderInputs<'_>) -> PixelBuffer {
    let viewport = inputs.viewport;
    let width = viewport.width();
    let height = viewport.height();
    let mut buffer = PixelBuffer::new(width, height, inputs.colors.background);
    if width == 0 || height == 0 {
        return buffer;
    }

    if let (Some(envelope), Some(scale)) = (inputs.envelope, inputs.scale) {
        draw_bars(&mut buffer, envelope, scale, viewport, inputs.colors);
    }

    if let Some(x) = viewport.marker() {
        buffer.fill_column(x, 0, height, inputs.colors.marker);
    }

    buffer
}

fn draw_bars(
    buffer: &mut PixelBuffer,
    envelope: &PeakEnvelope,
    scale: ScaleFactor,
    viewport: &ViewportState,
    colors: &OverviewColors,
) {
    let height = buffer.height() as f32;
    let channels = envelope.channel_count();
    let lane_height = height / channels as f32;
    let columns = envelope.columns().min(buffer.width());

    for p in 0..columns {
        let color = if viewport.is_progress_column(p) {
            colors.progress
        } else {
            colors.waveform
        };

        for ch in 0..channels {
            let half = scale.bar_half_extent(lane_height, envelope.peak(p, ch));
            if half <= 0.0 {
                continue;
            }
            let lane_top = lane_height * ch as f32;
            let lane_bottom = lane_top + lane_height;
            let mid = lane_top + lane_height / 2.0;

            let y0 = (mid - half).floor().max(lane_top.floor()) as usize;
            let y1 = (mid + half).ceil().min(lane_bottom.ceil()) as usize;
            buffer.fill_column(p, y0, y1, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waveform::peaks::build_envelope;
    use scrubline_core::source::FullCacheSource;
    use scrubline_core::ChannelLayout;

    const BG: Rgba = Rgba::rgb(10, 10, 10);

    fn colors() -> OverviewColors {
        OverviewColors {
            background: BG,
            ..Default::default()
        }
    }

    fn flat_envelope(
        layout: ChannelLayout,
        level: f32,
        frames: usize,
        width: usize,
    ) -> PeakEnvelope {
        let samples = vec![level; frames * layout.count()];
        let source = FullCacheSource::from_interleaved("flat", layout, 44100, samples);
        build_envelope(&source, width).unwrap().unwrap()
    }

    fn column_rows(buffer: &PixelBuffer, x: usize, color: Rgba) -> Vec<usize> {
        (0..buffer.height())
            .filter(|&y| buffer.pixel(x, y) == Some(color))
            .collect()
    }

    #[test]
    fn test_mono_bar_centred_at_half_height() {
        // Every sample at 0.5: half extent is 0.35 of the half lane (17.5 px)
        let envelope = flat_envelope(ChannelLayout::Mono, 0.5, 1000, 100);
        let scale = ScaleFactor::from_global_peak(0.5, 0.3);
        let viewport = ViewportState::new(100, 100);
        let colors = colors();

        let buffer = render_overview(RenderInputs {
            envelope: Some(&envelope),
            scale,
            viewport: &viewport,
            colors: &colors,
        });

        let rows = column_rows(&buffer, 40, colors.waveform);
        assert_eq!(rows.first(), Some(&32));
        assert_eq!(rows.last(), Some(&67));
        assert_eq!(buffer.pixel(40, 10), Some(BG));
        assert_eq!(buffer.pixel(40, 90), Some(BG));
    }

    #[test]
    fn test_stereo_uses_two_lanes() {
        let envelope = flat_envelope(ChannelLayout::Stereo, 0.5, 1000, 50);
        let scale = ScaleFactor::from_global_peak(0.5, 0.3);
        let viewport = ViewportState::new(50, 100);
        let colors = colors();

        let buffer = render_overview(RenderInputs {
            envelope: Some(&envelope),
            scale,
            viewport: &viewport,
            colors: &colors,
        });

        // Lanes are 50 px tall, centred at 25 and 75; bars extend 8.75 px
        assert_eq!(buffer.pixel(5, 25), Some(colors.waveform));
        assert_eq!(buffer.pixel(5, 75), Some(colors.waveform));
        assert_eq!(buffer.pixel(5, 50), Some(BG), "no shared midline");
        assert_eq!(buffer.pixel(5, 10), Some(BG));
        assert_eq!(buffer.pixel(5, 90), Some(BG));
    }

    #[test]
    fn test_progress_colour_threshold() {
        let envelope = flat_envelope(ChannelLayout::Mono, 0.8, 400, 40);
        let scale = ScaleFactor::from_global_peak(0.8, 0.3);
        let mut viewport = ViewportState::new(40, 20);
        viewport.set_progress(0.25);
        let colors = colors();

        let buffer = render_overview(RenderInputs {
            envelope: Some(&envelope),
            scale,
            viewport: &viewport,
            colors: &colors,
        });

        for x in 0..10 {
            assert_eq!(buffer.pixel(x, 10), Some(colors.progress), "column {}", x);
        }
        for x in 10..40 {
            assert_eq!(buffer.pixel(x, 10), Some(colors.waveform), "column {}", x);
        }
    }

    #[test]
    fn test_marker_drawn_on_top_full_height() {
        let envelope = flat_envelope(ChannelLayout::Mono, 1.0, 1000, 100);
        let scale = ScaleFactor::from_global_peak(1.0, 0.0);
        let mut viewport = ViewportState::new(100, 30);
        viewport.set_marker(Some(40));
        let colors = colors();

        let buffer = render_overview(RenderInputs {
            envelope: Some(&envelope),
            scale,
            viewport: &viewport,
            colors: &colors,
        });

        assert_eq!(column_rows(&buffer, 40, colors.marker).len(), 30);
        assert_eq!(buffer.pixel(39, 15), Some(colors.waveform));
    }

    #[test]
    fn test_silent_or_missing_envelope_draws_background_only() {
        let envelope = flat_envelope(ChannelLayout::Mono, 0.0, 100, 10);
        let viewport = ViewportState::new(10, 10);
        let colors = colors();

        for inputs in [
            RenderInputs {
                envelope: Some(&envelope),
                scale: None,
                viewport: &viewport,
                colors: &colors,
            },
            RenderInputs {
                envelope: None,
                scale: None,
                viewport: &viewport,
                colors: &colors,
            },
        ] {
            let buffer = render_overview(inputs);
            assert!(buffer.pixels().iter().all(|&p| p == BG));
        }
    }

    #[test]
    fn test_as_bytes_is_rgba() {
        let buffer = PixelBuffer::new(2, 1, Rgba::new(1, 2, 3, 4));
        assert_eq!(buffer.as_bytes(), &[1, 2, 3, 4, 1, 2, 3, 4]);
    }

    #[test]
    fn test_render_is_deterministic() {
        let envelope = flat_envelope(ChannelLayout::Stereo, 0.3, 5000, 64);
        let scale = ScaleFactor::from_global_peak(0.3, 0.3);
        let mut viewport = ViewportState::new(64, 32);
        viewport.set_progress(0.4);
        let colors = colors();
        let inputs = RenderInputs {
            envelope: Some(&envelope),
            scale,
            viewport: &viewport,
            colors: &colors,
        };
        assert_eq!(render_overview(inputs), render_overview(inputs));
    }
}
