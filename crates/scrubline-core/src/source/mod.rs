//! Audio source access
//!
//! An [`AudioSource`] exposes the frame/channel counts of one opened file and
//! answers per-region peak queries. Two interchangeable strategies implement
//! it:
//!
//! - [`FullCacheSource`]: decodes the whole file at open time. Region queries
//!   are cheap; memory grows with file length.
//! - [`DiskStreamingSource`]: keeps only the WAV header and seeks/decodes the
//!   requested region on each query. Memory is bounded; each query pays I/O.
//!
//! Both produce identical `peak_for_region` results for the same WAV input.
//!
//! ```ignore
//! let source = open_source(&path, AccessStrategy::DiskStreaming)?;
//! let peaks = source.peak_for_region(0, 1024)?; // [abs_peak_l, abs_peak_r]
//! ```

mod disk_streaming;
mod error;
mod full_cache;

pub use disk_streaming::DiskStreamingSource;
pub use error::{SourceError, SourceResult};
pub use full_cache::FullCacheSource;

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::types::ChannelLayout;

/// How an opened file is accessed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessStrategy {
    /// Decode everything into memory at open time
    #[default]
    FullCache,
    /// Seek and decode only the requested region per query
    DiskStreaming,
}

/// One opened audio file
///
/// Sources are immutable once opened and shared between the display context
/// and the recompute worker, hence `Send + Sync`.
pub trait AudioSource: Send + Sync {
    /// Path the source was opened from
    fn path(&self) -> &Path;

    /// Strategy this source implements
    fn strategy(&self) -> AccessStrategy;

    fn layout(&self) -> ChannelLayout;

    fn total_frame_count(&self) -> u64;

    fn sample_rate(&self) -> u32;

    /// Absolute peak per channel over frames `[start, end)`
    ///
    /// `end` is clipped to the total frame count. An empty region yields
    /// zeros; `start > end` after clipping is `InvalidRegion`.
    fn peak_for_region(&self, start: u64, end: u64) -> SourceResult<Vec<f32>>;

    /// Absolute peak per channel over the whole file
    fn global_peak(&self) -> SourceResult<Vec<f32>>;

    fn channel_count(&self) -> usize {
        self.layout().count()
    }

    fn duration(&self) -> Duration {
        let rate = self.sample_rate();
        if rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.total_frame_count() as f64 / rate as f64)
    }
}

/// Open `path` with exactly one access strategy
pub fn open_source<P: AsRef<Path>>(
    path: P,
    strategy: AccessStrategy,
) -> SourceResult<Arc<dyn AudioSource>> {
    let path = path.as_ref();
    log::info!("open_source: {:?} ({:?})", path, strategy);

    let source: Arc<dyn AudioSource> = match strategy {
        AccessStrategy::FullCache => Arc::new(FullCacheSource::open(path)?),
        AccessStrategy::DiskStreaming => Arc::new(DiskStreamingSource::open(path)?),
    };

    log::info!(
        "open_source: {} frames, {} channel(s), {} Hz",
        source.total_frame_count(),
        source.channel_count(),
        source.sample_rate()
    );
    Ok(source)
}

/// Clip `[start, end)` against `total`, rejecting inverted ranges
pub(crate) fn clip_region(start: u64, end: u64, total: u64) -> SourceResult<(u64, u64)> {
    let end = end.min(total);
    if start > end {
        return Err(SourceError::InvalidRegion { start, end, total });
    }
    Ok((start, end))
}

/// Fold interleaved samples into per-channel absolute peaks
///
/// Non-finite samples (NaN, inf in float files) are ignored.
pub(crate) fn accumulate_peaks(samples: &[f32], peaks: &mut [f32]) {
    let channels = peaks.len();
    if channels == 0 {
        return;
    }
    for frame in samples.chunks_exact(channels) {
        for (peak, &sample) in peaks.iter_mut().zip(frame) {
            let abs = sample.abs();
            if abs.is_finite() && abs > *peak {
                *peak = abs;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_file::test_util::{write_wav, write_wav_i16};

    #[test]
    fn test_accumulate_peaks_per_channel() {
        let mut peaks = vec![0.0; 2];
        accumulate_peaks(&[0.1, -0.9, -0.5, 0.2, 0.3, 0.0], &mut peaks);
        assert_eq!(peaks, vec![0.5, 0.9]);
    }

    #[test]
    fn test_accumulate_peaks_ignores_non_finite() {
        let mut peaks = vec![0.0; 2];
        accumulate_peaks(
            &[f32::INFINITY, 0.2, -0.4, f32::NAN, 0.1, f32::NEG_INFINITY],
            &mut peaks,
        );
        assert_eq!(peaks, vec![0.4, 0.2]);
    }

    #[test]
    fn test_clip_region() {
        assert_eq!(clip_region(10, 20, 100).unwrap(), (10, 20));
        assert_eq!(clip_region(90, 120, 100).unwrap(), (90, 100));
        assert_eq!(clip_region(100, 120, 100).unwrap(), (100, 100));
        assert!(clip_region(120, 130, 100).is_err());
    }

    #[test]
    fn test_strategies_agree_on_region_peaks() {
        let dir = tempfile::tempdir().unwrap();
        let samples: Vec<i16> = (0..2000)
            .map(|i| ((i as f32 * 0.37).sin() * 20000.0) as i16)
            .collect();
        let path = write_wav_i16(dir.path(), "agree.wav", 2, &samples);

        let cached = open_source(&path, AccessStrategy::FullCache).unwrap();
        let streamed = open_source(&path, AccessStrategy::DiskStreaming).unwrap();

        assert_eq!(cached.strategy(), AccessStrategy::FullCache);
        assert_eq!(streamed.strategy(), AccessStrategy::DiskStreaming);
        assert_eq!(cached.total_frame_count(), streamed.total_frame_count());

        for (start, end) in [(0, 10), (7, 333), (990, 1000), (995, 2000), (1000, 1000)] {
            assert_eq!(
                cached.peak_for_region(start, end).unwrap(),
                streamed.peak_for_region(start, end).unwrap(),
                "region {}..{}",
                start,
                end
            );
        }
        assert_eq!(cached.global_peak().unwrap(), streamed.global_peak().unwrap());
    }

    /// Open `path` with both strategies and check their peaks
    fn assert_both_strategies(
        path: &Path,
        expected_global: &[f32],
        region: (u64, u64),
        expected_region: &[f32],
    ) {
        for strategy in [AccessStrategy::FullCache, AccessStrategy::DiskStreaming] {
            let source = open_source(path, strategy).unwrap();
            assert_eq!(source.global_peak().unwrap(), expected_global, "{:?}", strategy);
            assert_eq!(
                source.peak_for_region(region.0, region.1).unwrap(),
                expected_region,
                "{:?}",
                strategy
            );
        }
    }

    #[test]
    fn test_unsigned_8bit_wav() {
        let dir = tempfile::tempdir().unwrap();
        let samples = [0i8, -64, 32, 0];
        let path = write_wav(dir.path(), "u8.wav", 1, 8, hound::SampleFormat::Int, &samples);

        assert_both_strategies(&path, &[0.5], (2, 4), &[0.25]);
    }

    #[test]
    fn test_24bit_extensible_wav() {
        let dir = tempfile::tempdir().unwrap();
        let samples = [0i32, 4_194_304, -4_194_304, 0, 2_097_152, -2_097_152];
        let path = write_wav(dir.path(), "i24.wav", 2, 24, hound::SampleFormat::Int, &samples);

        assert_both_strategies(&path, &[0.5, 0.5], (2, 3), &[0.25, 0.25]);
    }

    #[test]
    fn test_float_wav() {
        let dir = tempfile::tempdir().unwrap();
        let samples = [0.25f32, -0.75, -0.125, 0.5];
        let path = write_wav(dir.path(), "f32.wav", 2, 32, hound::SampleFormat::Float, &samples);

        assert_both_strategies(&path, &[0.25, 0.75], (1, 2), &[0.125, 0.5]);
    }

    #[test]
    fn test_float_wav_with_infinite_sample() {
        let dir = tempfile::tempdir().unwrap();
        let samples = [0.25f32, f32::INFINITY, f32::NEG_INFINITY, 0.5];
        let path = write_wav(dir.path(), "inf.wav", 2, 32, hound::SampleFormat::Float, &samples);

        assert_both_strategies(&path, &[0.25, 0.5], (0, 1), &[0.25, 0.0]);
    }

    #[test]
    fn test_duration_from_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_wav_i16(dir.path(), "second.wav", 1, &vec![0; 44100]);

        let source = open_source(&path, AccessStrategy::DiskStreaming).unwrap();
        assert_eq!(source.duration(), Duration::from_secs(1));
    }

    #[test]
    fn test_strategy_serde_names() {
        let yaml = serde_yaml::to_string(&AccessStrategy::DiskStreaming).unwrap();
        assert_eq!(yaml.trim(), "disk_streaming");
        let parsed: AccessStrategy = serde_yaml::from_str("full_cache").unwrap();
        assert_eq!(parsed, AccessStrategy::FullCache);
    }
}
