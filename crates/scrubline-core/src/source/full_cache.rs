//! In-memory access strategy

use std::path::{Path, PathBuf};

use super::{
    accumulate_peaks, clip_region, AccessStrategy, AudioSource, SourceError, SourceResult,
};
use crate::audio_file::{decode_file, is_riff_file, WavReader};
use crate::types::ChannelLayout;

/// Source holding the entire decoded file in memory
pub struct FullCacheSource {
    path: PathBuf,
    layout: ChannelLayout,
    sample_rate: u32,
    /// Interleaved samples in [-1, 1]
    samples: Vec<f32>,
    global_peak: Vec<f32>,
}

impl std::fmt::Debug for FullCacheSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FullCacheSource")
            .field("path", &self.path)
            .field("layout", &self.layout)
            .field("sample_rate", &self.sample_rate)
            .field("samples", &format!("<{} samples>", self.samples.len()))
            .field("global_peak", &self.global_peak)
            .finish()
    }
}

impl FullCacheSource {
    /// Decode `path` completely
    ///
    /// WAV files go through the same reader as the disk-streaming strategy;
    /// anything else is handed to symphonia. RIFF files in encodings the WAV
    /// reader does not handle (64-bit float, ADPCM, ...) also fall back to
    /// symphonia.
    pub fn open<P: AsRef<Path>>(path: P) -> SourceResult<Self> {
        let path = path.as_ref();
        let start_time = std::time::Instant::now();

        let riff = is_riff_file(path).map_err(|e| SourceError::open(path, e))?;
        let (layout, sample_rate, samples) = if riff {
            match WavReader::open(path) {
                Ok(mut reader) => {
                    let format = reader.format().clone();
                    let samples = reader.read_frames(0, reader.frame_count())?;
                    (format.layout, format.sample_rate, samples)
                }
                Err(SourceError::Open { reason, .. }) => {
                    log::debug!(
                        "FullCacheSource: {:?} not readable as PCM WAV ({}), trying symphonia",
                        path,
                        reason
                    );
                    // Report the WAV reader's reason if symphonia cannot help either
                    let decoded = decode_file(path).map_err(|e| {
                        log::debug!("FullCacheSource: symphonia fallback failed: {}", e);
                        SourceError::open(path, reason)
                    })?;
                    (decoded.layout, decoded.sample_rate, decoded.samples)
                }
                Err(e) => return Err(e),
            }
        } else {
            let decoded = decode_file(path)?;
            (decoded.layout, decoded.sample_rate, decoded.samples)
        };

        let source = Self::from_interleaved(path, layout, sample_rate, samples);
        log::debug!(
            "FullCacheSource: cached {:?} in {:?} ({} frames, {} bytes)",
            path,
            start_time.elapsed(),
            source.total_frame_count(),
            source.memory_usage()
        );
        Ok(source)
    }

    /// Wrap already-decoded interleaved samples
    ///
    /// Trailing samples that do not form a whole frame are dropped.
    pub fn from_interleaved(
        path: impl Into<PathBuf>,
        layout: ChannelLayout,
        sample_rate: u32,
        mut samples: Vec<f32>,
    ) -> Self {
        let channels = layout.count();
        samples.truncate(samples.len() - samples.len() % channels);

        let mut global_peak = vec![0.0; channels];
        accumulate_peaks(&samples, &mut global_peak);

        Self {
            path: path.into(),
            layout,
            sample_rate,
            samples,
            global_peak,
        }
    }

    /// Approximate heap usage of the cached samples in bytes
    pub fn memory_usage(&self) -> usize {
        self.samples.len() * std::mem::size_of::<f32>()
    }
}

impl AudioSource for FullCacheSource {
    fn path(&self) -> &Path {
        &self.path
    }

    fn strategy(&self) -> AccessStrategy {
        AccessStrategy::FullCache
    }

    fn layout(&self) -> ChannelLayout {
        self.layout
    }

    fn total_frame_count(&self) -> u64 {
        (self.samples.len() / self.layout.count()) as u64
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn peak_for_region(&self, start: u64, end: u64) -> SourceResult<Vec<f32>> {
        let (start, end) = clip_region(start, end, self.total_frame_count())?;
        let channels = self.layout.count();

        let mut peaks = vec![0.0; channels];
        let region = &self.samples[start as usize * channels..end as usize * channels];
        accumulate_peaks(region, &mut peaks);
        Ok(peaks)
    }

    fn global_peak(&self) -> SourceResult<Vec<f32>> {
        Ok(self.global_peak.clone())
    }
}
