//! On-demand disk access strategy

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{
    accumulate_peaks, clip_region, AccessStrategy, AudioSource, SourceError, SourceResult,
};
use crate::audio_file::{WavFormat, WavReader};
use crate::types::ChannelLayout;

/// Frames decoded per read while scanning large regions
///
/// Bounds memory regardless of how wide a single pixel column is.
const SCAN_CHUNK_FRAMES: u64 = 65_536;

/// Source that seeks into the file for every query
pub struct DiskStreamingSource {
    path: PathBuf,
    format: WavFormat,
    total_frames: u64,
    reader: Mutex<WavReader>,
    /// Whole-file peak, computed on first request
    global_peak: Mutex<Option<Vec<f32>>>,
}

impl std::fmt::Debug for DiskStreamingSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskStreamingSource")
            .field("path", &self.path)
            .field("format", &self.format)
            .field("total_frames", &self.total_frames)
            .finish()
    }
}

impl DiskStreamingSource {
    /// Open a WAV file for streaming access
    ///
    /// Only the header is read. Non-WAV containers are rejected with `Open`:
    /// they have to be transcoded first or opened with the full-cache strategy.
    pub fn open<P: AsRef<Path>>(path: P) -> SourceResult<Self> {
        let reader = WavReader::open(path.as_ref())?;
        let format = reader.format().clone();
        let total_frames = reader.frame_count();

        Ok(Self {
            path: path.as_ref().to_path_buf(),
            format,
            total_frames,
            reader: Mutex::new(reader),
            global_peak: Mutex::new(None),
        })
    }

    fn scan(&self, start: u64, end: u64) -> SourceResult<Vec<f32>> {
        let mut peaks = vec![0.0; self.format.channels()];
        let mut reader = self
            .reader
            .lock()
            .map_err(|_| SourceError::Read("reader lock poisoned".into()))?;

        let mut pos = start;
        while pos < end {
            let count = (end - pos).min(SCAN_CHUNK_FRAMES);
            let samples = reader.read_frames(pos, count)?;
            accumulate_peaks(&samples, &mut peaks);
            pos += count;
        }
        Ok(peaks)
    }
}

impl AudioSource for DiskStreamingSource {
    fn path(&self) -> &Path {
        &self.path
    }

    fn strategy(&self) -> AccessStrategy {
        AccessStrategy::DiskStreaming
    }

    fn layout(&self) -> ChannelLayout {
        self.format.layout
    }

    fn total_frame_count(&self) -> u64 {
        self.total_frames
    }

    fn sample_rate(&self) -> u32 {
        self.format.sample_rate
    }

    fn peak_for_region(&self, start: u64, end: u64) -> SourceResult<Vec<f32>> {
        let (start, end) = clip_region(start, end, self.total_frames)?;
        self.scan(start, end)
    }

    fn global_peak(&self) -> SourceResult<Vec<f32>> {
        let mut cached = self
            .global_peak
            .lock()
            .map_err(|_| SourceError::Read("peak cache lock poisoned".into()))?;
        if let Some(peak) = cached.as_ref() {
            return Ok(peak.clone());
        }

        let start_time = std::time::Instant::now();
        let peak = self.scan(0, self.total_frames)?;
        log::debug!(
            "DiskStreamingSource: global peak of {:?} scanned in {:?}",
            self.path,
            start_time.elapsed()
        );
        *cached = Some(peak.clone());
        Ok(peak)
    }
}
