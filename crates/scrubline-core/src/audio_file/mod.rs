//! RIFF/RF64 WAV file handling
//!
//! Reads the `fmt ` and `data` chunks of a WAV file and decodes arbitrary
//! frame ranges to interleaved `f32` samples. Both access strategies go
//! through [`WavReader::read_frames`], so a region decoded from disk is
//! bit-identical to the same region decoded into the full cache.

mod decode;

pub use decode::{decode_file, DecodedAudio};

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::source::{SourceError, SourceResult};
use crate::types::ChannelLayout;

/// WAVE_FORMAT_PCM
const FORMAT_PCM: u16 = 1;
/// WAVE_FORMAT_IEEE_FLOAT
const FORMAT_FLOAT: u16 = 3;
/// WAVE_FORMAT_EXTENSIBLE (real tag lives in the sub-format GUID)
const FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// Sample encodings the reader can decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleEncoding {
    /// 8-bit unsigned PCM (what ffmpeg's `pcm_u8` produces)
    U8,
    I16,
    I24,
    I32,
    F32,
}

impl SampleEncoding {
    fn from_header(format_tag: u16, bits_per_sample: u16) -> Option<Self> {
        match (format_tag, bits_per_sample) {
            (FORMAT_PCM, 8) => Some(SampleEncoding::U8),
            (FORMAT_PCM, 16) => Some(SampleEncoding::I16),
            (FORMAT_PCM, 24) => Some(SampleEncoding::I24),
            (FORMAT_PCM, 32) => Some(SampleEncoding::I32),
            (FORMAT_FLOAT, 32) => Some(SampleEncoding::F32),
            _ => None,
        }
    }

    /// Bytes per sample for one channel
    pub fn bytes(self) -> usize {
        match self {
            SampleEncoding::U8 => 1,
            SampleEncoding::I16 => 2,
            SampleEncoding::I24 => 3,
            SampleEncoding::I32 | SampleEncoding::F32 => 4,
        }
    }
}

/// Audio format information from the fmt chunk
#[derive(Debug, Clone, PartialEq)]
pub struct WavFormat {
    pub layout: ChannelLayout,
    pub sample_rate: u32,
    pub encoding: SampleEncoding,
    /// Bytes per sample frame (channels * bytes per sample)
    pub block_align: u16,
}

impl WavFormat {
    pub fn channels(&self) -> usize {
        self.layout.count()
    }
}

/// Returns true if the file starts with a RIFF or RF64 header
///
/// Used to route WAV files to [`WavReader`] and everything else to symphonia.
pub fn is_riff_file<P: AsRef<Path>>(path: P) -> std::io::Result<bool> {
    let mut file = File::open(path)?;
    let mut id = [0u8; 4];
    match file.read_exact(&mut id) {
        Ok(()) => Ok(&id == b"RIFF" || &id == b"RF64"),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}

/// Seekable WAV reader
pub struct WavReader {
    path: PathBuf,
    reader: BufReader<File>,
    format: WavFormat,
    data_offset: u64,
    data_size: u64,
}

impl std::fmt::Debug for WavReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WavReader")
            .field("path", &self.path)
            .field("format", &self.format)
            .field("data_offset", &self.data_offset)
            .field("data_size", &self.data_size)
            .finish()
    }
}

impl WavReader {
    /// Open a WAV file and parse its header
    ///
    /// Fails with `Open` for anything that is not a readable RIFF/RF64 WAVE
    /// file in a supported encoding, and with `UnsupportedFormat` for channel
    /// counts other than 1 or 2.
    pub fn open<P: AsRef<Path>>(path: P) -> SourceResult<Self> {
        let path = path.as_ref().to_path_buf();

        let file = File::open(&path).map_err(|e| SourceError::open(&path, e))?;
        let file_len = file.metadata().map_err(|e| SourceError::open(&path, e))?.len();
        let mut reader = BufReader::new(file);

        let mut riff_id = [0u8; 4];
        reader.read_exact(&mut riff_id).map_err(|e| SourceError::open(&path, e))?;
        let is_rf64 = match &riff_id {
            b"RIFF" => false,
            b"RF64" => true,
            _ => return Err(SourceError::open(&path, "Not a RIFF/RF64 file")),
        };

        // RIFF size (placeholder for RF64)
        let mut size_bytes = [0u8; 4];
        reader.read_exact(&mut size_bytes).map_err(|e| SourceError::open(&path, e))?;

        let mut wave_id = [0u8; 4];
        reader.read_exact(&mut wave_id).map_err(|e| SourceError::open(&path, e))?;
        if &wave_id != b"WAVE" {
            return Err(SourceError::open(&path, "Not a WAVE file"));
        }

        let mut rf64_data_size: Option<u64> = None;
        let mut format: Option<WavFormat> = None;
        let mut data_offset: Option<u64> = None;
        let mut data_size: Option<u64> = None;

        loop {
            let mut chunk_id = [0u8; 4];
            if reader.read_exact(&mut chunk_id).is_err() {
                break;
            }
            let mut chunk_size_bytes = [0u8; 4];
            if reader.read_exact(&mut chunk_size_bytes).is_err() {
                break;
            }
            let chunk_size = u32::from_le_bytes(chunk_size_bytes) as u64;

            match &chunk_id {
                b"ds64" if is_rf64 => {
                    let mut ds64 = vec![0u8; chunk_size as usize];
                    reader.read_exact(&mut ds64).map_err(|e| SourceError::open(&path, e))?;
                    if ds64.len() >= 16 {
                        let mut bytes = [0u8; 8];
                        bytes.copy_from_slice(&ds64[8..16]);
                        rf64_data_size = Some(u64::from_le_bytes(bytes));
                    }
                }
                b"fmt " => {
                    format = Some(Self::read_fmt_chunk(&mut reader, chunk_size, &path)?);
                }
                b"data" => {
                    let offset = reader.stream_position().map_err(|e| SourceError::open(&path, e))?;
                    let declared = match rf64_data_size {
                        Some(size) if is_rf64 => size,
                        _ => chunk_size,
                    };
                    // Truncated or still-being-written files: trust the file length
                    let available = file_len.saturating_sub(offset);
                    data_offset = Some(offset);
                    data_size = Some(declared.min(available));

                    if format.is_some() {
                        // Nothing after the data chunk is needed
                        break;
                    }
                    reader
                        .seek(SeekFrom::Current(declared.min(available) as i64))
                        .map_err(|e| SourceError::open(&path, e))?;
                }
                _ => {
                    reader
                        .seek(SeekFrom::Current(chunk_size as i64))
                        .map_err(|e| SourceError::open(&path, e))?;
                }
            }

            // Pad to word boundary
            if chunk_size % 2 != 0 {
                reader.seek(SeekFrom::Current(1)).map_err(|e| SourceError::open(&path, e))?;
            }
        }

        let format = format.ok_or_else(|| SourceError::open(&path, "Missing fmt chunk"))?;
        let data_offset =
            data_offset.ok_or_else(|| SourceError::open(&path, "Missing data chunk"))?;
        let data_size = data_size.unwrap_or(0);

        log::debug!(
            "WavReader: opened {:?} ({:?}, {} Hz, {:?}, {} frames)",
            path,
            format.layout,
            format.sample_rate,
            format.encoding,
            data_size / format.block_align as u64
        );

        Ok(Self {
            path,
            reader,
            format,
            data_offset,
            data_size,
        })
    }

    fn read_fmt_chunk(
        reader: &mut BufReader<File>,
        size: u64,
        path: &Path,
    ) -> SourceResult<WavFormat> {
        if size < 16 {
            return Err(SourceError::open(path, "fmt chunk too small"));
        }

        let mut fmt_data = vec![0u8; size as usize];
        reader
            .read_exact(&mut fmt_data)
            .map_err(|e| SourceError::open(path, e))?;

        let mut format_tag = u16::from_le_bytes([fmt_data[0], fmt_data[1]]);
        let channels = u16::from_le_bytes([fmt_data[2], fmt_data[3]]);
        let sample_rate = u32::from_le_bytes([fmt_data[4], fmt_data[5], fmt_data[6], fmt_data[7]]);
        let block_align = u16::from_le_bytes([fmt_data[12], fmt_data[13]]);
        let bits_per_sample = u16::from_le_bytes([fmt_data[14], fmt_data[15]]);

        if format_tag == FORMAT_EXTENSIBLE {
            // cbSize(2) validBits(2) channelMask(4) then the sub-format GUID,
            // whose first two bytes are the actual format tag
            if fmt_data.len() < 26 {
                return Err(SourceError::open(path, "Truncated WAVE_FORMAT_EXTENSIBLE header"));
            }
            format_tag = u16::from_le_bytes([fmt_data[24], fmt_data[25]]);
        }

        let layout =
            ChannelLayout::from_count(channels).ok_or(SourceError::UnsupportedFormat { channels })?;

        let encoding = SampleEncoding::from_header(format_tag, bits_per_sample).ok_or_else(|| {
            SourceError::open(
                path,
                format!(
                    "Unsupported encoding (format tag {}, {} bits)",
                    format_tag, bits_per_sample
                ),
            )
        })?;

        if sample_rate == 0 {
            return Err(SourceError::open(path, "Sample rate is zero"));
        }
        if block_align as usize != encoding.bytes() * layout.count() {
            return Err(SourceError::open(
                path,
                format!("Inconsistent block align {}", block_align),
            ));
        }

        Ok(WavFormat {
            layout,
            sample_rate,
            encoding,
            block_align,
        })
    }

    pub fn format(&self) -> &WavFormat {
        &self.format
    }

    /// Number of complete sample frames in the data chunk
    pub fn frame_count(&self) -> u64 {
        self.data_size / self.format.block_align as u64
    }

    /// Decode `count` frames starting at `start` into interleaved samples
    ///
    /// The range is clipped to the end of the data chunk.
    pub fn read_frames(&mut self, start: u64, count: u64) -> SourceResult<Vec<f32>> {
        let total = self.frame_count();
        let start = start.min(total);
        let count = count.min(total - start);
        if count == 0 {
            return Ok(Vec::new());
        }

        let block_align = self.format.block_align as u64;
        self.reader
            .seek(SeekFrom::Start(self.data_offset + start * block_align))
            .map_err(|e| SourceError::Read(e.to_string()))?;

        let mut bytes = vec![0u8; (count * block_align) as usize];
        self.reader
            .read_exact(&mut bytes)
            .map_err(|e| SourceError::Read(e.to_string()))?;

        let mut samples = Vec::with_capacity(count as usize * self.format.channels());
        decode_samples(&bytes, self.format.encoding, &mut samples);
        Ok(samples)
    }
}

/// Convert raw little-endian sample bytes to `f32` in [-1, 1]
pub fn decode_samples(bytes: &[u8], encoding: SampleEncoding, out: &mut Vec<f32>) {
    match encoding {
        SampleEncoding::U8 => {
            out.extend(bytes.iter().map(|&b| (b as f32 - 128.0) / 128.0));
        }
        SampleEncoding::I16 => {
            out.extend(
                bytes
                    .chunks_exact(2)
                    .map(|c| i16::from_le_bytes([c[0], c[1]]) as f32 / 32768.0),
            );
        }
        SampleEncoding::I24 => {
            out.extend(bytes.chunks_exact(3).map(|c| {
                // Sign-extend via the top byte of an i32
                let v = i32::from_le_bytes([0, c[0], c[1], c[2]]) >> 8;
                v as f32 / 8_388_608.0
            }));
        }
        SampleEncoding::I32 => {
            out.extend(
                bytes
                    .chunks_exact(4)
                    .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]) as f32 / 2_147_483_648.0),
            );
        }
        SampleEncoding::F32 => {
            out.extend(
                bytes
                    .chunks_exact(4)
                    .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]])),
            );
        }
    }
}
