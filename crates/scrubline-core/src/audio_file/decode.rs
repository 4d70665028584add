//! Whole-file decoding for non-WAV containers
//!
//! FLAC, MP3, Ogg/Vorbis and friends are decoded in one pass with symphonia.
//! Only the full-cache strategy uses this path: those containers cannot be
//! sliced by frame offset the way a PCM data chunk can.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::source::{SourceError, SourceResult};
use crate::types::ChannelLayout;

/// Fully decoded audio, interleaved
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub layout: ChannelLayout,
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

/// Decode an entire file with symphonia
pub fn decode_file(path: &Path) -> SourceResult<DecodedAudio> {
    let file = File::open(path).map_err(|e| SourceError::open(path, e))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| SourceError::open(path, e))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| SourceError::open(path, "No audio track found"))?;
    let track_id = track.id;

    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| SourceError::open(path, "Unknown sample rate"))?;

    // Reject unsupported layouts before spending time decoding
    let declared_channels = track.codec_params.channels.map(|c| c.count() as u16);
    if let Some(channels) = declared_channels {
        ChannelLayout::from_count(channels).ok_or(SourceError::UnsupportedFormat { channels })?;
    }

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| SourceError::open(path, e))?;

    let mut samples: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut channels = declared_channels;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => {
                log::warn!("decode_file: error reading packet from {:?}: {}", path, e);
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                log::warn!("decode_file: skipping corrupt packet in {:?}: {}", path, e);
                continue;
            }
            Err(e) => return Err(SourceError::Read(e.to_string())),
        };

        let spec = *decoded.spec();
        let packet_channels = spec.channels.count() as u16;
        match channels {
            None => channels = Some(packet_channels),
            Some(c) if c != packet_channels => {
                return Err(SourceError::Read(format!(
                    "Channel count changed mid-stream ({} -> {})",
                    c, packet_channels
                )));
            }
            Some(_) => {}
        }

        let needed = decoded.capacity() * packet_channels as usize;
        if sample_buf.as_ref().map_or(true, |buf| buf.capacity() < needed) {
            sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
        }

        if let Some(ref mut buf) = sample_buf {
            buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buf.samples());
        }
    }

    let channels = channels.ok_or_else(|| SourceError::open(path, "No decodable audio"))?;
    let layout =
        ChannelLayout::from_count(channels).ok_or(SourceError::UnsupportedFormat { channels })?;

    log::debug!(
        "decode_file: {:?} decoded to {} frames ({:?}, {} Hz)",
        path,
        samples.len() / layout.count(),
        layout,
        sample_rate
    );

    Ok(DecodedAudio {
        layout,
        sample_rate,
        samples,
    })
}
