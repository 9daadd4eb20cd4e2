//! Audio file I/O for Lofi
//!
//! Decoder and encoder collaborators at the pipeline boundary. Input is any
//! mono or stereo file symphonia can probe (WAV, MP3, FLAC, Ogg Vorbis,
//! AAC/M4A); output is always 16-bit PCM WAV at the buffer's own sample rate.

use std::fs::File;
use std::io;
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use log::{debug, warn};
use symphonia::core::audio::{SampleBuffer as DecodedSamples, SignalSpec};
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::{MetadataOptions, MetadataRevision, StandardTagKey};
use symphonia::core::probe::{Hint, ProbeResult};
use symphonia::default::{get_codecs, get_probe};

use crate::engine::buffer::{ChannelLayout, SampleBuffer};
use crate::error::{LofiError, Result};

/// Bit depth of every exported file
pub const EXPORT_BIT_DEPTH: u16 = 16;

/// File extensions picked up when a directory is given as input
pub const SUPPORTED_EXTENSIONS: &[&str] = &["wav", "mp3", "flac", "ogg", "m4a", "aac"];

/// Decode an audio file into a sample buffer
///
/// The container is detected from its content, with the extension as a hint.
/// Sample rate and channel layout are preserved exactly; the pipeline never
/// resamples on import. Packets the codec rejects are skipped with a warning.
///
/// # Errors
/// * `FileNotFound` - If the file does not exist
/// * `DecodeFailure` - If the file is not a readable mono/stereo audio file
pub fn decode_audio(path: &Path) -> Result<SampleBuffer> {
    let probed = probe_file(path)?;
    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| decode_failure(path, "no audio track"))?;
    let track_id = track.id;
    let declared_spec = match (track.codec_params.sample_rate, track.codec_params.channels) {
        (Some(rate), Some(channels)) => Some(SignalSpec::new(rate, channels)),
        _ => None,
    };
    let mut decoder = get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| decode_error(path, "unsupported codec", e))?;

    let mut stream_spec: Option<SignalSpec> = None;
    let mut scratch: Option<DecodedSamples<f32>> = None;
    let mut interleaved = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(e) => return Err(decode_error(path, "failed to read packet", e)),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(reason)) => {
                warn!("{}: skipping undecodable packet ({})", path.display(), reason);
                continue;
            }
            Err(e) => return Err(decode_error(path, "failed to decode packet", e)),
        };

        let spec = *decoded.spec();
        match stream_spec {
            None => {
                layout_for(path, &spec)?;
                stream_spec = Some(spec);
            }
            Some(first)
                if first.rate != spec.rate || first.channels.count() != spec.channels.count() =>
            {
                return Err(decode_failure(path, "signal format changes mid-stream"));
            }
            Some(_) => {}
        }

        let needed = decoded.capacity() * spec.channels.count();
        if scratch.as_ref().map_or(true, |buf| buf.capacity() < needed) {
            scratch = Some(DecodedSamples::new(decoded.capacity() as u64, spec));
        }
        if let Some(buf) = scratch.as_mut() {
            buf.copy_interleaved_ref(decoded);
            interleaved.extend_from_slice(buf.samples());
        }
    }

    let spec = stream_spec
        .or(declared_spec)
        .ok_or_else(|| decode_failure(path, "unknown sample rate or channel count"))?;
    let layout = layout_for(path, &spec)?;

    let buffer = SampleBuffer::from_interleaved(&interleaved, layout, spec.rate).map_err(|e| {
        LofiError::DecodeFailure {
            path: path.display().to_string(),
            reason: e.to_string(),
            source: Some(Box::new(e)),
        }
    })?;

    debug!(
        "decoded {}: {} Hz, {} channel(s), {} frames",
        path.display(),
        buffer.sample_rate,
        buffer.channels(),
        buffer.frames()
    );

    Ok(buffer)
}

/// Read the embedded track title (ID3, RIFF INFO, Vorbis comment, ...)
///
/// Tags found while probing (e.g. an ID3v2 block in front of MP3 frames) take
/// precedence over tags stored inside the container.
pub fn read_title_tag(path: &Path) -> Result<Option<String>> {
    let mut probed = probe_file(path)?;

    if let Some(title) = probed
        .metadata
        .get()
        .and_then(|metadata| metadata.current().and_then(title_from_revision))
    {
        return Ok(Some(title));
    }

    Ok(probed
        .format
        .metadata()
        .current()
        .and_then(title_from_revision))
}

/// Encode a sample buffer as 16-bit PCM WAV
///
/// Samples beyond full scale are clamped.
pub fn encode_wav(buffer: &SampleBuffer, path: &Path) -> Result<()> {
    let spec = WavSpec {
        channels: buffer.channels() as u16,
        sample_rate: buffer.sample_rate,
        bits_per_sample: EXPORT_BIT_DEPTH,
        sample_format: SampleFormat::Int,
    };

    let mut writer =
        WavWriter::create(path, spec).map_err(|e| encode_error(path, "failed to create file", e))?;

    for sample in buffer.to_i16_interleaved() {
        writer
            .write_sample(sample)
            .map_err(|e| encode_error(path, "failed to write sample", e))?;
    }

    writer
        .finalize()
        .map_err(|e| encode_error(path, "failed to finalize file", e))?;

    debug!(
        "encoded {}: {} frames at {} Hz",
        path.display(),
        buffer.frames(),
        buffer.sample_rate
    );

    Ok(())
}

/// Generate a mono sine test tone with unit amplitude
pub fn generate_test_tone(frequency: f32, duration_secs: f32, sample_rate: u32) -> SampleBuffer {
    let num_frames = (duration_secs * sample_rate as f32) as usize;
    let mut buffer = SampleBuffer::new(num_frames, ChannelLayout::Mono, sample_rate);

    let angular_freq = 2.0 * std::f32::consts::PI * frequency / sample_rate as f32;

    for (i, sample) in buffer.samples[0].iter_mut().enumerate() {
        *sample = (angular_freq * i as f32).sin();
    }

    buffer
}

/// Generate a stereo test tone with a different frequency per channel
pub fn generate_stereo_test_tone(
    freq_left: f32,
    freq_right: f32,
    duration_secs: f32,
    sample_rate: u32,
) -> SampleBuffer {
    let num_frames = (duration_secs * sample_rate as f32) as usize;
    let mut buffer = SampleBuffer::new(num_frames, ChannelLayout::Stereo, sample_rate);

    let angular_freq_l = 2.0 * std::f32::consts::PI * freq_left / sample_rate as f32;
    let angular_freq_r = 2.0 * std::f32::consts::PI * freq_right / sample_rate as f32;

    for (i, sample) in buffer.samples[0].iter_mut().enumerate() {
        *sample = (angular_freq_l * i as f32).sin();
    }

    for (i, sample) in buffer.samples[1].iter_mut().enumerate() {
        *sample = (angular_freq_r * i as f32).sin();
    }

    buffer
}

// ============================================================================
// Internal helper functions
// ============================================================================

fn probe_file(path: &Path) -> Result<ProbeResult> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            LofiError::FileNotFound {
                path: path.display().to_string(),
                source: Some(e),
            }
        } else {
            LofiError::Io(e)
        }
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(ext);
    }

    get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| decode_error(path, "unrecognized audio format", e))
}

fn title_from_revision(revision: &MetadataRevision) -> Option<String> {
    revision
        .tags()
        .iter()
        .find(|tag| tag.std_key == Some(StandardTagKey::TrackTitle))
        .map(|tag| tag.value.to_string().trim_end_matches('\0').trim().to_string())
        .filter(|title| !title.is_empty())
}

fn layout_for(path: &Path, spec: &SignalSpec) -> Result<ChannelLayout> {
    let channels = spec.channels.count();
    ChannelLayout::from_count(channels).ok_or_else(|| {
        decode_failure(
            path,
            format!("{}-channel audio (only mono/stereo supported)", channels),
        )
    })
}

fn decode_failure(path: &Path, reason: impl Into<String>) -> LofiError {
    LofiError::DecodeFailure {
        path: path.display().to_string(),
        reason: reason.into(),
        source: None,
    }
}

fn decode_error(path: &Path, reason: &str, err: SymphoniaError) -> LofiError {
    LofiError::DecodeFailure {
        path: path.display().to_string(),
        reason: format!("{}: {}", reason, err),
        source: Some(Box::new(err)),
    }
}

fn encode_error(path: &Path, reason: &str, err: hound::Error) -> LofiError {
    LofiError::EncodeFailure {
        path: path.display().to_string(),
        reason: format!("{}: {}", reason, err),
        source: Some(Box::new(err)),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_generate_test_tone() {
        let buffer = generate_test_tone(440.0, 1.0, 44100);

        assert_eq!(buffer.frames(), 44100);
        assert_eq!(buffer.channels(), 1);

        // Half a cycle in, the tone crosses zero
        let zero_crossing = (44100.0 / 440.0 / 2.0) as usize;
        assert!(buffer.samples[0][zero_crossing].abs() < 0.1);
    }

    #[test]
    fn test_generate_stereo_test_tone() {
        let buffer = generate_stereo_test_tone(440.0, 880.0, 0.5, 44100);

        assert_eq!(buffer.frames(), 22050);
        assert_eq!(buffer.channels(), 2);
        assert!((buffer.samples[0][100] - buffer.samples[1][100]).abs() > 0.01);
    }

    #[test]
    fn test_round_trip_mono() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test_mono.wav");

        let original = generate_test_tone(440.0, 0.25, 44100);
        encode_wav(&original, &path).unwrap();
        let decoded = decode_audio(&path).unwrap();

        assert_eq!(decoded.sample_rate, 44100);
        assert_eq!(decoded.channels(), 1);
        assert_eq!(decoded.frames(), original.frames());

        for (orig, dec) in original.samples[0].iter().zip(decoded.samples[0].iter()) {
            // 16-bit quantization error is at most half a step
            assert!((orig - dec).abs() < 1e-4, "Sample mismatch: {} vs {}", orig, dec);
        }
    }

    #[test]
    fn test_round_trip_stereo_keeps_rate() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test_stereo.wav");

        let original = generate_stereo_test_tone(440.0, 880.0, 0.25, 22050);
        encode_wav(&original, &path).unwrap();
        let decoded = decode_audio(&path).unwrap();

        assert_eq!(decoded.sample_rate, 22050);
        assert_eq!(decoded.channels(), 2);
        assert_eq!(decoded.frames(), original.frames());
    }

    #[test]
    fn test_decode_float_wav() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("float.wav");

        let spec = WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for s in [0.0_f32, 0.5, -0.25] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let decoded = decode_audio(&path).unwrap();
        assert_eq!(decoded.samples[0], vec![0.0, 0.5, -0.25]);
    }

    #[test]
    fn test_decode_nonexistent_file() {
        match decode_audio(Path::new("/nonexistent/path/audio.wav")) {
            Err(LofiError::FileNotFound { path, .. }) => assert!(path.contains("nonexistent")),
            other => panic!("Expected FileNotFound error, got: {:?}", other),
        }
    }

    /// ID3v2.3 tag holding a single TIT2 frame
    fn id3_title_tag(title: &str) -> Vec<u8> {
        let mut frame = Vec::new();
        frame.extend_from_slice(b"TIT2");
        frame.extend_from_slice(&((title.len() + 1) as u32).to_be_bytes());
        frame.extend_from_slice(&[0, 0]);
        frame.push(0); // ISO-8859-1
        frame.extend_from_slice(title.as_bytes());

        // Tag size is a 28-bit synchsafe integer
        let size = frame.len() as u32;
        let mut tag = Vec::new();
        tag.extend_from_slice(b"ID3");
        tag.extend_from_slice(&[3, 0, 0]);
        tag.extend_from_slice(&[
            ((size >> 21) & 0x7f) as u8,
            ((size >> 14) & 0x7f) as u8,
            ((size >> 7) & 0x7f) as u8,
            (size & 0x7f) as u8,
        ]);
        tag.extend_from_slice(&frame);
        tag
    }

    /// Silent MPEG-1 Layer III stream: 128 kbps, 44.1 kHz, stereo
    fn silent_mp3_frames(count: usize) -> Vec<u8> {
        const FRAME_LEN: usize = 144 * 128_000 / 44_100;
        let mut frame = vec![0u8; FRAME_LEN];
        frame[..4].copy_from_slice(&[0xFF, 0xFB, 0x90, 0x00]);
        frame.repeat(count)
    }

    #[test]
    fn test_decode_mp3_with_id3_title() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("song.mp3");
        let mut bytes = id3_title_tag("Rainy Window");
        bytes.extend_from_slice(&silent_mp3_frames(12));
        std::fs::write(&path, bytes).unwrap();

        let decoded = decode_audio(&path).unwrap();
        assert_eq!(decoded.sample_rate, 44100);
        assert_eq!(decoded.channels(), 2);
        assert!(decoded.frames() > 0);
        assert!(decoded.peak() < 1e-3);

        assert_eq!(
            read_title_tag(&path).unwrap().as_deref(),
            Some("Rainy Window")
        );
    }

    #[test]
    fn test_title_tag_absent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plain.wav");
        encode_wav(&generate_test_tone(440.0, 0.05, 8000), &path).unwrap();

        assert_eq!(read_title_tag(&path).unwrap(), None);
    }

    #[test]
    fn test_decode_garbage_is_decode_failure() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("not_audio.wav");
        std::fs::write(&path, b"definitely not a RIFF file").unwrap();

        let err = decode_audio(&path).unwrap_err();
        assert_eq!(err.error_code(), "DECODE_FAILURE");
    }

    #[test]
    fn test_decode_rejects_multichannel() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("surround.wav");

        let spec = WavSpec {
            channels: 6,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for _ in 0..12 {
            writer.write_sample(0_i16).unwrap();
        }
        writer.finalize().unwrap();

        assert!(matches!(
            decode_audio(&path),
            Err(LofiError::DecodeFailure { .. })
        ));
    }
}
