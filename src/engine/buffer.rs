//! Sample Buffer Management
//!
//! Provides the PCM buffer that flows through the lofi pipeline. Samples are
//! stored de-interleaved as 32-bit floats where `FULL_SCALE` (1.0) is the
//! largest amplitude a 16-bit export can represent.

use crate::error::{LofiError, Result};

// ============================================================================
// Constants
// ============================================================================

/// Largest representable amplitude in the internal float format
pub const FULL_SCALE: f32 = 1.0;

/// 16-bit integer value that `FULL_SCALE` maps to on export
pub const I16_FULL_SCALE: f32 = 32767.0;

/// Smallest peak a stage will scale up; anything below is treated as silence
pub const SILENCE_FLOOR: f32 = f32::MIN_POSITIVE;

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert decibels to linear amplitude
///
/// # Arguments
/// * `db` - Value in decibels
///
/// # Returns
/// Linear amplitude (0.0 to 1.0+ range)
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert linear amplitude to decibels
///
/// # Returns
/// Value in decibels. Returns -f32::INFINITY for zero input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

// ============================================================================
// Channel Layout
// ============================================================================

/// Audio channel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelLayout {
    /// Single channel (mono)
    Mono,
    /// Two channels (stereo: left, right)
    #[default]
    Stereo,
}

impl ChannelLayout {
    /// Returns the number of channels for this layout
    pub fn num_channels(&self) -> usize {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Stereo => 2,
        }
    }

    /// Create a ChannelLayout from a channel count
    pub fn from_count(count: usize) -> Option<Self> {
        match count {
            1 => Some(ChannelLayout::Mono),
            2 => Some(ChannelLayout::Stereo),
            _ => None,
        }
    }
}

// ============================================================================
// Sample Buffer
// ============================================================================

/// PCM buffer for one track
///
/// Each channel is a separate `Vec<f32>`; index `i` of every channel forms
/// frame `i`.
///
/// # Example
/// ```
/// use lofi::engine::buffer::{ChannelLayout, SampleBuffer};
///
/// // One second of stereo silence at 44.1kHz
/// let buffer = SampleBuffer::new(44100, ChannelLayout::Stereo, 44100);
/// assert_eq!(buffer.channels(), 2);
/// assert_eq!(buffer.frames(), 44100);
/// ```
///
/// Channels can only be supplied through the checked constructors:
///
/// ```compile_fail
/// use lofi::engine::SampleBuffer;
///
/// let ragged = SampleBuffer {
///     samples: vec![vec![0.0; 3], vec![0.0; 2]],
///     sample_rate: 8000,
/// };
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    /// Sample data: outer Vec is channels, inner Vec is frames
    pub(crate) samples: Vec<Vec<f32>>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl SampleBuffer {
    /// Create a new silent buffer
    ///
    /// # Arguments
    /// * `num_frames` - Number of frames (samples per channel)
    /// * `layout` - Channel configuration (Mono or Stereo)
    /// * `sample_rate` - Sample rate in Hz
    pub fn new(num_frames: usize, layout: ChannelLayout, sample_rate: u32) -> Self {
        Self {
            samples: vec![vec![0.0_f32; num_frames]; layout.num_channels()],
            sample_rate,
        }
    }

    /// Create a buffer from per-channel sample vectors
    ///
    /// Fails if the channel count is not 1 or 2 or if channels differ in length.
    pub fn from_channels(samples: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if ChannelLayout::from_count(samples.len()).is_none() {
            return Err(LofiError::invalid_parameter(
                "channels",
                samples.len(),
                "only mono and stereo buffers are supported",
            ));
        }
        let frames = samples[0].len();
        if samples.iter().any(|ch| ch.len() != frames) {
            return Err(LofiError::invalid_parameter(
                "channels",
                samples.len(),
                "all channels must have the same length",
            ));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Create a buffer from interleaved float data (L, R, L, R, ... for stereo)
    ///
    /// # Returns
    /// Error if the data length is not a multiple of the channel count
    pub fn from_interleaved(
        interleaved: &[f32],
        layout: ChannelLayout,
        sample_rate: u32,
    ) -> Result<Self> {
        let num_channels = layout.num_channels();

        if interleaved.len() % num_channels != 0 {
            return Err(LofiError::invalid_parameter(
                "samples",
                interleaved.len(),
                format!("length is not divisible by channel count {}", num_channels),
            ));
        }

        let num_frames = interleaved.len() / num_channels;
        let mut samples = vec![Vec::with_capacity(num_frames); num_channels];

        for frame in interleaved.chunks_exact(num_channels) {
            for (ch, &sample) in frame.iter().enumerate() {
                samples[ch].push(sample);
            }
        }

        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Create a buffer from interleaved 16-bit PCM
    pub fn from_i16_interleaved(
        interleaved: &[i16],
        layout: ChannelLayout,
        sample_rate: u32,
    ) -> Result<Self> {
        let floats: Vec<f32> = interleaved
            .iter()
            .map(|&s| s as f32 / I16_FULL_SCALE)
            .collect();
        Self::from_interleaved(&floats, layout, sample_rate)
    }

    /// Convert the buffer to interleaved format
    pub fn to_interleaved(&self) -> Vec<f32> {
        match self.samples.as_slice() {
            [mono] => mono.clone(),
            [left, right] => left
                .iter()
                .zip(right.iter())
                .flat_map(|(&l, &r)| [l, r])
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Take the per-channel sample vectors out of the buffer
    pub fn into_channels(self) -> Vec<Vec<f32>> {
        self.samples
    }

    /// Convert the buffer to interleaved 16-bit PCM, clamping out-of-range values
    pub fn to_i16_interleaved(&self) -> Vec<i16> {
        self.to_interleaved()
            .into_iter()
            .map(|s| (s * I16_FULL_SCALE).round().clamp(-32768.0, 32767.0) as i16)
            .collect()
    }

    /// Get the number of channels
    #[inline]
    pub fn channels(&self) -> usize {
        self.samples.len()
    }

    /// Get the number of frames (samples per channel)
    #[inline]
    pub fn frames(&self) -> usize {
        self.samples.first().map(|ch| ch.len()).unwrap_or(0)
    }

    /// Check if the buffer holds no frames
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    /// Get the duration in seconds
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Get the channel layout
    pub fn channel_layout(&self) -> Option<ChannelLayout> {
        ChannelLayout::from_count(self.channels())
    }

    /// Whether this buffer is a left/right pair
    #[inline]
    pub fn is_stereo(&self) -> bool {
        self.channel_layout() == Some(ChannelLayout::Stereo)
    }

    /// Immutable access to one channel
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.samples[index]
    }

    /// Mutable access to one channel
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.samples[index]
    }

    /// Get a sample, or None if out of bounds
    #[inline]
    pub fn get_sample(&self, channel: usize, index: usize) -> Option<f32> {
        self.samples
            .get(channel)
            .and_then(|ch| ch.get(index).copied())
    }

    /// Largest absolute sample value across all channels
    pub fn peak(&self) -> f32 {
        self.samples
            .iter()
            .flat_map(|channel| channel.iter())
            .map(|&s| s.abs())
            .fold(0.0_f32, f32::max)
    }

    /// Peak level in dBFS. Returns -f32::INFINITY for silent or empty buffers.
    pub fn peak_dbfs(&self) -> f32 {
        linear_to_db(self.peak() / FULL_SCALE)
    }

    /// Check if all samples are finite (not NaN or Infinity)
    pub fn is_finite(&self) -> bool {
        self.samples
            .iter()
            .flat_map(|ch| ch.iter())
            .all(|s| s.is_finite())
    }

    /// Whether the peak is large enough to be scaled to a target level
    ///
    /// False for silence, for peaks below `SILENCE_FLOOR`, and for
    /// non-finite data.
    pub fn has_usable_peak(&self) -> bool {
        let peak = self.peak();
        peak.is_finite() && peak >= SILENCE_FLOOR
    }

    /// Check if every sample is exactly zero
    pub fn is_silent(&self) -> bool {
        self.samples
            .iter()
            .flat_map(|ch| ch.iter())
            .all(|&s| s == 0.0)
    }

    /// Multiply every sample by a linear gain
    pub fn apply_linear_gain(&mut self, gain: f32) {
        for channel in &mut self.samples {
            for sample in channel.iter_mut() {
                *sample *= gain;
            }
        }
    }

    /// Apply gain in decibels to all samples
    pub fn apply_gain(&mut self, gain_db: f32) {
        self.apply_linear_gain(db_to_linear(gain_db));
    }

    /// Scale the whole buffer so its peak sits exactly at full scale
    ///
    /// Returns the applied linear gain. A silent or near-silent buffer is
    /// left untouched and reported as `DegenerateSignal` for `stage`.
    pub fn rescale_to_full_scale(&mut self, stage: &'static str) -> Result<f32> {
        if !self.has_usable_peak() {
            return Err(LofiError::DegenerateSignal { stage });
        }
        let peak = self.peak();
        // Division keeps the peak sample at exactly full scale
        for channel in &mut self.samples {
            for sample in channel.iter_mut() {
                *sample = *sample / peak * FULL_SCALE;
            }
        }
        Ok(FULL_SCALE / peak)
    }
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new(0, ChannelLayout::Stereo, 44100)
    }
}

// ============================================================================
// Tests
// ============================================================================
