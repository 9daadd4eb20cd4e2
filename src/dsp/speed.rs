//! Speed change
//!
//! Plays the track back at a different speed the way a turntable does:
//! the samples are relabelled with a scaled sample rate and then resampled
//! back to the original rate, so tempo and pitch move together.

use log::debug;

use super::transform::{Stage, Transform};
use crate::engine::SampleBuffer;
use crate::error::{LofiError, Result};

/// Tape-style speed change
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedChange {
    factor: f64,
}

impl SpeedChange {
    /// Create a speed change; `factor` < 1.0 slows the track down
    pub fn new(factor: f64) -> Result<Self> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(LofiError::invalid_parameter(
                "slow_speed",
                factor,
                "speed factor must be a positive number",
            ));
        }
        Ok(Self { factor })
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Rate the samples are reinterpreted at, truncated to whole Hz
    pub fn reinterpreted_rate(&self, sample_rate: u32) -> Result<u32> {
        let rate = (sample_rate as f64 * self.factor).trunc();
        if rate < 1.0 || rate > u32::MAX as f64 {
            return Err(LofiError::invalid_parameter(
                "slow_speed",
                self.factor,
                format!("gives an unusable sample rate at {} Hz", sample_rate),
            ));
        }
        Ok(rate as u32)
    }
}

impl Transform for SpeedChange {
    fn stage(&self) -> Stage {
        Stage::Speed
    }

    fn check_input(&self, input: &SampleBuffer) -> Result<()> {
        self.reinterpreted_rate(input.sample_rate).map(|_| ())
    }

    fn apply(&self, input: &SampleBuffer) -> Result<SampleBuffer> {
        let source_rate = self.reinterpreted_rate(input.sample_rate)?;
        let target_rate = input.sample_rate;
        let ratio = target_rate as f64 / source_rate as f64;

        let samples = input
            .samples
            .iter()
            .map(|channel| resample_linear(channel, ratio))
            .collect();

        debug!(
            "speed: {} Hz reinterpreted as {} Hz, {} -> {} frames",
            target_rate,
            source_rate,
            input.frames(),
            ((input.frames() as f64) * ratio).ceil() as usize
        );

        Ok(SampleBuffer {
            samples,
            sample_rate: target_rate,
        })
    }

    fn describe(&self) -> String {
        format!("speed x{:.3}", self.factor)
    }
}

/// Linear interpolation resampling
///
/// `ratio` is target rate over source rate; output length is
/// `ceil(len * ratio)`.
// TODO: switch to windowed sinc interpolation; linear interpolation aliases when downsampling
pub fn resample_linear(samples: &[f32], ratio: f64) -> Vec<f32> {
    if samples.is_empty() {
        return Vec::new();
    }

    let source_len = samples.len();
    let target_len = ((source_len as f64) * ratio).ceil() as usize;
    let mut output = Vec::with_capacity(target_len);

    for i in 0..target_len {
        // Map output index to source position
        let src_pos = i as f64 / ratio;
        let src_idx = src_pos.floor() as usize;
        let frac = (src_pos - src_idx as f64) as f32;

        let sample = if src_idx + 1 < source_len {
            samples[src_idx] * (1.0 - frac) + samples[src_idx + 1] * frac
        } else if src_idx < source_len {
            samples[src_idx]
        } else {
            0.0
        };

        output.push(sample);
    }

    output
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{generate_stereo_test_tone, ChannelLayout};
    use approx::assert_abs_diff_eq;
    use test_case::test_case;

    #[test]
    fn test_resample_linear_upsample() {
        let samples = vec![0.0, 1.0, 0.0];
        let resampled = resample_linear(&samples, 2.0);

        assert_eq!(resampled.len(), 6);
        // Output index 1 sits halfway between the first two inputs
        assert_abs_diff_eq!(resampled[1], 0.5);
        assert_abs_diff_eq!(resampled[2], 1.0);
    }

    #[test]
    fn test_resample_linear_downsample() {
        let samples = vec![0.0, 0.5, 1.0, 0.5, 0.0, -0.5, -1.0, -0.5];
        let resampled = resample_linear(&samples, 0.5);
        assert_eq!(resampled, vec![0.0, 1.0, 0.0, -1.0]);
    }

    #[test]
    fn test_resample_empty() {
        assert!(resample_linear(&[], 1.5).is_empty());
    }

    #[test_case(0.0 ; "zero")]
    #[test_case(-0.85 ; "negative")]
    #[test_case(f64::NAN ; "nan")]
    #[test_case(f64::INFINITY ; "infinite")]
    fn test_invalid_factor(factor: f64) {
        assert!(matches!(
            SpeedChange::new(factor),
            Err(LofiError::InvalidParameter { name: "slow_speed", .. })
        ));
    }

    #[test]
    fn test_reinterpreted_rate_truncates() {
        let speed = SpeedChange::new(0.85).unwrap();
        assert_eq!(speed.reinterpreted_rate(44100).unwrap(), 37485);

        let speed = SpeedChange::new(0.333).unwrap();
        assert_eq!(speed.reinterpreted_rate(100).unwrap(), 33);
    }

    #[test]
    fn test_rate_below_one_hz_rejected() {
        let speed = SpeedChange::new(0.001).unwrap();
        let input = SampleBuffer::new(10, ChannelLayout::Mono, 100);
        assert!(speed.check_input(&input).is_err());
        assert!(speed.apply(&input).is_err());
    }

    #[test_case(0.85)]
    #[test_case(0.5)]
    #[test_case(1.25)]
    fn test_duration_scales_with_factor(factor: f64) {
        let input = generate_stereo_test_tone(220.0, 330.0, 1.0, 44100);
        let output = SpeedChange::new(factor).unwrap().apply(&input).unwrap();

        assert_eq!(output.sample_rate, 44100);
        assert_eq!(output.channels(), 2);
        let expected = input.duration_secs() / factor;
        assert!(
            (output.duration_secs() - expected).abs() < 0.001,
            "expected {:.4}s, got {:.4}s",
            expected,
            output.duration_secs()
        );
    }

    #[test]
    fn test_unity_speed_is_identity() {
        let input = generate_stereo_test_tone(440.0, 660.0, 0.1, 8000);
        let output = SpeedChange::new(1.0).unwrap().apply(&input).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn test_input_untouched() {
        let input = generate_stereo_test_tone(440.0, 660.0, 0.1, 8000);
        let copy = input.clone();
        let _ = SpeedChange::new(0.5).unwrap().apply(&input).unwrap();
        assert_eq!(input, copy);
    }
}
