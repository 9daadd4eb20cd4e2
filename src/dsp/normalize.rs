//! Peak normalization
//!
//! The last stage of every run: one uniform gain that puts the track's peak
//! exactly at the target level.

use log::{debug, warn};

use super::transform::{Stage, Transform};
use crate::engine::{db_to_linear, linear_to_db, SampleBuffer};
use crate::error::{LofiError, Result};

/// Uniform gain to a target peak level in dBFS
#[derive(Debug, Clone, PartialEq)]
pub struct PeakNormalize {
    target_dbfs: f32,
}

impl PeakNormalize {
    /// `target_dbfs` must be finite and at most 0 dBFS
    pub fn new(target_dbfs: f32) -> Result<Self> {
        if !target_dbfs.is_finite() || target_dbfs > 0.0 {
            return Err(LofiError::invalid_parameter(
                "target_dbfs",
                target_dbfs,
                "target must be a finite level at or below 0 dBFS",
            ));
        }
        Ok(Self { target_dbfs })
    }

    pub fn target_dbfs(&self) -> f32 {
        self.target_dbfs
    }

    /// Linear gain that brings the peak of `buffer` to the target
    ///
    /// Returns `DegenerateSignal` for silent or near-silent buffers, where
    /// the gain would not be representable.
    pub fn linear_gain(&self, buffer: &SampleBuffer) -> Result<f32> {
        if !buffer.has_usable_peak() {
            return Err(LofiError::DegenerateSignal { stage: "normalize" });
        }
        let gain = (f64::from(db_to_linear(self.target_dbfs)) / f64::from(buffer.peak())) as f32;
        if !gain.is_finite() || gain <= 0.0 {
            return Err(LofiError::DegenerateSignal { stage: "normalize" });
        }
        Ok(gain)
    }

    /// Gain change in dB that brings `buffer` to the target
    pub fn gain_db(&self, buffer: &SampleBuffer) -> Result<f32> {
        self.linear_gain(buffer).map(linear_to_db)
    }
}

impl Transform for PeakNormalize {
    fn stage(&self) -> Stage {
        Stage::Normalize
    }

    fn apply(&self, input: &SampleBuffer) -> Result<SampleBuffer> {
        let mut output = input.clone();

        match self.linear_gain(input) {
            Ok(gain) => {
                debug!(
                    "normalize: peak {:.2} dBFS -> {:.2} dBFS ({:+.2} dB)",
                    input.peak_dbfs(),
                    self.target_dbfs,
                    linear_to_db(gain)
                );
                output.apply_linear_gain(gain);
            }
            Err(err @ LofiError::DegenerateSignal { .. }) => warn!("{}", err),
            Err(err) => return Err(err),
        }

        Ok(output)
    }

    fn describe(&self) -> String {
        format!("normalize to {} dBFS", self.target_dbfs)
    }
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

    #[test_case(-1.0)]
    #[test_case(-6.0)]
    #[test_case(0.0)]
    fn test_reaches_target(target: f32) {
        let mut input = generate_stereo_test_tone(440.0, 550.0, 0.2, 8000);
        input.apply_gain(-14.0);

        let output = PeakNormalize::new(target).unwrap().apply(&input).unwrap();
        assert_abs_diff_eq!(output.peak_dbfs(), target, epsilon = 0.01);
        assert_eq!(output.frames(), input.frames());
    }

    #[test]
    fn test_idempotent() {
        let normalize = PeakNormalize::new(-1.0).unwrap();
        let input = generate_stereo_test_tone(440.0, 550.0, 0.2, 8000);

        let once = normalize.apply(&input).unwrap();
        let gain = db_to_linear(normalize.gain_db(&once).unwrap());
        assert_abs_diff_eq!(gain, 1.0, epsilon = 1e-4);

        let twice = normalize.apply(&once).unwrap();
        for ch in 0..2 {
            for (a, b) in once.channel(ch).iter().zip(twice.channel(ch)) {
                assert_abs_diff_eq!(a, b, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_silence_is_noop() {
        let normalize = PeakNormalize::new(-1.0).unwrap();
        let input = SampleBuffer::new(100, ChannelLayout::Mono, 8000);

        assert!(matches!(
            normalize.gain_db(&input),
            Err(LofiError::DegenerateSignal { .. })
        ));

        let output = normalize.apply(&input).unwrap();
        assert!(output.is_silent());
        assert!(output.is_finite());
    }

    #[test]
    fn test_near_silence_is_noop() {
        let normalize = PeakNormalize::new(-1.0).unwrap();
        let samples = vec![1e-40_f32, -1e-41, 0.0];
        let input = SampleBuffer::from_channels(vec![samples.clone()], 44100).unwrap();

        assert!(matches!(
            normalize.linear_gain(&input),
            Err(LofiError::DegenerateSignal { stage: "normalize" })
        ));

        let output = normalize.apply(&input).unwrap();
        assert!(output.is_finite());
        assert_eq!(output.channel(0), samples.as_slice());
    }

    #[test]
    fn test_quiet_but_usable_peak_reaches_target() {
        let normalize = PeakNormalize::new(-1.0).unwrap();
        let input = SampleBuffer::from_channels(vec![vec![1e-30, -5e-31, 0.0]], 44100).unwrap();

        let output = normalize.apply(&input).unwrap();
        assert!(output.is_finite());
        assert_abs_diff_eq!(output.peak_dbfs(), -1.0, epsilon = 0.01);
    }

    #[test_case(1.0 ; "positive")]
    #[test_case(f32::NAN ; "nan")]
    #[test_case(f32::NEG_INFINITY ; "negative infinity")]
    fn test_invalid_target(target: f32) {
        assert!(matches!(
            PeakNormalize::new(target),
            Err(LofiError::InvalidParameter { name: "target_dbfs", .. })
        ));
    }
}
