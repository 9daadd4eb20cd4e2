//! Echo reverb
//!
//! A cheap, characterful reverb made of evenly spaced, decaying copies of the
//! dry signal. Echo `i` arrives `i * delay` after the dry sound at
//! `decay^i` of its level. The sum is renormalized so the loudest sample sits
//! at full scale, which keeps overlapping echoes from clipping.

use log::{debug, warn};

use super::transform::{Stage, Transform};
use crate::engine::SampleBuffer;
use crate::error::{LofiError, Result};

/// Delayed-copy echo reverb
#[derive(Debug, Clone, PartialEq)]
pub struct EchoReverb {
    decay: f32,
    delay_ms: u32,
    repeats: u32,
}

impl EchoReverb {
    /// Create an echo reverb
    ///
    /// # Arguments
    /// * `decay` - Level of each echo relative to the previous one, in (0, 1)
    /// * `delay_ms` - Spacing between echoes, > 0
    /// * `repeats` - Number of echoes, > 0
    pub fn new(decay: f32, delay_ms: u32, repeats: u32) -> Result<Self> {
        if !(decay > 0.0 && decay < 1.0) {
            return Err(LofiError::invalid_parameter(
                "reverb_decay",
                decay,
                "decay must lie strictly between 0 and 1",
            ));
        }
        if delay_ms == 0 {
            return Err(LofiError::invalid_parameter(
                "reverb_delay_ms",
                delay_ms,
                "delay must be positive",
            ));
        }
        if repeats == 0 {
            return Err(LofiError::invalid_parameter(
                "reverb_repeats",
                repeats,
                "at least one echo is required",
            ));
        }
        Ok(Self {
            decay,
            delay_ms,
            repeats,
        })
    }

    pub fn decay(&self) -> f32 {
        self.decay
    }

    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }

    pub fn repeats(&self) -> u32 {
        self.repeats
    }

    /// Echo spacing in frames at `sample_rate`, truncated
    pub fn delay_samples(&self, sample_rate: u32) -> usize {
        (sample_rate as u64 * self.delay_ms as u64 / 1000) as usize
    }

    /// Dry signal plus all echoes, before renormalization
    ///
    /// Every echo is taken from the dry input, never from earlier echoes.
    /// Echoes starting past the end of the buffer contribute nothing, so the
    /// length is unchanged.
    pub fn accumulate_echoes(&self, input: &SampleBuffer) -> Result<SampleBuffer> {
        let delay = self.delay_samples(input.sample_rate);
        if delay == 0 {
            return Err(LofiError::invalid_parameter(
                "reverb_delay_ms",
                self.delay_ms,
                format!("shorter than one sample at {} Hz", input.sample_rate),
            ));
        }

        let mut output = input.clone();
        for (dry, wet) in input.samples.iter().zip(output.samples.iter_mut()) {
            let mut gain = 1.0_f32;
            for repeat in 1..=self.repeats as usize {
                gain *= self.decay;
                let shift = delay * repeat;
                if shift >= dry.len() {
                    break;
                }
                for (out, &src) in wet[shift..].iter_mut().zip(dry.iter()) {
                    *out += src * gain;
                }
            }
        }

        Ok(output)
    }
}

impl Transform for EchoReverb {
    fn stage(&self) -> Stage {
        Stage::Reverb
    }

    fn check_input(&self, input: &SampleBuffer) -> Result<()> {
        if self.delay_samples(input.sample_rate) == 0 {
            return Err(LofiError::invalid_parameter(
                "reverb_delay_ms",
                self.delay_ms,
                format!("shorter than one sample at {} Hz", input.sample_rate),
            ));
        }
        Ok(())
    }

    fn apply(&self, input: &SampleBuffer) -> Result<SampleBuffer> {
        let mut output = self.accumulate_echoes(input)?;

        match output.rescale_to_full_scale("reverb") {
            Ok(gain) => debug!(
                "reverb: {} echoes every {} frames, renormalized by {:.4}",
                self.repeats,
                self.delay_samples(input.sample_rate),
                gain
            ),
            Err(err @ LofiError::DegenerateSignal { .. }) => warn!("{}", err),
            Err(err) => return Err(err),
        }

        Ok(output)
    }

    fn describe(&self) -> String {
        format!(
            "reverb decay={} delay={}ms repeats={}",
            self.decay, self.delay_ms, self.repeats
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
