//! Stereo panning effects
//!
//! Both effects sweep the stereo image with a sine LFO: at frame `i`,
//!
//! ```text
//! t    = (i / sample_rate) mod cycle
//! pan  = sin(2π · t / cycle) · depth
//! left = (1 + pan) / 2,  right = (1 - pan) / 2
//! ```
//!
//! The two gains always sum to 1, so a centered sound (`pan == 0`) plays at
//! half level in each channel.
//!
//! - [`SurroundPan`] uses a configurable depth and renormalizes the result to
//!   full scale.
//! - [`DimensionPan`] always pans fully, derives its cycle from a "dimension
//!   number", and does not renormalize.

use std::f64::consts::PI;

use log::{debug, warn};

use super::transform::{Stage, Transform};
use crate::engine::SampleBuffer;
use crate::error::{LofiError, Result};

/// Dimension number that leaves the base cycle unchanged
pub const NEUTRAL_DIMENSION: u32 = 8;

/// Sine LFO driving the left/right balance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanSweep {
    cycle_secs: f64,
    depth: f32,
}

impl PanSweep {
    /// Caller validates `cycle_secs > 0` and `depth` in [0, 1]
    fn new(cycle_secs: f64, depth: f32) -> Self {
        Self { cycle_secs, depth }
    }

    pub fn cycle_secs(&self) -> f64 {
        self.cycle_secs
    }

    pub fn depth(&self) -> f32 {
        self.depth
    }

    /// Pan position in [-depth, depth]; positive leans left
    pub fn pan_at(&self, frame: usize, sample_rate: u32) -> f32 {
        let t = (frame as f64 / sample_rate as f64) % self.cycle_secs;
        ((2.0 * PI * t / self.cycle_secs).sin() as f32) * self.depth
    }

    /// `(left_gain, right_gain)` at a frame
    pub fn gains_at(&self, frame: usize, sample_rate: u32) -> (f32, f32) {
        gains_for_pan(self.pan_at(frame, sample_rate))
    }

    /// Apply the sweep frame by frame
    ///
    /// Fails with `UnsupportedChannelLayout` before producing anything when
    /// the input is not stereo.
    pub fn pan_buffer(&self, input: &SampleBuffer, stage: Stage) -> Result<SampleBuffer> {
        require_stereo(input, stage)?;

        let mut output = input.clone();
        let sample_rate = input.sample_rate;
        let (left, right) = output.samples.split_at_mut(1);

        for (frame, (l, r)) in left[0].iter_mut().zip(right[0].iter_mut()).enumerate() {
            let (left_gain, right_gain) = self.gains_at(frame, sample_rate);
            *l *= left_gain;
            *r *= right_gain;
        }

        Ok(output)
    }
}

/// Complementary gains for a pan position
#[inline]
pub fn gains_for_pan(pan: f32) -> (f32, f32) {
    ((1.0 + pan) / 2.0, (1.0 - pan) / 2.0)
}

fn require_stereo(input: &SampleBuffer, stage: Stage) -> Result<()> {
    if !input.is_stereo() {
        return Err(LofiError::UnsupportedChannelLayout {
            stage: stage.name(),
            channels: input.channels(),
        });
    }
    Ok(())
}

// ============================================================================
// Surround
// ============================================================================

/// Slow left/right sweep with adjustable depth, renormalized afterwards
#[derive(Debug, Clone, PartialEq)]
pub struct SurroundPan {
    sweep: PanSweep,
}

impl SurroundPan {
    /// # Arguments
    /// * `cycle_secs` - Length of one full left-right-left sweep, > 0
    /// * `depth` - Swing, 0 (none) to 1 (hard left/right)
    pub fn new(cycle_secs: f64, depth: f32) -> Result<Self> {
        if !cycle_secs.is_finite() || cycle_secs <= 0.0 {
            return Err(LofiError::invalid_parameter(
                "surround_cycle_duration",
                cycle_secs,
                "cycle duration must be positive",
            ));
        }
        if !(0.0..=1.0).contains(&depth) {
            return Err(LofiError::invalid_parameter(
                "surround_depth",
                depth,
                "depth must lie between 0 and 1",
            ));
        }
        Ok(Self {
            sweep: PanSweep::new(cycle_secs, depth),
        })
    }

    pub fn sweep(&self) -> &PanSweep {
        &self.sweep
    }
}

impl Transform for SurroundPan {
    fn stage(&self) -> Stage {
        Stage::Surround
    }

    fn check_input(&self, input: &SampleBuffer) -> Result<()> {
        require_stereo(input, Stage::Surround)
    }

    fn apply(&self, input: &SampleBuffer) -> Result<SampleBuffer> {
        let mut output = self.sweep.pan_buffer(input, Stage::Surround)?;

        match output.rescale_to_full_scale("surround") {
            Ok(gain) => debug!("surround: renormalized by {:.4}", gain),
            Err(err @ LofiError::DegenerateSignal { .. }) => warn!("{}", err),
            Err(err) => return Err(err),
        }

        Ok(output)
    }

    fn describe(&self) -> String {
        format!(
            "surround cycle={}s depth={}",
            self.sweep.cycle_secs, self.sweep.depth
        )
    }
}

// ============================================================================
// Dimension
// ============================================================================

/// Full-depth sweep whose speed follows a dimension number
///
/// The cycle is `base_cycle * dimension / 8`: larger numbers move slower.
/// Unlike [`SurroundPan`] the result is left at its panned level; the final
/// normalize stage restores loudness.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionPan {
    dimension: u32,
    sweep: PanSweep,
}

impl DimensionPan {
    pub fn new(dimension: u32, base_cycle_secs: f64) -> Result<Self> {
        if dimension == 0 {
            return Err(LofiError::invalid_parameter(
                "dimension_number",
                dimension,
                "dimension number must be positive",
            ));
        }
        if !base_cycle_secs.is_finite() || base_cycle_secs <= 0.0 {
            return Err(LofiError::invalid_parameter(
                "dimension_cycle",
                base_cycle_secs,
                "cycle duration must be positive",
            ));
        }
        let cycle = base_cycle_secs * (dimension as f64 / NEUTRAL_DIMENSION as f64);
        Ok(Self {
            dimension,
            sweep: PanSweep::new(cycle, 1.0),
        })
    }

    pub fn dimension(&self) -> u32 {
        self.dimension
    }

    pub fn sweep(&self) -> &PanSweep {
        &self.sweep
    }
}

impl Transform for DimensionPan {
    fn stage(&self) -> Stage {
        Stage::Dimension
    }

    fn check_input(&self, input: &SampleBuffer) -> Result<()> {
        require_stereo(input, Stage::Dimension)
    }

    fn apply(&self, input: &SampleBuffer) -> Result<SampleBuffer> {
        self.sweep.pan_buffer(input, Stage::Dimension)
    }

    fn describe(&self) -> String {
        format!(
            "dimension {} (cycle={}s)",
            self.dimension, self.sweep.cycle_secs
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
