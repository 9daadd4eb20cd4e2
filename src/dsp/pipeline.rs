//! Lofi pipeline orchestration
//!
//! Stages always run in this order, each optional one only when enabled:
//! 1. Speed (slow down)
//! 2. Reverb
//! 3. Surround
//! 4. Dimension
//! 5. Normalize (always, last)
//!
//! The configuration is validated when the pipeline is built and the input
//! is checked against every stage before the first one runs, so a run
//! either fails up front or produces a complete result.

use log::debug;

use super::normalize::PeakNormalize;
use super::pan::{DimensionPan, SurroundPan};
use super::reverb::EchoReverb;
use super::speed::SpeedChange;
use super::transform::{Stage, Transform};
use crate::config::EffectConfig;
use crate::engine::SampleBuffer;
use crate::error::{LofiError, Result};

/// What one stage did to the buffer
#[derive(Debug, Clone, PartialEq)]
pub struct StageReport {
    pub stage: Stage,
    pub frames_in: usize,
    pub frames_out: usize,
    pub peak_dbfs_out: f32,
}

/// Final buffer plus one report per stage that ran
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub buffer: SampleBuffer,
    pub stages: Vec<StageReport>,
}

impl PipelineOutput {
    /// Stages that ran, in order
    pub fn applied(&self) -> Vec<Stage> {
        self.stages.iter().map(|r| r.stage).collect()
    }
}

/// Ordered, validated set of stages built from an `EffectConfig`
#[derive(Debug)]
pub struct LofiPipeline {
    stages: Vec<Box<dyn Transform>>,
}

impl LofiPipeline {
    /// Build the pipeline for a configuration
    ///
    /// Fails with `InvalidParameter` if any enabled stage, or the normalize
    /// target, is out of range.
    pub fn from_config(config: &EffectConfig) -> Result<Self> {
        let mut stages: Vec<Box<dyn Transform>> = Vec::with_capacity(5);

        if config.slow_down {
            stages.push(Box::new(SpeedChange::new(config.slow_speed)?));
        }
        if config.reverb {
            stages.push(Box::new(EchoReverb::new(
                config.reverb_decay,
                config.reverb_delay_ms,
                config.reverb_repeats,
            )?));
        }
        if config.surround {
            stages.push(Box::new(SurroundPan::new(
                config.surround_cycle_duration,
                config.surround_depth,
            )?));
        }
        if config.dimension {
            stages.push(Box::new(DimensionPan::new(
                config.dimension_number,
                config.dimension_cycle,
            )?));
        }
        stages.push(Box::new(PeakNormalize::new(config.target_dbfs)?));

        Ok(Self { stages })
    }

    /// Stages in the order they run
    pub fn stages(&self) -> Vec<Stage> {
        self.stages.iter().map(|s| s.stage()).collect()
    }

    /// Check that `input` can go through every stage
    pub fn check_input(&self, input: &SampleBuffer) -> Result<()> {
        if input.sample_rate == 0 {
            return Err(LofiError::invalid_parameter(
                "sample_rate",
                input.sample_rate,
                "sample rate must be positive",
            ));
        }
        for stage in &self.stages {
            stage.check_input(input)?;
        }
        Ok(())
    }

    /// Run every stage over `input`
    ///
    /// `input` is never modified; each stage hands a new buffer to the next.
    pub fn process(&self, input: &SampleBuffer) -> Result<PipelineOutput> {
        self.check_input(input)?;

        let mut buffer = input.clone();
        let mut reports = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            debug!("running {}", stage.describe());
            let frames_in = buffer.frames();
            buffer = stage.apply(&buffer)?;
            reports.push(StageReport {
                stage: stage.stage(),
                frames_in,
                frames_out: buffer.frames(),
                peak_dbfs_out: buffer.peak_dbfs(),
            });
        }

        Ok(PipelineOutput {
            buffer,
            stages: reports,
        })
    }
}

/// Build a pipeline for `config` and run it over `input`
pub fn process(input: &SampleBuffer, config: &EffectConfig) -> Result<PipelineOutput> {
    LofiPipeline::from_config(config)?.process(input)
}
