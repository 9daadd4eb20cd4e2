//! Effect configuration
//!
//! One flat set of toggles and parameters, fixed before processing starts.
//! Every field has a default, so a JSON file only needs the keys it changes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dsp::{LofiPipeline, Stage};
use crate::error::Result;

/// Settings for every stage of the lofi pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectConfig {
    /// Slow the track down (tempo and pitch together)
    pub slow_down: bool,
    /// Playback speed factor, < 1.0 slows down
    pub slow_speed: f64,

    /// Add an echo reverb
    pub reverb: bool,
    /// Attenuation per repeat, in (0, 1)
    pub reverb_decay: f32,
    /// Spacing between echoes in milliseconds
    pub reverb_delay_ms: u32,
    /// Number of echoes
    pub reverb_repeats: u32,

    /// Slowly sweep the stereo image left and right
    pub surround: bool,
    /// Length of one full sweep in seconds
    pub surround_cycle_duration: f64,
    /// How far the sweep swings, 0 (none) to 1 (hard left/right)
    pub surround_depth: f32,

    /// Full-depth panning whose speed is set by `dimension_number`
    pub dimension: bool,
    /// Higher numbers slow the panning down; 8 leaves `dimension_cycle` as is
    pub dimension_number: u32,
    /// Base cycle length in seconds
    pub dimension_cycle: f64,

    /// Peak level of the exported track in dBFS
    pub target_dbfs: f32,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            slow_down: true,
            slow_speed: 0.85,
            reverb: true,
            reverb_decay: 0.3,
            reverb_delay_ms: 120,
            reverb_repeats: 2,
            surround: false,
            surround_cycle_duration: 14.0,
            surround_depth: 0.7,
            dimension: false,
            dimension_number: 8,
            dimension_cycle: 4.0,
            target_dbfs: -1.0,
        }
    }
}

impl EffectConfig {
    /// Configuration with every optional stage switched off
    ///
    /// Only the final normalization runs.
    pub fn normalize_only() -> Self {
        Self {
            slow_down: false,
            reverb: false,
            surround: false,
            dimension: false,
            ..Self::default()
        }
    }

    /// Load a configuration from a JSON file
    ///
    /// Missing keys keep their defaults. The result is validated.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Parse and validate a configuration from JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Pretty-printed JSON for display or saving
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every parameter that will be used
    ///
    /// Parameters of disabled stages are ignored; the normalize target is
    /// always checked.
    pub fn validate(&self) -> Result<()> {
        LofiPipeline::from_config(self).map(|_| ())
    }

    /// Stages that will run, in pipeline order
    pub fn enabled_stages(&self) -> Vec<Stage> {
        let mut stages = Vec::with_capacity(5);
        if self.slow_down {
            stages.push(Stage::Speed);
        }
        if self.reverb {
            stages.push(Stage::Reverb);
        }
        if self.surround {
            stages.push(Stage::Surround);
        }
        if self.dimension {
            stages.push(Stage::Dimension);
        }
        stages.push(Stage::Normalize);
        stages
    }
}
