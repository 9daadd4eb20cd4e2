//! CLI Module
//!
//! Command-line interface for the lofi converter.

pub mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::EffectConfig;
use crate::engine::metadata::DEFAULT_OUTPUT_DIR;

/// Lofi - slow, echoey, gently panning versions of your tracks
#[derive(Parser, Debug)]
#[command(name = "lofi")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert audio files (or directories of them) to lofi
    #[command(name = "convert")]
    Convert {
        /// Input files or directories
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Directory converted tracks are written to
        #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
        out_dir: PathBuf,

        /// Number of tracks processed in parallel (0 = one per CPU)
        #[arg(short, long, default_value_t = 0)]
        workers: usize,

        #[command(flatten)]
        effects: EffectArgs,
    },

    /// Print the effective effect configuration as JSON
    #[command(name = "show-config")]
    ShowConfig {
        #[command(flatten)]
        effects: EffectArgs,
    },
}

/// Effect settings: a JSON file, then individual flags on top
#[derive(Args, Debug, Default, Clone)]
pub struct EffectArgs {
    /// JSON file with effect settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Keep the original speed
    #[arg(long)]
    pub no_slow_down: bool,

    /// Playback speed factor (< 1 slows down)
    #[arg(long)]
    pub slow_speed: Option<f64>,

    /// Skip the echo reverb
    #[arg(long)]
    pub no_reverb: bool,

    /// Level of each echo relative to the previous, in (0, 1)
    #[arg(long)]
    pub reverb_decay: Option<f32>,

    /// Milliseconds between echoes
    #[arg(long)]
    pub reverb_delay_ms: Option<u32>,

    /// Number of echoes
    #[arg(long)]
    pub reverb_repeats: Option<u32>,

    /// Sweep the stereo image (stereo input only)
    #[arg(long)]
    pub surround: bool,

    /// Seconds per surround sweep
    #[arg(long)]
    pub surround_cycle: Option<f64>,

    /// Surround swing, 0 to 1
    #[arg(long)]
    pub surround_depth: Option<f32>,

    /// Full-depth panning illusion (stereo input only)
    #[arg(long)]
    pub dimension: bool,

    /// Dimension number; higher is slower
    #[arg(long)]
    pub dimension_number: Option<u32>,

    /// Base seconds per dimension sweep
    #[arg(long)]
    pub dimension_cycle: Option<f64>,

    /// Peak level of the output in dBFS
    #[arg(long, allow_hyphen_values = true)]
    pub target_dbfs: Option<f32>,
}

impl EffectArgs {
    /// Apply the command-line overrides on top of `config`
    pub fn apply_to(&self, mut config: EffectConfig) -> EffectConfig {
        if self.no_slow_down {
            config.slow_down = false;
        }
        if let Some(speed) = self.slow_speed {
            config.slow_speed = speed;
        }
        if self.no_reverb {
            config.reverb = false;
        }
        if let Some(decay) = self.reverb_decay {
            config.reverb_decay = decay;
        }
        if let Some(delay) = self.reverb_delay_ms {
            config.reverb_delay_ms = delay;
        }
        if let Some(repeats) = self.reverb_repeats {
            config.reverb_repeats = repeats;
        }
        if self.surround {
            config.surround = true;
        }
        if let Some(cycle) = self.surround_cycle {
            config.surround_cycle_duration = cycle;
        }
        if let Some(depth) = self.surround_depth {
            config.surround_depth = depth;
        }
        if self.dimension {
            config.dimension = true;
        }
        if let Some(number) = self.dimension_number {
            config.dimension_number = number;
        }
        if let Some(cycle) = self.dimension_cycle {
            config.dimension_cycle = cycle;
        }
        if let Some(target) = self.target_dbfs {
            config.target_dbfs = target;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_convert_overrides() {
        let cli = Cli::parse_from([
            "lofi",
            "convert",
            "song.wav",
            "--no-reverb",
            "--surround",
            "--slow-speed",
            "0.7",
            "--target-dbfs",
            "-3",
        ]);

        match cli.command {
            Commands::Convert {
                inputs,
                out_dir,
                effects,
                ..
            } => {
                assert_eq!(inputs, vec![PathBuf::from("song.wav")]);
                assert_eq!(out_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));

                let config = effects.apply_to(EffectConfig::default());
                assert!(!config.reverb);
                assert!(config.surround);
                assert!(config.slow_down);
                assert_eq!(config.slow_speed, 0.7);
                assert_eq!(config.target_dbfs, -3.0);
            }
            other => panic!("Expected convert, got {:?}", other),
        }
    }

    #[test]
    fn test_no_overrides_keeps_config() {
        let base = EffectConfig {
            dimension: true,
            ..EffectConfig::default()
        };
        assert_eq!(EffectArgs::default().apply_to(base.clone()), base);
    }
}
