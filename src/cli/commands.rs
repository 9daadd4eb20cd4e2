//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::{Path, PathBuf};

use log::info;

use crate::batch::{collect_inputs, BatchSummary, Converter};
use crate::cli::EffectArgs;
use crate::config::EffectConfig;
use crate::error::Result;

/// Build the effective configuration: defaults, then the JSON file, then flags.
pub fn resolve_config(effects: &EffectArgs) -> Result<EffectConfig> {
    let base = match &effects.config {
        Some(path) => {
            info!("Loading effect settings from {}", path.display());
            EffectConfig::from_json_file(path)?
        }
        None => EffectConfig::default(),
    };

    let config = effects.apply_to(base);
    config.validate()?;
    Ok(config)
}

/// Convert every input track and print one line per track.
pub fn convert(
    inputs: &[PathBuf],
    out_dir: &Path,
    workers: usize,
    effects: &EffectArgs,
) -> Result<BatchSummary> {
    let config = resolve_config(effects)?;
    let tracks = collect_inputs(inputs)?;

    info!(
        "Converting {} track(s) into {} with stages {:?}",
        tracks.len(),
        out_dir.display(),
        config.enabled_stages()
    );

    let converter = Converter::new(&config, out_dir)?;
    let outcomes = converter.convert_batch(&tracks, workers)?;

    for outcome in &outcomes {
        match &outcome.result {
            Ok(report) => {
                println!(
                    "{} -> {} ({:.1}s -> {:.1}s)",
                    report.input.display(),
                    report.output.display(),
                    report.input_secs,
                    report.output_secs
                );
            }
            Err(err) => {
                println!("{}: FAILED [{}] {}", outcome.input.display(), err.error_code(), err);
                for suggestion in err.recovery_suggestions() {
                    println!("    - {}", suggestion);
                }
            }
        }
    }

    let summary = BatchSummary::from_outcomes(&outcomes);
    println!(
        "{} converted, {} failed",
        summary.succeeded, summary.failed
    );

    Ok(summary)
}

/// Print the effective configuration.
pub fn show_config(effects: &EffectArgs) -> Result<()> {
    let config = resolve_config(effects)?;
    println!("{}", config.to_json_string()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{encode_wav, generate_stereo_test_tone};
    use tempfile::tempdir;

    #[test]
    fn test_resolve_config_file_then_flags() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "reverb_repeats": 4, "surround": true }"#).unwrap();

        let effects = EffectArgs {
            config: Some(path),
            reverb_repeats: Some(3),
            ..EffectArgs::default()
        };
        let config = resolve_config(&effects).unwrap();

        assert!(config.surround);
        assert_eq!(config.reverb_repeats, 3);
    }

    #[test]
    fn test_resolve_config_rejects_invalid_override() {
        let effects = EffectArgs {
            surround_depth: Some(2.0),
            surround: true,
            ..EffectArgs::default()
        };
        assert!(resolve_config(&effects).is_err());
    }

    #[test]
    fn test_convert_directory() {
        let dir = tempdir().unwrap();
        let inputs = dir.path().join("in");
        std::fs::create_dir_all(&inputs).unwrap();
        for name in ["one.wav", "two.wav"] {
            encode_wav(
                &generate_stereo_test_tone(330.0, 440.0, 0.2, 8000),
                &inputs.join(name),
            )
            .unwrap();
        }
        let out_dir = dir.path().join("out");

        let summary = convert(&[inputs], &out_dir, 1, &EffectArgs::default()).unwrap();

        assert_eq!(summary.succeeded, 2);
        assert!(summary.all_succeeded());
        assert!(out_dir.join("one_converted.wav").exists());
        assert!(out_dir.join("two_converted.wav").exists());
    }
}
