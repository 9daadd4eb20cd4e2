//! Track conversion and batch processing
//!
//! A `Converter` ties the pipeline to its collaborators: decode, process,
//! name, encode. Batches run one independent conversion per track on a rayon
//! pool; a failed track is reported and never stops the others.
//!
//! A converter never hands out the same output path twice. When two tracks
//! resolve to the same name (`a/song.wav` and `b/song.wav`), the later one in
//! input order gets a numbered variant (`song_converted_2.wav`).

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use log::{info, warn};
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::config::EffectConfig;
use crate::dsp::{LofiPipeline, Stage};
use crate::engine::{
    decode_audio, encode_wav, EmbeddedTagTitle, OutputPathResolver, SuffixedOutputPath,
    TitleResolver, SUPPORTED_EXTENSIONS,
};
use crate::error::{LofiError, Result};

/// Result of converting one track
#[derive(Debug, Clone, PartialEq)]
pub struct TrackReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub title: String,
    pub input_secs: f64,
    pub output_secs: f64,
    pub stages: Vec<Stage>,
}

/// Outcome of one track in a batch
#[derive(Debug)]
pub struct TrackOutcome {
    pub input: PathBuf,
    pub result: Result<TrackReport>,
}

/// Success and failure counts for a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: &[TrackOutcome]) -> Self {
        let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
        Self {
            succeeded: outcomes.len() - failed,
            failed,
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Title and output path reserved for one track
#[derive(Debug)]
struct TrackPlan {
    title: String,
    output: PathBuf,
}

/// Converts tracks with one fixed configuration
pub struct Converter {
    pipeline: LofiPipeline,
    titles: Box<dyn TitleResolver>,
    outputs: Box<dyn OutputPathResolver>,
    claimed: Mutex<HashSet<PathBuf>>,
}

impl Converter {
    /// Converter writing `<out_dir>/<title>_converted.wav`
    ///
    /// Fails with `InvalidParameter` if the configuration is invalid.
    pub fn new(config: &EffectConfig, out_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::with_collaborators(
            config,
            Box::new(EmbeddedTagTitle),
            Box::new(SuffixedOutputPath::new(out_dir)),
        )
    }

    /// Converter with custom title and output-path collaborators
    pub fn with_collaborators(
        config: &EffectConfig,
        titles: Box<dyn TitleResolver>,
        outputs: Box<dyn OutputPathResolver>,
    ) -> Result<Self> {
        Ok(Self {
            pipeline: LofiPipeline::from_config(config)?,
            titles,
            outputs,
            claimed: Mutex::new(HashSet::new()),
        })
    }

    /// Decode, process and export one track
    pub fn convert_track(&self, input: &Path) -> Result<TrackReport> {
        let plan = self.plan(input)?;
        self.render(input, plan)
    }

    /// Resolve the title and reserve a unique output path
    fn plan(&self, input: &Path) -> Result<TrackPlan> {
        let title = self.titles.resolve(input);
        let preferred = self.outputs.output_path(input, &title)?;
        let output = self.claim_output(preferred);
        Ok(TrackPlan { title, output })
    }

    fn claim_output(&self, preferred: PathBuf) -> PathBuf {
        let mut claimed = self.claimed.lock().unwrap_or_else(PoisonError::into_inner);

        let mut candidate = preferred.clone();
        let mut n = 2;
        while !claimed.insert(candidate.clone()) {
            candidate = numbered_path(&preferred, n);
            n += 1;
        }

        if candidate != preferred {
            warn!(
                "{} is already taken in this run, writing {} instead",
                preferred.display(),
                candidate.display()
            );
        }
        candidate
    }

    fn render(&self, input: &Path, plan: TrackPlan) -> Result<TrackReport> {
        info!("processing {}", input.display());

        let buffer = decode_audio(input)?;
        let processed = self.pipeline.process(&buffer)?;

        let TrackPlan { title, output } = plan;
        encode_wav(&processed.buffer, &output)?;

        info!(
            "saved {} ({:.2}s -> {:.2}s)",
            output.display(),
            buffer.duration_secs(),
            processed.buffer.duration_secs()
        );

        Ok(TrackReport {
            input: input.to_path_buf(),
            output,
            title,
            input_secs: buffer.duration_secs(),
            output_secs: processed.buffer.duration_secs(),
            stages: processed.applied(),
        })
    }

    /// Convert every input, in parallel across tracks
    ///
    /// `workers == 0` uses rayon's default thread count. Outcomes are
    /// returned in input order.
    pub fn convert_batch(&self, inputs: &[PathBuf], workers: usize) -> Result<Vec<TrackOutcome>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| LofiError::WorkerPool {
                reason: e.to_string(),
            })?;

        // Output paths are reserved in input order before any worker starts
        let plans: Vec<Result<TrackPlan>> = inputs.iter().map(|input| self.plan(input)).collect();

        let outcomes = pool.install(|| {
            inputs
                .par_iter()
                .zip(plans.into_par_iter())
                .map(|(input, plan)| {
                    let result = plan.and_then(|plan| self.render(input, plan));
                    if let Err(ref err) = result {
                        warn!("{}: [{}] {}", input.display(), err.error_code(), err);
                    }
                    TrackOutcome {
                        input: input.clone(),
                        result,
                    }
                })
                .collect()
        });

        Ok(outcomes)
    }
}

/// Expand inputs into the list of tracks to convert
///
/// Directories are searched recursively for files with a supported audio
/// extension (sorted); any other path is kept as given, so a missing file
/// surfaces as a per-track error.
pub fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut tracks = Vec::new();

    for path in paths {
        if !path.is_dir() {
            tracks.push(path.clone());
            continue;
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(path) {
            let entry = entry.map_err(std::io::Error::from)?;
            if entry.file_type().is_file() && has_input_extension(entry.path()) {
                found.push(entry.path().to_path_buf());
            }
        }
        found.sort();
        tracks.extend(found);
    }

    Ok(tracks)
}

fn has_input_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy();
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

/// `dir/name.ext` -> `dir/name_<n>.ext`
fn numbered_path(path: &Path, n: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, n, ext.to_string_lossy()),
        None => format!("{}_{}", stem, n),
    };
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::generate_stereo_test_tone;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_collect_inputs_expands_directories() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("album");
        std::fs::create_dir_all(&nested).unwrap();
        for name in ["b.wav", "a.WAV", "c.mp3", "d.flac", "notes.txt", "cover.jpg"] {
            std::fs::write(nested.join(name), b"").unwrap();
        }
        let single = dir.path().join("single.txt");

        let tracks = collect_inputs(&[nested.clone(), single.clone()]).unwrap();
        assert_eq!(
            tracks,
            vec![
                nested.join("a.WAV"),
                nested.join("b.wav"),
                nested.join("c.mp3"),
                nested.join("d.flac"),
                single
            ]
        );
    }

    #[test]
    fn test_summary_counts() {
        let outcomes = vec![
            TrackOutcome {
                input: PathBuf::from("a.wav"),
                result: Err(LofiError::DegenerateSignal { stage: "reverb" }),
            },
            TrackOutcome {
                input: PathBuf::from("b.wav"),
                result: Ok(TrackReport {
                    input: PathBuf::from("b.wav"),
                    output: PathBuf::from("musics/b_converted.wav"),
                    title: "b".to_string(),
                    input_secs: 1.0,
                    output_secs: 1.0,
                    stages: vec![Stage::Normalize],
                }),
            },
        ];
        let summary = BatchSummary::from_outcomes(&outcomes);
        assert_eq!(summary, BatchSummary { succeeded: 1, failed: 1 });
        assert!(!summary.all_succeeded());
    }

    #[test]
    fn test_batch_isolates_failures() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.wav");
        encode_wav(&generate_stereo_test_tone(440.0, 550.0, 0.3, 8000), &good).unwrap();
        let missing = dir.path().join("missing.wav");

        let converter = Converter::new(&EffectConfig::default(), dir.path().join("out")).unwrap();
        let outcomes = converter
            .convert_batch(&[missing.clone(), good.clone()], 2)
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].input, missing);
        assert!(matches!(
            outcomes[0].result,
            Err(LofiError::FileNotFound { .. })
        ));

        let report = outcomes[1].result.as_ref().unwrap();
        assert_eq!(report.title, "good");
        assert_eq!(report.output, dir.path().join("out").join("good_converted.wav"));
        assert!(report.output.exists());
        assert!(report.output_secs > report.input_secs);
    }

    #[test]
    fn test_same_title_gets_distinct_outputs() {
        let dir = tempdir().unwrap();
        let mut inputs = Vec::new();
        for album in ["a", "b", "c"] {
            let album_dir = dir.path().join(album);
            std::fs::create_dir_all(&album_dir).unwrap();
            let path = album_dir.join("song.wav");
            encode_wav(&generate_stereo_test_tone(440.0, 550.0, 0.2, 8000), &path).unwrap();
            inputs.push(path);
        }
        let out_dir = dir.path().join("out");

        let converter = Converter::new(&EffectConfig::default(), &out_dir).unwrap();
        let outcomes = converter.convert_batch(&inputs, 3).unwrap();

        let outputs: Vec<PathBuf> = outcomes
            .iter()
            .map(|o| o.result.as_ref().unwrap().output.clone())
            .collect();
        assert_eq!(
            outputs,
            vec![
                out_dir.join("song_converted.wav"),
                out_dir.join("song_converted_2.wav"),
                out_dir.join("song_converted_3.wav"),
            ]
        );
        for output in &outputs {
            assert!(decode_audio(output).unwrap().frames() > 0);
        }
    }

    #[test]
    fn test_numbered_path() {
        assert_eq!(
            numbered_path(Path::new("out/song_converted.wav"), 2),
            PathBuf::from("out/song_converted_2.wav")
        );
        assert_eq!(
            numbered_path(Path::new("out/noext"), 3),
            PathBuf::from("out/noext_3")
        );
    }

    #[test]
    fn test_invalid_config_rejected_up_front() {
        let config = EffectConfig {
            slow_speed: 0.0,
            ..EffectConfig::default()
        };
        assert!(Converter::new(&config, "unused").is_err());
    }
}
