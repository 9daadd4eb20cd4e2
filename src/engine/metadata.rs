//! Track naming collaborators
//!
//! The pipeline never touches tags or the file system. Title lookup and
//! output-path derivation are injected through the two traits below.

use std::path::{Path, PathBuf};

use log::debug;

use crate::engine::io::read_title_tag;
use crate::error::Result;

/// Suffix appended to the title of every converted track
pub const CONVERTED_SUFFIX: &str = "_converted";

/// Default directory converted tracks are written to
pub const DEFAULT_OUTPUT_DIR: &str = "musics";

/// Extension of every exported file
pub const OUTPUT_EXTENSION: &str = "wav";

/// Looks up a human-readable track title for a source file
pub trait TitleResolver: Send + Sync {
    /// Title from embedded metadata, or None when absent or unreadable
    fn read_title(&self, path: &Path) -> Option<String>;

    /// Title from metadata, falling back to the source file stem
    fn resolve(&self, path: &Path) -> String {
        match self.read_title(path) {
            Some(title) if !title.trim().is_empty() => title.trim().to_string(),
            _ => file_stem_title(path),
        }
    }
}

/// Derives where a converted track is written
pub trait OutputPathResolver: Send + Sync {
    /// Output path for `source` titled `title`. May create directories.
    fn output_path(&self, source: &Path, title: &str) -> Result<PathBuf>;
}

/// Source file stem, or "untitled" for paths without one
pub fn file_stem_title(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "untitled".to_string())
}

/// Make a title usable as a single file name
pub fn sanitize_file_name(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim().trim_matches('.').to_string();
    if cleaned.is_empty() {
        "untitled".to_string()
    } else {
        cleaned
    }
}

// ============================================================================
// Title resolvers
// ============================================================================

/// Always uses the file stem
#[derive(Debug, Clone, Copy, Default)]
pub struct FileStemTitle;

impl TitleResolver for FileStemTitle {
    fn read_title(&self, _path: &Path) -> Option<String> {
        None
    }
}

/// Reads the title tag embedded in the file (ID3, RIFF INFO, Vorbis comment)
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedTagTitle;

impl TitleResolver for EmbeddedTagTitle {
    fn read_title(&self, path: &Path) -> Option<String> {
        let title = read_title_tag(path).ok().flatten();
        if let Some(ref t) = title {
            debug!("{}: embedded title '{}'", path.display(), t);
        }
        title
    }
}

// ============================================================================
// Output path resolver
// ============================================================================

/// Writes `<dir>/<title><suffix>.wav`, creating `dir` on demand
#[derive(Debug, Clone)]
pub struct SuffixedOutputPath {
    pub dir: PathBuf,
    pub suffix: String,
}

impl SuffixedOutputPath {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            suffix: CONVERTED_SUFFIX.to_string(),
        }
    }
}

impl Default for SuffixedOutputPath {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_DIR)
    }
}

impl OutputPathResolver for SuffixedOutputPath {
    fn output_path(&self, _source: &Path, title: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let name = format!(
            "{}{}.{}",
            sanitize_file_name(title),
            self.suffix,
            OUTPUT_EXTENSION
        );
        Ok(self.dir.join(name))
    }
}

// ============================================================================
// Tests
// ============================================================================
