//! Transform trait definition
//!
//! Base trait for every pipeline stage. Stages are pure: they read an input
//! buffer and return a new one, never touching the input.

use std::fmt;

use crate::engine::SampleBuffer;
use crate::error::Result;

/// Pipeline stages in the order they always run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Speed = 0,
    Reverb = 1,
    Surround = 2,
    Dimension = 3,
    Normalize = 4,
}

impl Stage {
    /// Short lowercase name used in logs and errors
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Speed => "speed",
            Stage::Reverb => "reverb",
            Stage::Surround => "surround",
            Stage::Dimension => "dimension",
            Stage::Normalize => "normalize",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Base trait for all pipeline stages
pub trait Transform: Send + Sync + fmt::Debug {
    /// Which stage this transform implements
    fn stage(&self) -> Stage;

    /// Reject inputs this transform cannot process
    ///
    /// Called for every stage before the first one runs, so a bad input
    /// fails before any processing.
    fn check_input(&self, _input: &SampleBuffer) -> Result<()> {
        Ok(())
    }

    /// Produce the transformed buffer
    fn apply(&self, input: &SampleBuffer) -> Result<SampleBuffer>;

    /// One-line parameter summary for logs
    fn describe(&self) -> String;
}
