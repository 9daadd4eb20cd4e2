//! Lofi - offline lofi track converter
//!
//! Turns a decoded track into a "lofi" version with a fixed chain of
//! time-domain effects:
//! 1. Slow down (tempo and pitch together)
//! 2. Echo reverb
//! 3. Surround panning
//! 4. Dimension panning
//! 5. Peak normalization (always)
//!
//! # Architecture
//!
//! - `engine`: sample buffers plus the decode/encode, title and output-path collaborators
//! - `dsp`: the pure transforms and the pipeline that orders them
//! - `config`: the effect settings, loadable from JSON
//! - `batch`: per-track conversion and parallel batches

pub mod batch;
pub mod cli;
pub mod config;
pub mod dsp;
pub mod engine;
pub mod error;

pub use config::EffectConfig;
pub use error::{LofiError, Result};
