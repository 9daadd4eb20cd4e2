//! DSP Effects Library
//!
//! The lofi effects and the pipeline that strings them together.
//! All stages implement the `Transform` trait and never modify their input.

mod normalize;
mod pan;
mod pipeline;
mod reverb;
mod speed;
mod transform;

pub use normalize::PeakNormalize;
pub use pan::{gains_for_pan, DimensionPan, PanSweep, SurroundPan, NEUTRAL_DIMENSION};
pub use pipeline::{process, LofiPipeline, PipelineOutput, StageReport};
pub use reverb::EchoReverb;
pub use speed::{resample_linear, SpeedChange};
pub use transform::{Stage, Transform};
