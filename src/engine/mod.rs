//! Audio Engine Module
//!
//! Everything around the effects pipeline:
//! - Sample buffer representation
//! - Decode (any container) and WAV encode collaborators
//! - Title and output-path collaborators

pub mod buffer;
pub mod io;
pub mod metadata;

pub use buffer::{
    db_to_linear, linear_to_db, ChannelLayout, SampleBuffer, FULL_SCALE, SILENCE_FLOOR,
};
pub use io::{
    decode_audio, encode_wav, generate_stereo_test_tone, generate_test_tone, read_title_tag,
    SUPPORTED_EXTENSIONS,
};
pub use metadata::{
    EmbeddedTagTitle, FileStemTitle, OutputPathResolver, SuffixedOutputPath, TitleResolver,
};
