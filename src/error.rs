//! Error handling for Lofi
//!
//! Every error carries a stable code and recovery suggestions so the CLI can
//! report a failed track and move on to the next one.

use thiserror::Error;

/// Result type alias for Lofi operations
pub type Result<T> = std::result::Result<T, LofiError>;

/// Main error type for Lofi operations
#[derive(Error, Debug)]
pub enum LofiError {
    // File Errors
    #[error("File not found: {path}")]
    FileNotFound {
        path: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Could not decode {path}: {reason}")]
    DecodeFailure {
        path: String,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Could not encode {path}: {reason}")]
    EncodeFailure {
        path: String,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Processing Errors
    #[error("Invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("{stage} requires stereo input, got {channels} channel(s)")]
    UnsupportedChannelLayout {
        stage: &'static str,
        channels: usize,
    },

    #[error("{stage}: signal is silent or near-silent, stage skipped")]
    DegenerateSignal { stage: &'static str },

    // Resource Errors
    #[error("Worker pool error: {reason}")]
    WorkerPool { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LofiError {
    /// Shorthand for an `InvalidParameter` error
    pub fn invalid_parameter(
        name: &'static str,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        LofiError::InvalidParameter {
            name,
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            LofiError::FileNotFound { .. } => "FILE_NOT_FOUND",
            LofiError::DecodeFailure { .. } => "DECODE_FAILURE",
            LofiError::EncodeFailure { .. } => "ENCODE_FAILURE",
            LofiError::InvalidParameter { .. } => "INVALID_PARAMETER",
            LofiError::UnsupportedChannelLayout { .. } => "UNSUPPORTED_CHANNEL_LAYOUT",
            LofiError::DegenerateSignal { .. } => "DEGENERATE_SIGNAL",
            LofiError::WorkerPool { .. } => "WORKER_POOL",
            LofiError::Io(_) => "IO_ERROR",
            LofiError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error is recoverable
    ///
    /// A degenerate signal never aborts a track: the stage passes the buffer
    /// through unchanged.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, LofiError::DegenerateSignal { .. })
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            LofiError::FileNotFound { .. } => vec![
                "Check the file path is correct",
                "Verify the file hasn't been moved or deleted",
            ],
            LofiError::DecodeFailure { .. } => vec![
                "Re-encode the file as WAV, FLAC or MP3",
                "Check if the file plays in another application",
            ],
            LofiError::EncodeFailure { .. } => vec![
                "Check the output directory is writable",
                "Free up disk space",
            ],
            LofiError::InvalidParameter { .. } => vec![
                "Run `lofi show-config` to see the effective settings",
                "Speeds, delays, repeats and cycle lengths must be positive",
            ],
            LofiError::UnsupportedChannelLayout { .. } => vec![
                "Disable --surround and --dimension for mono tracks",
                "Convert the track to stereo first",
            ],
            _ => vec![],
        }
    }
}
