//! Error handling for text2fx
//!
//! Three tiers, from innermost to outermost:
//! - [`FilterError`]: a single band could not be designed or applied. The
//!   equalizer absorbs it and treats the band as silence.
//! - [`ProcessingFailure`]: a whole effect stage failed. The engine absorbs it
//!   and hands back the untouched input.
//! - [`Text2FxError`]: I/O, configuration and translation errors. Always
//!   propagated to the caller.

use thiserror::Error;

/// Result type alias for text2fx operations
pub type Result<T> = std::result::Result<T, Text2FxError>;

/// Why a single band filter contributed nothing
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("Band {band} is degenerate: normalized high edge {high_norm:.4} >= 1.0")]
    DegenerateBand { band: usize, high_norm: f64 },

    #[error("Band {band} edges are invalid: low {low_norm:.4}, high {high_norm:.4}")]
    InvalidEdges {
        band: usize,
        low_norm: f64,
        high_norm: f64,
    },

    #[error("Filter design failed: {reason}")]
    DesignFailed { reason: String },

    #[error("Filter produced non-finite output")]
    NonFiniteOutput,
}

/// A whole effect stage failed and its output must not be used
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProcessingFailure {
    #[error("Unsupported channel count: {channels} (only mono/stereo)")]
    UnsupportedChannels { channels: usize },

    #[error("Invalid sample rate: {sample_rate} Hz")]
    InvalidSampleRate { sample_rate: u32 },

    #[error("Input to '{effect}' contains NaN/Inf samples")]
    NonFiniteInput { effect: &'static str },

    #[error("Effect '{effect}' produced invalid audio (NaN/Inf)")]
    NonFiniteOutput { effect: &'static str },

    #[error("Effect '{effect}' changed the buffer shape")]
    ShapeMismatch { effect: &'static str },
}

/// Main error type for text2fx operations
#[derive(Error, Debug)]
pub enum Text2FxError {
    // File Errors
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to decode audio file {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: hound::Error,
    },

    #[error("Failed to encode audio file {path}: {source}")]
    Encode {
        path: String,
        #[source]
        source: hound::Error,
    },

    #[error("Unsupported audio format: {details}")]
    UnsupportedFormat { details: String },

    #[error("Resampling from {from} Hz to {to} Hz failed: {reason}")]
    Resample { from: u32, to: u32, reason: String },

    // Buffer Errors
    #[error("Invalid audio buffer: {reason}")]
    InvalidBuffer { reason: String },

    // Configuration Errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // Request Errors
    #[error("Invalid request: {field} {reason}")]
    InvalidRequest { field: String, reason: String },

    // Translation Errors
    #[error("Chat API authentication failed. Check your API key.")]
    LlmAuth,

    #[error("Chat API rate limit exceeded. Try again later.")]
    LlmRateLimited,

    #[error("Chat API error: {message}")]
    LlmApi { message: String },

    #[error("Model returned non-JSON twice")]
    LlmInvalidJson,

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Text2FxError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            Text2FxError::FileNotFound { .. } => "FILE_NOT_FOUND",
            Text2FxError::Decode { .. } => "DECODE_ERROR",
            Text2FxError::Encode { .. } => "ENCODE_ERROR",
            Text2FxError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            Text2FxError::Resample { .. } => "RESAMPLE_ERROR",
            Text2FxError::InvalidBuffer { .. } => "INVALID_BUFFER",
            Text2FxError::InvalidConfig { .. } => "INVALID_CONFIG",
            Text2FxError::InvalidRequest { .. } => "INVALID_REQUEST",
            Text2FxError::LlmAuth => "LLM_AUTH",
            Text2FxError::LlmRateLimited => "LLM_RATE_LIMITED",
            Text2FxError::LlmApi { .. } => "LLM_API_ERROR",
            Text2FxError::LlmInvalidJson => "LLM_INVALID_JSON",
            Text2FxError::Io(_) => "IO_ERROR",
            Text2FxError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Returns a suggested recovery action for this error
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            Self::FileNotFound { .. } => "Check the file path is correct",
            Self::Decode { .. } => "Check that the file is a valid WAV file",
            Self::UnsupportedFormat { .. } => "Convert to mono or stereo WAV (8/16/24/32-bit)",
            Self::InvalidConfig { .. } => "Check TEXT2FX_* environment variables and config files",
            Self::InvalidRequest { .. } => "Shorten the instruction or instrument text",
            Self::LlmAuth => "Set OPENAI_API_KEY to a key starting with 'sk-'",
            Self::LlmRateLimited => "Wait a moment and retry",
            Self::LlmInvalidJson => "Rephrase the instruction and retry",
            _ => "Check the error details and try again",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = Text2FxError::FileNotFound {
            path: "test.wav".to_string(),
        };
        assert_eq!(err.error_code(), "FILE_NOT_FOUND");
        assert_eq!(Text2FxError::LlmInvalidJson.error_code(), "LLM_INVALID_JSON");
    }

    #[test]
    fn test_recovery_hints() {
        assert!(Text2FxError::LlmAuth.recovery_hint().contains("OPENAI_API_KEY"));
        let err = Text2FxError::InvalidBuffer {
            reason: "x".to_string(),
        };
        assert!(!err.recovery_hint().is_empty());
    }

    #[test]
    fn test_filter_error_display() {
        let err = FilterError::DegenerateBand {
            band: 11,
            high_norm: 1.0,
        };
        assert!(err.to_string().contains("Band 11"));
    }

    #[test]
    fn test_processing_failure_display() {
        let err = ProcessingFailure::NonFiniteOutput { effect: "reverb" };
        assert!(err.to_string().contains("reverb"));
    }
}
