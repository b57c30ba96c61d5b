//! Text-to-parameter translation
//!
//! Turns a free-text mixing instruction into reverb parameters by asking a
//! chat model for JSON and normalizing whatever comes back.

pub mod client;
pub mod prompts;
pub mod response;

use serde::{Deserialize, Serialize};

use crate::dsp::params::EffectKind;
use crate::error::{Result, Text2FxError};

pub use client::ChatClient;
pub use prompts::{build_messages, ChatMessage, Role};
pub use response::{normalize_response, parse_json_safe, ReverbV1, Text2FxResponse};

/// Longest instrument name accepted, in characters
pub const MAX_INSTRUMENT_CHARS: usize = 30;
/// Longest instruction accepted, in characters
pub const MAX_INSTRUCTION_CHARS: usize = 200;

/// One translation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text2FxRequest {
    pub fx_type: EffectKind,
    pub instrument: String,
    pub instruction: String,
}

impl Text2FxRequest {
    pub fn reverb(instrument: impl Into<String>, instruction: impl Into<String>) -> Self {
        Self {
            fx_type: EffectKind::Reverb,
            instrument: instrument.into(),
            instruction: instruction.into(),
        }
    }

    /// Check lengths and that the effect has a response schema
    ///
    /// Only reverb replies have a schema, so eq requests are rejected.
    pub fn validate(&self) -> Result<()> {
        if self.fx_type != EffectKind::Reverb {
            return Err(invalid("fx_type", "only 'reverb' can be translated"));
        }
        check_length("instrument", &self.instrument, MAX_INSTRUMENT_CHARS)?;
        check_length("instruction", &self.instruction, MAX_INSTRUCTION_CHARS)
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> Text2FxError {
    Text2FxError::InvalidRequest {
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn check_length(field: &str, value: &str, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len == 0 || len > max {
        return Err(invalid(field, format!("must be 1..={} characters, got {}", max, len)));
    }
    Ok(())
}
