//! Model reply parsing and normalization
//!
//! The model's reply is untrusted. Anything missing gets a default, lists are
//! forced to twelve entries and every value is clamped, so a reply that
//! parses as JSON always yields a usable [`Text2FxResponse`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dsp::bands::NUM_BANDS;
use crate::dsp::params::{
    clamp_decay, clamp_gain, clamp_mix, fit_to_bands, EffectParameters, DEFAULT_DECAY_S,
    DEFAULT_GAIN_DB,
};

/// Schema tag on every response
pub const SCHEMA_VERSION: &str = "reverb_v1";

/// Mix used when the reply has none
pub const DEFAULT_REPLY_MIX: f64 = 0.25;

/// Longest `reason` kept, in characters
pub const MAX_REASON_CHARS: usize = 280;

/// Parameter block of a reverb response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReverbV1 {
    pub gains_db: Vec<f64>,
    pub decays_s: Vec<f64>,
    pub mix: f64,
}

impl From<ReverbV1> for EffectParameters {
    fn from(reverb: ReverbV1) -> Self {
        EffectParameters::new(reverb.gains_db, reverb.decays_s, reverb.mix)
    }
}

/// Normalized translation result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text2FxResponse {
    pub schema_version: String,
    pub reverb: ReverbV1,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Parse `text` as JSON, returning `None` instead of an error
pub fn parse_json_safe(text: &str) -> Option<Value> {
    serde_json::from_str(text).ok()
}

fn number_list(value: Option<&Value>, pad: f64) -> Vec<f64> {
    let values: Vec<f64> = match value.and_then(Value::as_array) {
        Some(items) => items.iter().map(|v| v.as_f64().unwrap_or(pad)).collect(),
        None => vec![pad; NUM_BANDS],
    };
    fit_to_bands(&values, pad)
}

/// Fill defaults, fix lengths and clamp every value of a raw reply
pub fn normalize_response(raw: &Value) -> Text2FxResponse {
    let reverb = raw.get("reverb");
    let field = |name: &str| reverb.and_then(|r| r.get(name));

    let gains_db = number_list(field("gains_db"), DEFAULT_GAIN_DB)
        .into_iter()
        .map(clamp_gain)
        .collect();
    let decays_s = number_list(field("decays_s"), DEFAULT_DECAY_S)
        .into_iter()
        .map(clamp_decay)
        .collect();
    let mix = clamp_mix(field("mix").and_then(Value::as_f64).unwrap_or(DEFAULT_REPLY_MIX));

    let reason = raw
        .get("reason")
        .and_then(Value::as_str)
        .filter(|r| !r.is_empty())
        .map(|r| r.chars().take(MAX_REASON_CHARS).collect());

    Text2FxResponse {
        schema_version: SCHEMA_VERSION.to_string(),
        reverb: ReverbV1 {
            gains_db,
            decays_s,
            mix,
        },
        reason,
    }
}
