//! Runtime configuration
//!
//! [`EngineConfig`] is fixed when an engine is built and never changes
//! afterwards. [`LlmSettings`] holds the chat-completions endpoint settings
//! used by the text-to-parameter translator.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dsp::bands::BandSpec;
use crate::engine::buffer::DEFAULT_SAMPLE_RATE;
use crate::error::{Result, Text2FxError};

/// Environment variable overriding the decode target rate
pub const SAMPLE_RATE_ENV: &str = "TEXT2FX_SAMPLE_RATE";

/// Immutable engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Decode target and processing sample rate in Hz
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Band ladder for the equalizer
    #[serde(default)]
    pub bands: BandSpec,
}

fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            bands: BandSpec::default(),
        }
    }
}

impl EngineConfig {
    /// Config at a specific sample rate with the standard ladder
    pub fn with_sample_rate(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            ..Self::default()
        }
    }

    /// Defaults, with the sample rate taken from `TEXT2FX_SAMPLE_RATE` if set
    pub fn from_env() -> Result<Self> {
        let config = match std::env::var(SAMPLE_RATE_ENV) {
            Ok(raw) => {
                let sample_rate = raw.trim().parse::<u32>().map_err(|_| {
                    Text2FxError::InvalidConfig {
                        reason: format!("{}='{}' is not a sample rate", SAMPLE_RATE_ENV, raw),
                    }
                })?;
                Self::with_sample_rate(sample_rate)
            }
            Err(_) => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Text2FxError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the sample rate and band edges
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(Text2FxError::InvalidConfig {
                reason: "sample_rate must be positive".to_string(),
            });
        }
        if BandSpec::new(*self.bands.edges()).is_none() {
            return Err(Text2FxError::InvalidConfig {
                reason: "band edges must be positive and strictly increasing".to_string(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Chat endpoint settings
// ============================================================================

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_TEMPERATURE: f64 = 0.1;
pub const DEFAULT_MAX_TOKENS: u32 = 512;
pub const DEFAULT_TIMEOUT_S: u64 = 45;

/// Chat-completions endpoint settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout_s: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_s: DEFAULT_TIMEOUT_S,
        }
    }
}

impl LlmSettings {
    /// Read settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary lookup (environment, map, ...)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            api_key: get("OPENAI_API_KEY"),
            base_url: get("OPENAI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            model: get("OPENAI_MODEL").unwrap_or(defaults.model),
            temperature: parse_or("GEN_TEMPERATURE", get("GEN_TEMPERATURE"), defaults.temperature)?,
            max_tokens: parse_or("GEN_MAX_TOKENS", get("GEN_MAX_TOKENS"), defaults.max_tokens)?,
            timeout_s: parse_or("REQUEST_TIMEOUT_S", get("REQUEST_TIMEOUT_S"), defaults.timeout_s)?,
        })
    }

    /// Full URL of the chat-completions endpoint
    pub fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T> {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| Text2FxError::InvalidConfig {
                reason: format!("{}='{}' could not be parsed", key, value),
            }),
        None => Ok(default),
    }
}
