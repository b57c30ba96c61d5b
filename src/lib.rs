//! text2fx - Audio Effects Engine
//!
//! Applies one of two effects to a decoded signal:
//! 1. A 12-band equalizer built from zero-phase Butterworth band filters
//! 2. A delay-network reverb with seven decaying taps and one feedback echo
//!
//! # Architecture
//!
//! A request flows decode → stereo → exactly one effect → encode:
//! - `engine`: signal buffer, WAV I/O, and the request processor
//! - `dsp`: band ladder, filter design, and the two effect stages
//! - `llm`: translation of free-text instructions into effect parameters
//!
//! Effect stages never abort a request. When a stage fails,
//! [`Engine::process`] returns the untouched input.

pub mod cli;
pub mod config;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod llm;

pub use config::{EngineConfig, LlmSettings};
pub use dsp::{EffectKind, EffectParameters};
pub use engine::{Engine, SignalBuffer};
pub use error::{FilterError, ProcessingFailure, Result, Text2FxError};
