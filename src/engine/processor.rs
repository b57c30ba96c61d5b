//! Request processor
//!
//! The [`Engine`] owns one instance of each effect stage and routes a request
//! to exactly one of them. Stages report failure as a [`ProcessingFailure`];
//! [`Engine::process`] turns that into a pass-through of the original input,
//! while [`Engine::try_process`] hands the failure to the caller.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, info_span, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::dsp::effect::Effect;
use crate::dsp::eq::Equalizer;
use crate::dsp::params::{EffectKind, EffectParameters};
use crate::dsp::reverb::ReverbSynthesizer;
use crate::engine::buffer::SignalBuffer;
use crate::engine::io::{decode_audio, encode_audio, file_checksum};
use crate::error::{ProcessingFailure, Result};

/// Effect engine with immutable configuration
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    equalizer: Equalizer,
    reverb: ReverbSynthesizer,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            equalizer: Equalizer::new(config.bands.clone()),
            reverb: ReverbSynthesizer::new(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Stage that implements `kind`
    pub fn effect(&self, kind: EffectKind) -> &dyn Effect {
        match kind {
            EffectKind::Eq => &self.equalizer,
            EffectKind::Reverb => &self.reverb,
        }
    }

    /// Apply one effect and report failure to the caller
    ///
    /// On success the output is stereo with the input's frame count and
    /// sample rate.
    pub fn try_process(
        &self,
        signal: &SignalBuffer,
        kind: EffectKind,
        params: &EffectParameters,
    ) -> std::result::Result<SignalBuffer, ProcessingFailure> {
        let params = params.sanitized();
        info!(
            effect = %kind,
            channels = signal.channels(),
            frames = signal.num_frames(),
            sample_rate = signal.sample_rate(),
            "processing signal"
        );
        self.effect(kind).apply(signal, &params)
    }

    /// Apply one effect, falling back to the untouched input on failure
    pub fn process(
        &self,
        signal: SignalBuffer,
        kind: EffectKind,
        params: &EffectParameters,
    ) -> SignalBuffer {
        match self.try_process(&signal, kind, params) {
            Ok(output) => output,
            Err(failure) => {
                warn!(
                    effect = %kind,
                    error = %failure,
                    "effect failed, returning original signal"
                );
                signal
            }
        }
    }

    /// Decode `input`, apply one effect and encode the result to `output`
    ///
    /// Effect failures are absorbed (the decoded input is written instead)
    /// and recorded in the report; decode and encode errors are returned.
    pub fn process_file(
        &self,
        input: &Path,
        output: &Path,
        kind: EffectKind,
        params: &EffectParameters,
    ) -> Result<ProcessingReport> {
        let request_id = Uuid::new_v4();
        let span = info_span!("request", %request_id);
        let _guard = span.enter();

        let decoded = decode_audio(input, self.config.sample_rate)?;
        let (rendered, failure) = match self.try_process(&decoded, kind, params) {
            Ok(rendered) => (rendered, None),
            Err(failure) => {
                warn!(effect = %kind, error = %failure, "effect failed, writing original signal");
                (decoded.clone(), Some(failure.to_string()))
            }
        };
        encode_audio(&rendered, output)?;

        let report = ProcessingReport {
            request_id,
            processed_at: Utc::now(),
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            effect: kind,
            parameters: params.sanitized(),
            input_channels: decoded.channels(),
            output_channels: rendered.channels(),
            frames: rendered.num_frames(),
            sample_rate: rendered.sample_rate(),
            duration_secs: rendered.duration_secs(),
            output_peak: rendered.peak(),
            applied: failure.is_none(),
            failure,
            output_sha256: file_checksum(output)?,
        };
        info!(
            effect = %kind,
            frames = report.frames,
            applied = report.applied,
            "request complete"
        );
        Ok(report)
    }
}

/// Summary of one file-to-file request
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingReport {
    pub request_id: Uuid,
    pub processed_at: DateTime<Utc>,
    pub input: PathBuf,
    pub output: PathBuf,
    pub effect: EffectKind,
    /// Parameters after clamping
    pub parameters: EffectParameters,
    pub input_channels: usize,
    pub output_channels: usize,
    pub frames: usize,
    pub sample_rate: u32,
    pub duration_secs: f64,
    pub output_peak: f32,
    /// False when the effect failed and the input was written unchanged
    pub applied: bool,
    pub failure: Option<String>,
    pub output_sha256: String,
}
