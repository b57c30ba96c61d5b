//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command. Results are printed as
//! JSON on stdout; logs go to stderr.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::{info, warn};
use walkdir::WalkDir;

use super::ParamArgs;
use crate::config::{EngineConfig, LlmSettings};
use crate::dsp::params::{EffectKind, EffectParameters};
use crate::engine::{Engine, ProcessingReport};
use crate::llm::{build_messages, ChatClient, Text2FxRequest};

/// Resolve parameters from a JSON file or from inline flags
pub fn resolve_params(args: &ParamArgs) -> Result<EffectParameters> {
    if let Some(path) = &args.params {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading parameters from {}", path.display()))?;
        return serde_json::from_str(&json)
            .with_context(|| format!("parsing parameters in {}", path.display()));
    }

    let defaults = EffectParameters::default();
    Ok(EffectParameters::new(
        args.gains.clone().unwrap_or(defaults.gains_db),
        args.decays.clone().unwrap_or(defaults.decays_s),
        args.mix.unwrap_or(defaults.mix),
    ))
}

fn engine_for(sample_rate: Option<u32>) -> Result<Engine> {
    let config = match sample_rate {
        Some(rate) => EngineConfig::with_sample_rate(rate),
        None => EngineConfig::from_env()?,
    };
    config.validate()?;
    Ok(Engine::new(config))
}

/// Process one file and print its report.
pub fn process(
    input: &Path,
    output: &Path,
    effect: EffectKind,
    params: &ParamArgs,
    sample_rate: Option<u32>,
) -> Result<()> {
    let params = resolve_params(params)?;
    let engine = engine_for(sample_rate)?;

    let report = engine
        .process_file(input, output, effect, &params)
        .with_context(|| format!("processing {}", input.display()))?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Every `.wav` file under `dir`, sorted by path
pub fn find_wav_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"))
        })
        .collect();
    files.sort();
    files
}

/// Process every WAV file under `input_dir` into `output_dir`.
///
/// A file that fails to decode or encode is logged and skipped; the command
/// fails only if no file could be processed.
pub fn batch(
    input_dir: &Path,
    output_dir: &Path,
    effect: EffectKind,
    params: &ParamArgs,
    sample_rate: Option<u32>,
) -> Result<Vec<ProcessingReport>> {
    if !input_dir.is_dir() {
        bail!("input directory {} does not exist", input_dir.display());
    }
    let params = resolve_params(params)?;
    let engine = engine_for(sample_rate)?;

    let files = find_wav_files(input_dir);
    info!(count = files.len(), dir = %input_dir.display(), "batch processing");

    let mut reports = Vec::with_capacity(files.len());
    for file in &files {
        let relative = file.strip_prefix(input_dir).unwrap_or(file);
        let target = output_dir.join(relative);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        match engine.process_file(file, &target, effect, &params) {
            Ok(report) => reports.push(report),
            Err(e) => warn!(file = %file.display(), error = %e, code = e.error_code(), "skipping file"),
        }
    }

    if !files.is_empty() && reports.is_empty() {
        bail!("none of the {} files could be processed", files.len());
    }
    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(reports)
}

/// Print the chat messages a translation request would send.
pub fn prompt(fx_type: EffectKind, instrument: &str, instruction: &str) -> Result<()> {
    let request = Text2FxRequest {
        fx_type,
        instrument: instrument.to_string(),
        instruction: instruction.to_string(),
    };
    request.validate()?;
    let messages = build_messages(fx_type.as_str(), instruction, instrument);
    println!("{}", serde_json::to_string_pretty(&messages)?);
    Ok(())
}

/// Ask the chat model for parameters and print the normalized response.
pub fn text2fx(fx_type: EffectKind, instrument: &str, instruction: &str) -> Result<()> {
    let request = Text2FxRequest {
        fx_type,
        instrument: instrument.to_string(),
        instruction: instruction.to_string(),
    };
    let client = ChatClient::new(LlmSettings::from_env()?)?;
    let response = client.translate(&request).map_err(|e| {
        anyhow::anyhow!("{} ({})", e, e.recovery_hint())
    })?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::buffer::SignalBuffer;
    use crate::engine::io::encode_audio;
    use tempfile::tempdir;

    #[test]
    fn test_resolve_inline_params() {
        let args = ParamArgs {
            gains: Some(vec![1.0, 2.0]),
            mix: Some(0.3),
            ..ParamArgs::default()
        };
        let params = resolve_params(&args).unwrap();
        assert_eq!(params.gains_db, vec![1.0, 2.0]);
        assert_eq!(params.decays_s, vec![1.0; 12]);
        assert_eq!(params.mix, 0.3);
    }

    #[test]
    fn test_resolve_params_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("params.json");
        std::fs::write(&path, r#"{"gains_db":[3.0],"mix":0.7}"#).unwrap();
        let args = ParamArgs {
            params: Some(path),
            ..ParamArgs::default()
        };
        let params = resolve_params(&args).unwrap();
        assert_eq!(params.gains_db, vec![3.0]);
        assert_eq!(params.mix, 0.7);
    }

    #[test]
    fn test_find_wav_files_recurses() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("b.WAV"), b"").unwrap();
        std::fs::write(dir.path().join("sub/a.wav"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();

        let files = find_wav_files(dir.path());
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.extension().is_some()));
    }

    #[test]
    fn test_batch_mirrors_layout() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        std::fs::create_dir_all(input.path().join("takes")).unwrap();
        let tone = SignalBuffer::sine_wave(330.0, 0.1, 44100);
        encode_audio(&tone, &input.path().join("takes/vox.wav")).unwrap();
        std::fs::write(input.path().join("broken.wav"), b"nope").unwrap();

        let reports = batch(
            input.path(),
            output.path(),
            EffectKind::Reverb,
            &ParamArgs::default(),
            Some(44100),
        )
        .unwrap();
        assert_eq!(reports.len(), 1);
        assert!(output.path().join("takes/vox.wav").exists());
    }

    #[test]
    fn test_prompt_rejects_long_instrument() {
        assert!(prompt(EffectKind::Reverb, &"x".repeat(31), "hall").is_err());
    }
}
