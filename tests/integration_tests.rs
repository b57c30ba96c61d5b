//! Integration Tests
//!
//! End-to-end tests for the text2fx pipeline: decode, one effect, encode.

use approx::assert_abs_diff_eq;
use tempfile::tempdir;
use test_case::test_case;

use text2fx::engine::{decode_audio, encode_audio};
use text2fx::{EffectKind, EffectParameters, Engine, EngineConfig, SignalBuffer};

fn params(gain: f64, decay: f64, mix: f64) -> EffectParameters {
    EffectParameters::new(vec![gain; 12], vec![decay; 12], mix)
}

// === Full Pipeline Tests ===

#[test_case(EffectKind::Eq)]
#[test_case(EffectKind::Reverb)]
fn test_file_pipeline(kind: EffectKind) {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.wav");
    let output = dir.path().join("output.wav");
    encode_audio(&SignalBuffer::sine_wave(440.0, 0.5, 44100), &input).unwrap();

    let engine = Engine::default();
    let report = engine
        .process_file(&input, &output, kind, &params(2.0, 1.0, 0.3))
        .unwrap();
    assert!(report.applied);
    assert_eq!(report.effect, kind);

    let rendered = decode_audio(&output, 44100).unwrap();
    assert!(rendered.is_stereo());
    assert_eq!(rendered.num_frames(), 22050);
    assert_abs_diff_eq!(rendered.peak(), 0.95, epsilon = 1e-4);
}

#[test]
fn test_decode_resamples_to_engine_rate() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("48k.wav");
    let output = dir.path().join("out.wav");
    encode_audio(&SignalBuffer::sine_wave(440.0, 0.5, 48000), &input).unwrap();

    let engine = Engine::new(EngineConfig::with_sample_rate(44100));
    let report = engine
        .process_file(&input, &output, EffectKind::Reverb, &EffectParameters::default())
        .unwrap();
    assert_eq!(report.sample_rate, 44100);
    assert_eq!(report.frames, 22050);

    let rendered = decode_audio(&output, 44100).unwrap();
    assert_eq!(rendered.num_frames(), 22050);
}

#[test]
fn test_missing_input_is_an_error() {
    let dir = tempdir().unwrap();
    let engine = Engine::default();
    let result = engine.process_file(
        &dir.path().join("nope.wav"),
        &dir.path().join("out.wav"),
        EffectKind::Eq,
        &EffectParameters::default(),
    );
    assert_eq!(result.unwrap_err().error_code(), "FILE_NOT_FOUND");
}

// === Shape Preservation ===

#[test_case(EffectKind::Eq, 1; "eq mono")]
#[test_case(EffectKind::Eq, 2; "eq stereo")]
#[test_case(EffectKind::Reverb, 1; "reverb mono")]
#[test_case(EffectKind::Reverb, 2; "reverb stereo")]
fn test_output_shape(kind: EffectKind, channels: usize) {
    let engine = Engine::default();
    let mono = SignalBuffer::sine_wave(220.0, 0.3, 44100);
    let input = if channels == 2 { mono.to_stereo() } else { mono };

    let output = engine.process(input.clone(), kind, &EffectParameters::default());
    assert_eq!(output.channels(), 2);
    assert_eq!(output.num_frames(), input.num_frames());
    assert_eq!(output.sample_rate(), input.sample_rate());
}

#[test]
fn test_engines_at_different_rates_coexist() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("44k.wav");
    encode_audio(&SignalBuffer::sine_wave(440.0, 0.2, 44100), &input).unwrap();

    let slow = Engine::new(EngineConfig::with_sample_rate(22050));
    let fast = Engine::new(EngineConfig::with_sample_rate(48000));
    let slow_out = dir.path().join("slow.wav");
    let fast_out = dir.path().join("fast.wav");
    let a = slow
        .process_file(&input, &slow_out, EffectKind::Eq, &EffectParameters::default())
        .unwrap();
    let b = fast
        .process_file(&input, &fast_out, EffectKind::Eq, &EffectParameters::default())
        .unwrap();

    assert_eq!((a.sample_rate, a.frames), (22050, 4410));
    assert_eq!((b.sample_rate, b.frames), (48000, 9600));
    assert!(a.applied && b.applied);

    let slow_wav = decode_audio(&slow_out, 22050).unwrap();
    let fast_wav = decode_audio(&fast_out, 48000).unwrap();
    assert_eq!(slow_wav.num_frames(), 4410);
    assert_eq!(fast_wav.num_frames(), 9600);
    assert_abs_diff_eq!(slow_wav.peak(), 0.95, epsilon = 1e-4);
    assert_abs_diff_eq!(fast_wav.peak(), 0.95, epsilon = 1e-4);
}

// === Scenarios ===

#[test]
fn test_reverb_on_440hz_sine() {
    let engine = Engine::default();
    let dry = SignalBuffer::sine_wave(440.0, 3.0, 44100);
    let output = engine.process(dry.clone(), EffectKind::Reverb, &params(3.0, 2.0, 0.7));

    assert!(output.is_stereo());
    assert_eq!(output.num_frames(), 3 * 44100);
    assert_abs_diff_eq!(output.peak(), 0.95, epsilon = 1e-4);

    let dry_rms = dry.to_stereo().rms();
    assert!(
        (output.rms() - dry_rms).abs() > 0.01,
        "reverb output rms {} too close to dry rms {}",
        output.rms(),
        dry_rms
    );
}

#[test]
fn test_unity_eq_on_440hz_sine() {
    let engine = Engine::default();
    let dry = SignalBuffer::sine_wave(440.0, 1.0, 44100);
    let output = engine.process(dry.clone(), EffectKind::Eq, &params(0.0, 1.0, 0.5));
    assert_abs_diff_eq!(output.peak(), 0.95, epsilon = 1e-4);

    // Away from the edges the waveform keeps its shape
    let mid = 4410..40000;
    let out = &output.channel(0)[mid.clone()];
    let inp = &dry.channel(0)[mid];
    let dot: f64 = out.iter().zip(inp).map(|(&a, &b)| a as f64 * b as f64).sum();
    let norm = |x: &[f32]| x.iter().map(|&v| (v as f64).powi(2)).sum::<f64>().sqrt();
    let correlation = dot / (norm(out) * norm(inp));
    assert!(correlation > 0.99, "correlation {}", correlation);
}

#[test]
fn test_silence_in_silence_out() {
    let engine = Engine::default();
    for kind in [EffectKind::Eq, EffectKind::Reverb] {
        let output = engine.process(
            SignalBuffer::silence(4410, 2, 44100),
            kind,
            &params(6.0, 3.0, 0.8),
        );
        assert!(output.channel_data().iter().flatten().all(|&s| s == 0.0));
    }
}

#[test]
fn test_fail_open_keeps_original() {
    let engine = Engine::default();
    let mut input = SignalBuffer::sine_wave(440.0, 0.1, 44100);
    input.channel_mut(0)[0] = f32::INFINITY;

    let output = engine.process(input.clone(), EffectKind::Eq, &EffectParameters::default());
    assert_eq!(output, input);
    assert!(engine
        .try_process(&input, EffectKind::Eq, &EffectParameters::default())
        .is_err());
}
