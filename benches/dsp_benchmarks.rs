//! DSP Benchmarks
//!
//! Performance benchmarks for the effect stages and filter design.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use text2fx::dsp::bands::BandSpec;
use text2fx::dsp::filter::BandFilter;
use text2fx::dsp::{EffectParameters, Equalizer, ReverbSynthesizer};
use text2fx::SignalBuffer;

fn benchmark_band_design(c: &mut Criterion) {
    let spec = BandSpec::default();

    c.bench_function("design_11_bands_44k", |b| {
        b.iter(|| {
            for band in 0..11 {
                black_box(BandFilter::design(&spec, band, 44100).unwrap());
            }
        })
    });
}

fn benchmark_equalizer(c: &mut Criterion) {
    let buffer = SignalBuffer::sine_wave(440.0, 5.0, 44100);
    let eq = Equalizer::default();
    let gains = [3.0, 2.0, 1.0, 0.0, -1.0, -2.0, -3.0, -2.0, -1.0, 0.0, 1.0, 2.0];

    c.bench_function("eq_5s_mono", |b| {
        b.iter(|| eq.process(black_box(&buffer), &gains).unwrap())
    });
}

fn benchmark_reverb(c: &mut Criterion) {
    let buffer = SignalBuffer::sine_wave(440.0, 5.0, 44100).to_stereo();
    let reverb = ReverbSynthesizer::new();
    let params = EffectParameters::new(vec![0.0; 12], vec![2.0; 12], 0.4);

    c.bench_function("reverb_5s_stereo", |b| {
        b.iter(|| reverb.process(black_box(&buffer), &params).unwrap())
    });
}

criterion_group!(
    benches,
    benchmark_band_design,
    benchmark_equalizer,
    benchmark_reverb
);
criterion_main!(benches);
