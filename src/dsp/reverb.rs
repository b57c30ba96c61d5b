//! Delay-network reverb
//!
//! A fixed network of seven delayed, exponentially decaying copies of the
//! dry signal plus a single feedback pass. The per-band decays and gains are
//! collapsed to their averages: the average decay sets the tap spacing and
//! the average gain scales every tap.
//!
//! Stages:
//! 1. taps `k = 1..=7` at `floor(avg_decay * sr * 0.05 * k)` samples, scaled by
//!    `exp(-0.3 k)` and the linear average gain
//! 2. one feedback echo of the tap sum at `floor(avg_decay * sr * 0.3)`, x0.3
//! 3. wet normalized to 0.8 peak
//! 4. blend with `min(0.9, 2 * mix)` wet, then normalize to 0.95 peak

use tracing::debug;

use super::effect::{check_input, check_output, Effect};
use super::params::{EffectKind, EffectParameters};
use crate::engine::buffer::{db_to_linear, normalize_peak, SignalBuffer};
use crate::error::ProcessingFailure;

// ============================================================================
// Network Constants
// ============================================================================

/// Number of delay taps
pub const NUM_TAPS: usize = 7;

/// Tap spacing as a fraction of the average decay
const TAP_SPACING: f64 = 0.05;

/// Exponential attenuation per tap index
const TAP_DECAY_RATE: f64 = 0.3;

/// Feedback delay as a fraction of the average decay
const FEEDBACK_DELAY_RATIO: f64 = 0.3;

/// Feedback echo level
const FEEDBACK_GAIN: f64 = 0.3;

/// Peak level of the wet signal before blending
pub const WET_PEAK: f64 = 0.8;

/// Peak level of the blended output
pub const OUTPUT_PEAK: f64 = 0.95;

/// Requested mix is doubled before blending
const MIX_SCALE: f64 = 2.0;

/// Ceiling on the effective wet proportion
pub const MAX_EFFECTIVE_MIX: f64 = 0.9;

const EFFECT_NAME: &str = "reverb";

// ============================================================================
// Helpers
// ============================================================================

/// Wet proportion actually used for a requested mix
pub fn effective_mix(mix: f64) -> f64 {
    (mix * MIX_SCALE).min(MAX_EFFECTIVE_MIX)
}

/// Delay in samples of each tap, in tap order
pub fn tap_delays(avg_decay_s: f64, sample_rate: u32) -> [usize; NUM_TAPS] {
    let base = avg_decay_s * sample_rate as f64 * TAP_SPACING;
    std::array::from_fn(|i| (base * (i + 1) as f64).floor() as usize)
}

/// Attenuation of each tap, in tap order
pub fn tap_gains() -> [f64; NUM_TAPS] {
    std::array::from_fn(|i| (-TAP_DECAY_RATE * (i + 1) as f64).exp())
}

/// Delay in samples of the feedback echo
pub fn feedback_delay(avg_decay_s: f64, sample_rate: u32) -> usize {
    (avg_decay_s * sample_rate as f64 * FEEDBACK_DELAY_RATIO).floor() as usize
}

/// `dst[i] += src[i - delay] * scale` for every `i >= delay`
///
/// A zero delay adds an unshifted copy.
fn add_delayed(dst: &mut [f64], src: &[f64], delay: usize, scale: f64) {
    if delay >= dst.len() {
        return;
    }
    for (out, &s) in dst[delay..].iter_mut().zip(src) {
        *out += s * scale;
    }
}

// ============================================================================
// Reverb Synthesizer
// ============================================================================

/// Stateless delay-network reverb
#[derive(Debug, Clone, Copy, Default)]
pub struct ReverbSynthesizer;

impl ReverbSynthesizer {
    pub fn new() -> Self {
        Self
    }

    /// Build the wet signal for one channel
    fn wet_channel(dry: &[f64], taps: &[usize; NUM_TAPS], feedback: usize, gain: f64) -> Vec<f64> {
        let mut wet = vec![0.0; dry.len()];
        for (&delay, tap_gain) in taps.iter().zip(tap_gains()) {
            add_delayed(&mut wet, dry, delay, tap_gain * gain);
        }
        // Single echo of the pre-feedback tap sum.
        if feedback < wet.len() {
            let taps_only = wet.clone();
            add_delayed(&mut wet, &taps_only, feedback, FEEDBACK_GAIN);
        }
        wet
    }

    /// Apply the reverb to `signal`
    ///
    /// Parameters are sanitized first, so out-of-range decays, gains and mix
    /// are clamped rather than rejected. Mono input is duplicated to stereo.
    ///
    /// # Errors
    /// Returns a [`ProcessingFailure`] when the input is unusable or the
    /// output is not finite stereo of the input's length.
    pub fn process(
        &self,
        signal: &SignalBuffer,
        params: &EffectParameters,
    ) -> Result<SignalBuffer, ProcessingFailure> {
        check_input(EFFECT_NAME, signal)?;

        let params = params.sanitized();
        let sample_rate = signal.sample_rate();
        let avg_decay = params.average_decay_s();
        let gain = db_to_linear(params.average_gain_db());
        let taps = tap_delays(avg_decay, sample_rate);
        let feedback = feedback_delay(avg_decay, sample_rate);

        let stereo = signal.to_stereo();
        let dry = stereo.to_f64_channels();

        let mut wet: Vec<Vec<f64>> = dry
            .iter()
            .map(|channel| Self::wet_channel(channel, &taps, feedback, gain))
            .collect();
        normalize_peak(&mut wet, WET_PEAK);

        let mix = effective_mix(params.mix);
        let mut blended: Vec<Vec<f64>> = dry
            .iter()
            .zip(&wet)
            .map(|(d, w)| {
                d.iter()
                    .zip(w)
                    .map(|(&d, &w)| (1.0 - mix) * d + mix * w)
                    .collect()
            })
            .collect();
        normalize_peak(&mut blended, OUTPUT_PEAK);

        debug!(
            frames = stereo.num_frames(),
            avg_decay_s = avg_decay,
            first_tap = taps[0],
            feedback_delay = feedback,
            effective_mix = mix,
            "applied reverb"
        );

        let output = stereo.with_f64_channels(blended);
        check_output(EFFECT_NAME, signal, &output)?;
        Ok(output)
    }
}

impl Effect for ReverbSynthesizer {
    fn kind(&self) -> EffectKind {
        EffectKind::Reverb
    }

    fn display_name(&self) -> &'static str {
        "Delay Network Reverb"
    }

    fn apply(
        &self,
        signal: &SignalBuffer,
        params: &EffectParameters,
    ) -> Result<SignalBuffer, ProcessingFailure> {
        self.process(signal, params)
    }
}

// ============================================================================
// Tests
// ============================================================================
