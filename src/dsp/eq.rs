//! Twelve-band equalizer
//!
//! Splits each channel into the twelve bands of the ladder with zero-phase
//! Butterworth filters, scales every band by its gain and sums the bands
//! back together. The summed output is peak-normalized to 0.95 across both
//! channels.
//!
//! A band whose filter cannot be designed or applied contributes silence;
//! the other bands still play.

use tracing::{debug, warn};

use super::bands::{BandSpec, NUM_BANDS};
use super::effect::{check_input, check_output, Effect};
use super::filter::BandFilter;
use super::params::{clamp_gain, fit_to_bands, EffectKind, EffectParameters, DEFAULT_GAIN_DB};
use crate::engine::buffer::{db_to_linear, normalize_peak, SignalBuffer};
use crate::error::{FilterError, ProcessingFailure};

/// Peak level of the equalized output
pub const OUTPUT_PEAK: f64 = 0.95;

const EFFECT_NAME: &str = "eq";

/// Band-splitting equalizer over a fixed ladder
#[derive(Debug, Clone, Default)]
pub struct Equalizer {
    bands: BandSpec,
}

impl Equalizer {
    /// Create an equalizer over the given ladder
    pub fn new(bands: BandSpec) -> Self {
        Self { bands }
    }

    /// Ladder this equalizer splits on
    pub fn bands(&self) -> &BandSpec {
        &self.bands
    }

    /// Design one filter per band at `sample_rate`
    ///
    /// Bands that cannot be designed come back as `None`. Degenerate bands are
    /// expected (the last band always reaches Nyquist) and are logged at debug
    /// level; anything else is a warning.
    pub fn design_filters(&self, sample_rate: u32) -> Vec<Option<BandFilter>> {
        (0..NUM_BANDS)
            .map(|band| match BandFilter::design(&self.bands, band, sample_rate) {
                Ok(filter) => Some(filter),
                Err(err @ FilterError::DegenerateBand { .. }) => {
                    debug!(band, sample_rate, error = %err, "skipping band");
                    None
                }
                Err(err) => {
                    warn!(band, sample_rate, error = %err, "band filter design failed");
                    None
                }
            })
            .collect()
    }

    /// Isolate band `band` from one channel
    ///
    /// Returns all zeros when the band cannot be filtered, so callers can sum
    /// the result unconditionally.
    pub fn band_signal(&self, samples: &[f64], band: usize, sample_rate: u32) -> Vec<f64> {
        let filter = match BandFilter::design(&self.bands, band, sample_rate) {
            Ok(filter) => filter,
            Err(err) => {
                debug!(band, error = %err, "band contributes silence");
                return vec![0.0; samples.len()];
            }
        };
        filtered_or_silence(&filter, samples)
    }

    /// Equalize `signal` with per-band gains in dB
    ///
    /// Gains are clamped to [-12, 12] dB and padded or truncated to twelve
    /// entries. Mono input is duplicated to stereo first.
    ///
    /// # Errors
    /// Returns a [`ProcessingFailure`] when the input is unusable or the
    /// output is not finite stereo of the input's length.
    pub fn process(
        &self,
        signal: &SignalBuffer,
        gains_db: &[f64],
    ) -> Result<SignalBuffer, ProcessingFailure> {
        check_input(EFFECT_NAME, signal)?;

        let sample_rate = signal.sample_rate();
        let gains: Vec<f64> = fit_to_bands(gains_db, DEFAULT_GAIN_DB)
            .into_iter()
            .map(|g| db_to_linear(clamp_gain(g)))
            .collect();

        let stereo = signal.to_stereo();
        let filters = self.design_filters(sample_rate);
        let active = filters.iter().filter(|f| f.is_some()).count();

        let mut mixed: Vec<Vec<f64>> = stereo
            .to_f64_channels()
            .iter()
            .map(|channel| {
                let mut sum = vec![0.0; channel.len()];
                for (filter, gain) in filters.iter().zip(&gains) {
                    let Some(filter) = filter else { continue };
                    let band = filtered_or_silence(filter, channel);
                    for (acc, s) in sum.iter_mut().zip(&band) {
                        *acc += s * gain;
                    }
                }
                sum
            })
            .collect();

        let peak = normalize_peak(&mut mixed, OUTPUT_PEAK);
        debug!(
            frames = stereo.num_frames(),
            active_bands = active,
            pre_normalize_peak = peak,
            "equalized signal"
        );

        let output = stereo.with_f64_channels(mixed);
        check_output(EFFECT_NAME, signal, &output)?;
        Ok(output)
    }
}

fn filtered_or_silence(filter: &BandFilter, samples: &[f64]) -> Vec<f64> {
    match filter.apply(samples) {
        Ok(band) => band,
        Err(err) => {
            warn!(band = filter.band(), error = %err, "band filter failed, contributing silence");
            vec![0.0; samples.len()]
        }
    }
}

impl Effect for Equalizer {
    fn kind(&self) -> EffectKind {
        EffectKind::Eq
    }

    fn display_name(&self) -> &'static str {
        "12-Band Equalizer"
    }

    fn apply(
        &self,
        signal: &SignalBuffer,
        params: &EffectParameters,
    ) -> Result<SignalBuffer, ProcessingFailure> {
        self.process(signal, &params.gains_db)
    }
}

// ============================================================================
// Tests
// ============================================================================
