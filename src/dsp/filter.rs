//! Butterworth band filters
//!
//! Designs 4th-order Butterworth low-, high- and band-pass filters as cascaded
//! second-order sections and applies them forward-backward so the band signal
//! carries no phase delay.
//!
//! Design follows the classic analog route:
//! prototype poles -> frequency transform -> pre-warped bilinear transform ->
//! conjugate pairs grouped into biquads.

use std::f64::consts::PI;

use num_complex::Complex64;
use tracing::debug;

use super::bands::{BandKind, BandRange, BandSpec};
use crate::error::FilterError;

/// Order of the analog lowpass prototype
pub const FILTER_ORDER: usize = 4;

/// Sampling frequency used by the normalized bilinear transform
const BILINEAR_FS: f64 = 2.0;

/// Imaginary parts below this (relative) are treated as real
const REAL_TOLERANCE: f64 = 1e-10;

// ============================================================================
// Biquad Section
// ============================================================================

/// One second-order section, normalized so that `a0 == 1`
///
/// Transfer function: H(z) = (b0 + b1*z^-1 + b2*z^-2) / (1 + a1*z^-1 + a2*z^-2)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoeffs {
    /// Gain at DC (z = 1)
    fn dc_gain(&self) -> f64 {
        (self.b0 + self.b1 + self.b2) / (1.0 + self.a1 + self.a2)
    }

    /// Filter state reached after a constant input has been applied forever
    fn steady_state(&self, input: f64) -> BiquadState {
        let output = self.dc_gain() * input;
        let s2 = self.b2 * input - self.a2 * output;
        let s1 = self.b1 * input - self.a1 * output + s2;
        BiquadState { s1, s2 }
    }

    /// Complex response at `z`
    fn response(&self, z: Complex64) -> Complex64 {
        let z1 = z.inv();
        let z2 = z1 * z1;
        (z1 * self.b1 + z2 * self.b2 + self.b0) / (z1 * self.a1 + z2 * self.a2 + 1.0)
    }
}

/// Biquad filter state (transposed direct form II)
#[derive(Debug, Clone, Copy, Default)]
struct BiquadState {
    s1: f64,
    s2: f64,
}

impl BiquadState {
    /// Process a single sample through the section
    #[inline]
    fn process(&mut self, input: f64, coeffs: &BiquadCoeffs) -> f64 {
        let output = coeffs.b0 * input + self.s1;
        self.s1 = coeffs.b1 * input - coeffs.a1 * output + self.s2;
        self.s2 = coeffs.b2 * input - coeffs.a2 * output;
        output
    }

    fn scaled(self, factor: f64) -> Self {
        Self {
            s1: self.s1 * factor,
            s2: self.s2 * factor,
        }
    }
}

// ============================================================================
// Butterworth Design
// ============================================================================

/// Zeros, poles and gain of a filter
#[derive(Debug, Clone)]
struct Zpk {
    zeros: Vec<Complex64>,
    poles: Vec<Complex64>,
    gain: f64,
}

/// Poles of the normalized analog Butterworth lowpass
fn prototype_poles(order: usize) -> Vec<Complex64> {
    let n = order as i32;
    (0..n)
        .map(|i| {
            let m = (-n + 1 + 2 * i) as f64;
            -Complex64::from_polar(1.0, PI * m / (2.0 * order as f64))
        })
        .collect()
}

/// Pre-warp a normalized digital frequency for the bilinear transform
fn prewarp(normalized: f64) -> f64 {
    2.0 * BILINEAR_FS * (PI * normalized / BILINEAR_FS).tan()
}

fn lowpass_transform(poles: &[Complex64], cutoff: f64) -> Zpk {
    Zpk {
        zeros: Vec::new(),
        poles: poles.iter().map(|&p| p * cutoff).collect(),
        gain: cutoff.powi(poles.len() as i32),
    }
}

fn highpass_transform(poles: &[Complex64], cutoff: f64) -> Zpk {
    let prod_neg_p = poles
        .iter()
        .fold(Complex64::new(1.0, 0.0), |acc, &p| acc * -p);
    Zpk {
        zeros: vec![Complex64::new(0.0, 0.0); poles.len()],
        poles: poles.iter().map(|&p| Complex64::new(cutoff, 0.0) / p).collect(),
        gain: (Complex64::new(1.0, 0.0) / prod_neg_p).re,
    }
}

fn bandpass_transform(poles: &[Complex64], low: f64, high: f64) -> Zpk {
    let bandwidth = high - low;
    let center_sq = low * high;
    let mut bp_poles = Vec::with_capacity(poles.len() * 2);
    let mut lower = Vec::with_capacity(poles.len());
    for &p in poles {
        let scaled = p * (bandwidth / 2.0);
        let root = (scaled * scaled - center_sq).sqrt();
        bp_poles.push(scaled + root);
        lower.push(scaled - root);
    }
    bp_poles.extend(lower);
    Zpk {
        zeros: vec![Complex64::new(0.0, 0.0); poles.len()],
        poles: bp_poles,
        gain: bandwidth.powi(poles.len() as i32),
    }
}

/// Map an analog zpk to the z-plane; missing zeros land at Nyquist (z = -1)
fn bilinear(analog: Zpk) -> Zpk {
    let fs2 = Complex64::new(2.0 * BILINEAR_FS, 0.0);
    let degree = analog.poles.len() - analog.zeros.len();

    let num = analog
        .zeros
        .iter()
        .fold(Complex64::new(1.0, 0.0), |acc, &z| acc * (fs2 - z));
    let den = analog
        .poles
        .iter()
        .fold(Complex64::new(1.0, 0.0), |acc, &p| acc * (fs2 - p));

    let mut zeros: Vec<Complex64> = analog.zeros.iter().map(|&z| (fs2 + z) / (fs2 - z)).collect();
    zeros.extend(std::iter::repeat(Complex64::new(-1.0, 0.0)).take(degree));

    Zpk {
        zeros,
        poles: analog.poles.iter().map(|&p| (fs2 + p) / (fs2 - p)).collect(),
        gain: analog.gain * (num / den).re,
    }
}

/// Group a digital zpk into biquads; the overall gain goes into the first one
fn zpk_to_sections(zpk: Zpk) -> Result<Vec<BiquadCoeffs>, FilterError> {
    if zpk.poles.iter().any(|p| !p.re.is_finite() || !p.im.is_finite()) || !zpk.gain.is_finite() {
        return Err(FilterError::DesignFailed {
            reason: "non-finite pole or gain".to_string(),
        });
    }
    if let Some(p) = zpk.poles.iter().find(|p| p.norm() >= 1.0) {
        return Err(FilterError::DesignFailed {
            reason: format!("unstable pole at |z| = {:.6}", p.norm()),
        });
    }
    if zpk.zeros.iter().any(|z| z.im.abs() > REAL_TOLERANCE) {
        return Err(FilterError::DesignFailed {
            reason: "complex zeros are not supported".to_string(),
        });
    }

    // Denominators: one per conjugate pair, real poles paired in order.
    let mut denominators: Vec<(f64, f64)> = Vec::new();
    let mut real_poles: Vec<f64> = Vec::new();
    for p in &zpk.poles {
        if p.im.abs() <= REAL_TOLERANCE * p.norm().max(1.0) {
            real_poles.push(p.re);
        } else if p.im > 0.0 {
            denominators.push((-2.0 * p.re, p.norm_sqr()));
        }
    }
    real_poles.sort_by(|a, b| a.total_cmp(b));
    for pair in real_poles.chunks(2) {
        match pair {
            [r1, r2] => denominators.push((-(r1 + r2), r1 * r2)),
            [r] => denominators.push((-r, 0.0)),
            _ => {}
        }
    }
    if denominators.len() * 2 < zpk.poles.len() {
        return Err(FilterError::DesignFailed {
            reason: "poles do not form conjugate pairs".to_string(),
        });
    }

    // Numerators: pair the lowest zero with the highest one.
    let mut zeros: Vec<f64> = zpk.zeros.iter().map(|z| z.re).collect();
    zeros.sort_by(|a, b| a.total_cmp(b));
    let mut numerators: Vec<(f64, f64, f64)> = Vec::with_capacity(denominators.len());
    let (mut lo, mut hi) = (0usize, zeros.len());
    while lo < hi {
        if hi - lo >= 2 {
            let (z1, z2) = (zeros[lo], zeros[hi - 1]);
            numerators.push((1.0, -(z1 + z2), z1 * z2));
            lo += 1;
            hi -= 1;
        } else {
            numerators.push((1.0, -zeros[lo], 0.0));
            lo += 1;
        }
    }
    numerators.resize(denominators.len(), (1.0, 0.0, 0.0));

    let mut sections: Vec<BiquadCoeffs> = numerators
        .into_iter()
        .zip(denominators)
        .map(|((b0, b1, b2), (a1, a2))| BiquadCoeffs { b0, b1, b2, a1, a2 })
        .collect();
    if let Some(first) = sections.first_mut() {
        first.b0 *= zpk.gain;
        first.b1 *= zpk.gain;
        first.b2 *= zpk.gain;
    }
    Ok(sections)
}

// ============================================================================
// Second-Order-Section Filter
// ============================================================================

/// Cascade of biquad sections
#[derive(Debug, Clone, PartialEq)]
pub struct SosFilter {
    sections: Vec<BiquadCoeffs>,
}

impl SosFilter {
    /// Design a Butterworth filter of [`FILTER_ORDER`]
    ///
    /// Edges are normalized to Nyquist. `low` is ignored for a lowpass and
    /// `high` for a highpass.
    pub fn butterworth(kind: BandKind, low: f64, high: f64) -> Result<Self, FilterError> {
        let in_range = |w: f64| w > 0.0 && w < 1.0;
        let valid = match kind {
            BandKind::LowPass => in_range(high),
            BandKind::HighPass => in_range(low),
            BandKind::BandPass => in_range(low) && in_range(high) && low < high,
        };
        if !valid {
            return Err(FilterError::DesignFailed {
                reason: format!("edges ({:.6}, {:.6}) invalid for {:?}", low, high, kind),
            });
        }

        let poles = prototype_poles(FILTER_ORDER);
        let analog = match kind {
            BandKind::LowPass => lowpass_transform(&poles, prewarp(high)),
            BandKind::HighPass => highpass_transform(&poles, prewarp(low)),
            BandKind::BandPass => bandpass_transform(&poles, prewarp(low), prewarp(high)),
        };

        Ok(Self {
            sections: zpk_to_sections(bilinear(analog))?,
        })
    }

    /// The biquad sections in processing order
    pub fn sections(&self) -> &[BiquadCoeffs] {
        &self.sections
    }

    /// Magnitude response at a frequency normalized to Nyquist
    pub fn magnitude(&self, normalized: f64) -> f64 {
        let z = Complex64::from_polar(1.0, PI * normalized);
        self.sections
            .iter()
            .fold(Complex64::new(1.0, 0.0), |acc, s| acc * s.response(z))
            .norm()
    }

    /// Edge padding used by [`SosFilter::filtfilt`]
    pub fn padlen(&self) -> usize {
        let zero_b2 = self.sections.iter().filter(|s| s.b2 == 0.0).count();
        let zero_a2 = self.sections.iter().filter(|s| s.a2 == 0.0).count();
        let taps = 2 * self.sections.len() + 1 - zero_b2.min(zero_a2);
        3 * taps
    }

    /// Single forward pass, states pre-loaded with `initial` scaled by `x0`
    fn run(&self, input: &[f64], initial: &[BiquadState], x0: f64) -> Vec<f64> {
        let mut data = input.to_vec();
        for (coeffs, zi) in self.sections.iter().zip(initial) {
            let mut state = zi.scaled(x0);
            for sample in data.iter_mut() {
                *sample = state.process(*sample, coeffs);
            }
        }
        data
    }

    /// Per-section steady states for a unit step at the cascade input
    fn initial_conditions(&self) -> Vec<BiquadState> {
        let mut scale = 1.0;
        self.sections
            .iter()
            .map(|s| {
                let state = s.steady_state(scale);
                scale *= s.dc_gain();
                state
            })
            .collect()
    }

    /// Filter forward then backward, cancelling the phase response
    ///
    /// The signal is padded with an odd reflection at both ends, and each pass
    /// starts from the steady state for its first sample, which keeps the edge
    /// transients small. The output has the same length as the input.
    pub fn filtfilt(&self, input: &[f64]) -> Result<Vec<f64>, FilterError> {
        if input.is_empty() {
            return Ok(Vec::new());
        }
        let padlen = self.padlen().min(input.len() - 1);
        let extended = odd_extend(input, padlen);
        let zi = self.initial_conditions();

        let mut forward = self.run(&extended, &zi, extended[0]);
        forward.reverse();
        let mut backward = self.run(&forward, &zi, forward[0]);
        backward.reverse();

        let output = backward[padlen..padlen + input.len()].to_vec();
        if output.iter().any(|s| !s.is_finite()) {
            return Err(FilterError::NonFiniteOutput);
        }
        Ok(output)
    }
}

/// Reflect `pad` samples around each end point
fn odd_extend(input: &[f64], pad: usize) -> Vec<f64> {
    let len = input.len();
    let first = input[0];
    let last = input[len - 1];
    let mut out = Vec::with_capacity(len + 2 * pad);
    out.extend((1..=pad).rev().map(|i| 2.0 * first - input[i]));
    out.extend_from_slice(input);
    out.extend((0..pad).map(|j| 2.0 * last - input[len - 2 - j]));
    out
}

// ============================================================================
// Band Filter
// ============================================================================

/// Zero-phase filter isolating one band of the ladder
#[derive(Debug, Clone)]
pub struct BandFilter {
    band: usize,
    range: BandRange,
    filter: SosFilter,
}

impl BandFilter {
    /// Design the filter for `band` at `sample_rate`
    ///
    /// # Errors
    /// * `DegenerateBand` - the normalized high edge reaches Nyquist
    /// * `InvalidEdges` - the index is outside the ladder
    /// * `DesignFailed` - the design produced unusable coefficients
    pub fn design(spec: &BandSpec, band: usize, sample_rate: u32) -> Result<Self, FilterError> {
        let range = spec
            .band_range(band, sample_rate)
            .ok_or(FilterError::InvalidEdges {
                band,
                low_norm: f64::NAN,
                high_norm: f64::NAN,
            })?;
        let (low_norm, high_norm) = range.normalized(sample_rate);

        if range.is_degenerate(sample_rate) {
            return Err(FilterError::DegenerateBand { band, high_norm });
        }

        let filter = SosFilter::butterworth(range.kind, low_norm, high_norm)?;
        debug!(
            band,
            kind = ?range.kind,
            low_hz = range.low_hz,
            high_hz = range.high_hz,
            sections = filter.sections().len(),
            "designed band filter"
        );

        Ok(Self {
            band,
            range,
            filter,
        })
    }

    /// Band index in the ladder
    pub fn band(&self) -> usize {
        self.band
    }

    /// Frequency range covered
    pub fn range(&self) -> BandRange {
        self.range
    }

    /// Underlying section cascade
    pub fn filter(&self) -> &SosFilter {
        &self.filter
    }

    /// Extract this band from one channel
    pub fn apply(&self, samples: &[f64]) -> Result<Vec<f64>, FilterError> {
        self.filter.filtfilt(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const SR: u32 = 44100;

    fn norm(hz: f64) -> f64 {
        hz / (SR as f64 / 2.0)
    }

    fn sine(freq: f64, frames: usize) -> Vec<f64> {
        (0..frames)
            .map(|i| (2.0 * PI * freq * i as f64 / SR as f64).sin())
            .collect()
    }

    #[test]
    fn test_prototype_poles_on_unit_circle() {
        let poles = prototype_poles(4);
        assert_eq!(poles.len(), 4);
        for p in &poles {
            assert_abs_diff_eq!(p.norm(), 1.0, epsilon = 1e-12);
            assert!(p.re < 0.0);
        }
    }

    #[test]
    fn test_lowpass_response() {
        let lp = SosFilter::butterworth(BandKind::LowPass, 0.0, norm(1000.0)).unwrap();
        assert_eq!(lp.sections().len(), 2);
        assert_abs_diff_eq!(lp.magnitude(0.0), 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(lp.magnitude(norm(1000.0)), std::f64::consts::FRAC_1_SQRT_2, epsilon = 1e-6);
        assert!(lp.magnitude(norm(8000.0)) < 1e-3);
    }

    #[test]
    fn test_highpass_response() {
        let hp = SosFilter::butterworth(BandKind::HighPass, norm(1000.0), 0.0).unwrap();
        assert_abs_diff_eq!(hp.magnitude(0.9999), 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(hp.magnitude(norm(1000.0)), std::f64::consts::FRAC_1_SQRT_2, epsilon = 1e-6);
        assert!(hp.magnitude(norm(100.0)) < 1e-3);
    }

    #[test]
    fn test_bandpass_response() {
        let bp = SosFilter::butterworth(BandKind::BandPass, norm(400.0), norm(800.0)).unwrap();
        assert_eq!(bp.sections().len(), 4);
        let center = (400.0_f64 * 800.0).sqrt();
        assert!(bp.magnitude(norm(center)) > 0.99);
        assert_abs_diff_eq!(bp.magnitude(norm(400.0)), std::f64::consts::FRAC_1_SQRT_2, epsilon = 1e-6);
        assert_abs_diff_eq!(bp.magnitude(norm(800.0)), std::f64::consts::FRAC_1_SQRT_2, epsilon = 1e-6);
        assert!(bp.magnitude(0.0) < 1e-9);
        assert!(bp.magnitude(norm(5000.0)) < 1e-3);
    }

    #[test]
    fn test_narrow_low_band_is_stable() {
        let bp = SosFilter::butterworth(BandKind::BandPass, norm(20.0), norm(50.0)).unwrap();
        let out = bp.filtfilt(&sine(31.6, SR as usize)).unwrap();
        assert!(out.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_rejects_invalid_edges() {
        assert!(SosFilter::butterworth(BandKind::BandPass, 0.5, 0.4).is_err());
        assert!(SosFilter::butterworth(BandKind::LowPass, 0.0, 1.0).is_err());
        assert!(SosFilter::butterworth(BandKind::HighPass, 0.0, 0.5).is_err());
    }

    #[test]
    fn test_padlen() {
        let bp = SosFilter::butterworth(BandKind::BandPass, 0.1, 0.2).unwrap();
        assert_eq!(bp.padlen(), 27);
        let lp = SosFilter::butterworth(BandKind::LowPass, 0.0, 0.2).unwrap();
        assert_eq!(lp.padlen(), 15);
    }

    #[test]
    fn test_odd_extend() {
        let x = [1.0, 2.0, 4.0, 7.0];
        assert_eq!(odd_extend(&x, 2), vec![-2.0, 0.0, 1.0, 2.0, 4.0, 7.0, 10.0, 12.0]);
        assert_eq!(odd_extend(&x, 0), x.to_vec());
    }

    #[test]
    fn test_filtfilt_preserves_length_and_phase() {
        let bp = SosFilter::butterworth(BandKind::BandPass, norm(400.0), norm(800.0)).unwrap();
        let input = sine(566.0, 22050);
        let output = bp.filtfilt(&input).unwrap();
        assert_eq!(output.len(), input.len());

        // Zero phase: the steady-state output lines up with the input.
        let mid = 5000..17000;
        let dot: f64 = mid.clone().map(|i| input[i] * output[i]).sum();
        let energy_in: f64 = mid.clone().map(|i| input[i] * input[i]).sum();
        let energy_out: f64 = mid.map(|i| output[i] * output[i]).sum();
        let correlation = dot / (energy_in * energy_out).sqrt();
        assert!(correlation > 0.999, "correlation {}", correlation);
    }

    #[test]
    fn test_filtfilt_short_inputs() {
        let lp = SosFilter::butterworth(BandKind::LowPass, 0.0, 0.3).unwrap();
        assert!(lp.filtfilt(&[]).unwrap().is_empty());
        assert_eq!(lp.filtfilt(&[0.5]).unwrap().len(), 1);
        assert_eq!(lp.filtfilt(&[0.5, -0.5, 0.25]).unwrap().len(), 3);
    }

    #[test]
    fn test_filtfilt_constant_input_lowpass() {
        let lp = SosFilter::butterworth(BandKind::LowPass, 0.0, 0.1).unwrap();
        let out = lp.filtfilt(&vec![0.5; 200]).unwrap();
        for s in out {
            assert_abs_diff_eq!(s, 0.5, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_band_filter_degenerate_last_band() {
        let err = BandFilter::design(&BandSpec::default(), 11, SR).unwrap_err();
        assert!(matches!(err, FilterError::DegenerateBand { band: 11, .. }));
    }

    #[test]
    fn test_band_filter_design_all_regular_bands() {
        let spec = BandSpec::default();
        for band in 0..11 {
            let filter = BandFilter::design(&spec, band, SR).unwrap();
            assert_eq!(filter.band(), band);
        }
    }
}
