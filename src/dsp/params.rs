//! Effect parameters
//!
//! Gains, decays and mix arrive from an external translator. They are
//! expected to be validated upstream, but the engine re-enforces every range
//! and the 12-element length before using them.

use serde::{Deserialize, Serialize};

use super::bands::NUM_BANDS;

/// Lowest per-band gain in dB
pub const GAIN_MIN_DB: f64 = -12.0;
/// Highest per-band gain in dB
pub const GAIN_MAX_DB: f64 = 12.0;
/// Shortest per-band decay in seconds
pub const DECAY_MIN_S: f64 = 0.2;
/// Longest per-band decay in seconds
pub const DECAY_MAX_S: f64 = 6.0;

/// Gain used to pad missing bands
pub const DEFAULT_GAIN_DB: f64 = 0.0;
/// Decay used to pad missing bands
pub const DEFAULT_DECAY_S: f64 = 1.0;
/// Mix used when none is given
pub const DEFAULT_MIX: f64 = 0.5;

/// Clamp a gain to [-12, 12] dB; NaN becomes the default gain
pub fn clamp_gain(gain_db: f64) -> f64 {
    if gain_db.is_nan() {
        DEFAULT_GAIN_DB
    } else {
        gain_db.clamp(GAIN_MIN_DB, GAIN_MAX_DB)
    }
}

/// Clamp a decay to [0.2, 6.0] s; NaN becomes the default decay
pub fn clamp_decay(decay_s: f64) -> f64 {
    if decay_s.is_nan() {
        DEFAULT_DECAY_S
    } else {
        decay_s.clamp(DECAY_MIN_S, DECAY_MAX_S)
    }
}

/// Clamp a mix to [0, 1]; NaN becomes the default mix
pub fn clamp_mix(mix: f64) -> f64 {
    if mix.is_nan() {
        DEFAULT_MIX
    } else {
        mix.clamp(0.0, 1.0)
    }
}

/// Truncate or right-pad `values` to exactly 12 entries
pub fn fit_to_bands(values: &[f64], pad: f64) -> Vec<f64> {
    values
        .iter()
        .copied()
        .chain(std::iter::repeat(pad))
        .take(NUM_BANDS)
        .collect()
}

/// Which effect a request applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectKind {
    Eq,
    Reverb,
}

impl EffectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Reverb => "reverb",
        }
    }
}

impl std::fmt::Display for EffectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EffectKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "eq" | "equalizer" => Ok(Self::Eq),
            "reverb" => Ok(Self::Reverb),
            other => Err(format!("unknown effect '{}' (expected eq or reverb)", other)),
        }
    }
}

/// Per-band gains and decays plus a wet/dry mix
///
/// Missing fields deserialize to the defaults (12 x 0 dB, 12 x 1 s, mix 0.5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectParameters {
    #[serde(default = "default_gains")]
    pub gains_db: Vec<f64>,
    #[serde(default = "default_decays")]
    pub decays_s: Vec<f64>,
    #[serde(default = "default_mix")]
    pub mix: f64,
}

fn default_gains() -> Vec<f64> {
    vec![DEFAULT_GAIN_DB; NUM_BANDS]
}

fn default_decays() -> Vec<f64> {
    vec![DEFAULT_DECAY_S; NUM_BANDS]
}

fn default_mix() -> f64 {
    DEFAULT_MIX
}

impl Default for EffectParameters {
    fn default() -> Self {
        Self {
            gains_db: default_gains(),
            decays_s: default_decays(),
            mix: DEFAULT_MIX,
        }
    }
}

impl EffectParameters {
    pub fn new(gains_db: Vec<f64>, decays_s: Vec<f64>, mix: f64) -> Self {
        Self {
            gains_db,
            decays_s,
            mix,
        }
    }

    /// Same gain on every band, default decays and mix
    pub fn flat_gain(gain_db: f64) -> Self {
        Self {
            gains_db: vec![gain_db; NUM_BANDS],
            ..Self::default()
        }
    }

    /// Copy with lengths forced to 12 and every value clamped into range
    pub fn sanitized(&self) -> Self {
        Self {
            gains_db: fit_to_bands(&self.gains_db, DEFAULT_GAIN_DB)
                .into_iter()
                .map(clamp_gain)
                .collect(),
            decays_s: fit_to_bands(&self.decays_s, DEFAULT_DECAY_S)
                .into_iter()
                .map(clamp_decay)
                .collect(),
            mix: clamp_mix(self.mix),
        }
    }

    /// Mean gain in dB
    pub fn average_gain_db(&self) -> f64 {
        mean(&self.gains_db, DEFAULT_GAIN_DB)
    }

    /// Mean decay in seconds
    pub fn average_decay_s(&self) -> f64 {
        mean(&self.decays_s, DEFAULT_DECAY_S)
    }
}

fn mean(values: &[f64], empty: f64) -> f64 {
    if values.is_empty() {
        empty
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case(-20.0, -12.0)]
    #[test_case(3.5, 3.5)]
    #[test_case(f64::INFINITY, 12.0)]
    #[test_case(f64::NAN, 0.0)]
    fn test_clamp_gain(input: f64, expected: f64) {
        assert_eq!(clamp_gain(input), expected);
    }

    #[test_case(0.0, 0.2)]
    #[test_case(2.0, 2.0)]
    #[test_case(60.0, 6.0)]
    #[test_case(f64::NAN, 1.0)]
    fn test_clamp_decay(input: f64, expected: f64) {
        assert_eq!(clamp_decay(input), expected);
    }

    #[test_case(-1.0, 0.0)]
    #[test_case(0.7, 0.7)]
    #[test_case(3.0, 1.0)]
    #[test_case(f64::NAN, 0.5)]
    fn test_clamp_mix(input: f64, expected: f64) {
        assert_eq!(clamp_mix(input), expected);
    }

    #[test]
    fn test_clamps_are_idempotent() {
        for v in [-100.0, -12.0, -0.5, 0.0, 0.19, 0.2, 1.0, 5.9, 6.0, 12.0, 1e9, f64::NAN] {
            assert_eq!(clamp_gain(clamp_gain(v)), clamp_gain(v));
            assert_eq!(clamp_decay(clamp_decay(v)), clamp_decay(v));
            assert_eq!(clamp_mix(clamp_mix(v)), clamp_mix(v));
        }
    }

    #[test]
    fn test_fit_to_bands_pads_and_truncates() {
        assert_eq!(fit_to_bands(&[1.0, 2.0], 0.0).len(), NUM_BANDS);
        assert_eq!(fit_to_bands(&[1.0, 2.0], 9.0)[2..].to_vec(), vec![9.0; 10]);
        assert_eq!(fit_to_bands(&[1.0; 20], 0.0), vec![1.0; NUM_BANDS]);
    }

    #[test]
    fn test_sanitized_enforces_ranges_and_length() {
        let raw = EffectParameters::new(vec![30.0, -30.0], vec![0.0; 15], 2.0);
        let clean = raw.sanitized();
        assert_eq!(clean.gains_db.len(), NUM_BANDS);
        assert_eq!(clean.decays_s.len(), NUM_BANDS);
        assert_eq!(clean.gains_db[0], 12.0);
        assert_eq!(clean.gains_db[1], -12.0);
        assert_eq!(clean.gains_db[2], 0.0);
        assert!(clean.decays_s.iter().all(|&d| d == 0.2));
        assert_eq!(clean.mix, 1.0);
        assert_eq!(clean.sanitized(), clean);
    }

    #[test]
    fn test_defaults() {
        let params = EffectParameters::default();
        assert_eq!(params.gains_db, vec![0.0; 12]);
        assert_eq!(params.decays_s, vec![1.0; 12]);
        assert_eq!(params.mix, 0.5);
    }

    #[test]
    fn test_deserialize_missing_fields() {
        let params: EffectParameters = serde_json::from_str(r#"{"mix": 0.3}"#).unwrap();
        assert_eq!(params.gains_db, vec![0.0; 12]);
        assert_eq!(params.decays_s, vec![1.0; 12]);
        assert_eq!(params.mix, 0.3);
    }

    #[test]
    fn test_averages() {
        let params = EffectParameters::new(vec![3.0, -3.0, 6.0], vec![1.0, 2.0], 0.5);
        assert_eq!(params.average_gain_db(), 2.0);
        assert_eq!(params.average_decay_s(), 1.5);
        let empty = EffectParameters::new(vec![], vec![], 0.5);
        assert_eq!(empty.average_decay_s(), 1.0);
    }

    #[test]
    fn test_effect_kind_parsing() {
        assert_eq!("EQ".parse::<EffectKind>().unwrap(), EffectKind::Eq);
        assert_eq!("reverb".parse::<EffectKind>().unwrap(), EffectKind::Reverb);
        assert!("chorus".parse::<EffectKind>().is_err());
        assert_eq!(EffectKind::Reverb.to_string(), "reverb");
    }
}
