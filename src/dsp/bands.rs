//! Frequency band ladder
//!
//! The equalizer splits the spectrum into 12 fixed bands. Band `i` spans
//! `(edges[i-1], edges[i])`; the first band is a lowpass below `edges[0]` and
//! the last band runs from `edges[10]` up to Nyquist.

use serde::{Deserialize, Serialize};

/// Number of bands in the ladder
pub const NUM_BANDS: usize = 12;

/// Standard band-edge frequencies in Hz
pub const STANDARD_EDGES: [f64; NUM_BANDS] = [
    20.0, 50.0, 100.0, 200.0, 400.0, 800.0, 1500.0, 3000.0, 6000.0, 12000.0, 16000.0, 20000.0,
];

/// Shape of the filter covering one band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandKind {
    /// Everything below the high edge
    LowPass,
    /// Between the two edges
    BandPass,
    /// Everything above the low edge
    HighPass,
}

/// Frequency range of one band, in Hz
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandRange {
    pub kind: BandKind,
    /// Lower edge (0.0 for the lowpass band)
    pub low_hz: f64,
    /// Upper edge (Nyquist for the highpass band)
    pub high_hz: f64,
}

impl BandRange {
    /// Edges divided by Nyquist, as `(low, high)`
    pub fn normalized(&self, sample_rate: u32) -> (f64, f64) {
        let nyquist = sample_rate as f64 / 2.0;
        (self.low_hz / nyquist, self.high_hz / nyquist)
    }

    /// A band whose normalized high edge reaches Nyquist cannot be designed
    pub fn is_degenerate(&self, sample_rate: u32) -> bool {
        let (_, high) = self.normalized(sample_rate);
        high >= 1.0 || high.is_nan()
    }
}

/// The immutable 12-edge ladder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandSpec {
    edges: [f64; NUM_BANDS],
}

impl Default for BandSpec {
    fn default() -> Self {
        Self {
            edges: STANDARD_EDGES,
        }
    }
}

impl BandSpec {
    /// Build a ladder from custom edges
    ///
    /// Returns `None` unless the edges are finite, positive and strictly
    /// increasing.
    pub fn new(edges: [f64; NUM_BANDS]) -> Option<Self> {
        let valid = edges.iter().all(|e| e.is_finite() && *e > 0.0)
            && edges.windows(2).all(|w| w[0] < w[1]);
        valid.then_some(Self { edges })
    }

    /// Band-edge frequencies in Hz
    pub fn edges(&self) -> &[f64; NUM_BANDS] {
        &self.edges
    }

    /// Frequency range covered by band `index` at the given sample rate
    ///
    /// Returns `None` for an index outside `0..12`.
    pub fn band_range(&self, index: usize, sample_rate: u32) -> Option<BandRange> {
        let nyquist = sample_rate as f64 / 2.0;
        let range = match index {
            0 => BandRange {
                kind: BandKind::LowPass,
                low_hz: 0.0,
                high_hz: self.edges[0],
            },
            i if i == NUM_BANDS - 1 => BandRange {
                kind: BandKind::HighPass,
                low_hz: self.edges[NUM_BANDS - 2],
                high_hz: nyquist,
            },
            i if i < NUM_BANDS => BandRange {
                kind: BandKind::BandPass,
                low_hz: self.edges[i - 1],
                high_hz: self.edges[i],
            },
            _ => return None,
        };
        Some(range)
    }
}
