//! DSP Effects Library
//!
//! The two effect stages and the pieces they are built from:
//! - [`bands`]: the 12-edge frequency ladder
//! - [`filter`]: Butterworth design and zero-phase filtering
//! - [`eq`]: the band-splitting equalizer
//! - [`reverb`]: the delay-network reverb
//! - [`params`]: parameter ranges and clamping
//!
//! Both stages implement the [`Effect`] trait.

pub mod bands;
pub mod effect;
pub mod eq;
pub mod filter;
pub mod params;
pub mod reverb;

pub use bands::{BandKind, BandRange, BandSpec, NUM_BANDS, STANDARD_EDGES};
pub use effect::Effect;
pub use eq::Equalizer;
pub use filter::{BandFilter, SosFilter};
pub use params::{EffectKind, EffectParameters};
pub use reverb::ReverbSynthesizer;
