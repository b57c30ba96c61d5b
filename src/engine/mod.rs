//! Audio Engine Module
//!
//! Everything around the effect stages:
//! - Signal buffer type
//! - WAV decode/encode with resampling
//! - The request processor

pub mod buffer;
pub mod io;
pub mod processor;

pub use buffer::{SignalBuffer, DEFAULT_SAMPLE_RATE};
pub use io::{decode_audio, encode_audio, file_checksum};
pub use processor::{Engine, ProcessingReport};
