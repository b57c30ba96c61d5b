//! Signal Buffer Management
//!
//! Provides the decoded signal type shared by every stage of a request:
//! decode produces it, exactly one effect stage transforms it, encode
//! consumes it.

use num_traits::Float;

use crate::error::{Result, Text2FxError};

// ============================================================================
// Constants
// ============================================================================

/// Default decode target and processing sample rate
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Maximum number of channels the engine accepts
pub const MAX_CHANNELS: usize = 2;

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert decibels to linear amplitude
#[inline]
pub fn db_to_linear(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Largest absolute value in a sample stream, zero when empty
pub fn peak_of<'a, T: Float + 'a>(samples: impl IntoIterator<Item = &'a T>) -> T {
    samples
        .into_iter()
        .fold(T::zero(), |acc, &s| acc.max(s.abs()))
}

/// Peak absolute amplitude across all channels
pub fn peak_abs(channels: &[Vec<f64>]) -> f64 {
    peak_of(channels.iter().flatten())
}

/// Scale all channels so the peak absolute amplitude equals `target`
///
/// Silent input (peak == 0) is left untouched. Returns the peak measured
/// before scaling.
pub fn normalize_peak(channels: &mut [Vec<f64>], target: f64) -> f64 {
    let peak = peak_abs(channels);
    if peak > 0.0 {
        let scale = target / peak;
        for channel in channels.iter_mut() {
            for sample in channel.iter_mut() {
                *sample *= scale;
            }
        }
    }
    peak
}

/// Root mean square of a slice of samples (linear)
pub fn rms(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_squares / samples.len() as f64).sqrt()
}

// ============================================================================
// Signal Buffer
// ============================================================================

/// Decoded audio signal in planar layout
///
/// Each channel is a separate `Vec<f32>`; all channels have the same length.
///
/// # Example
/// ```
/// use text2fx::engine::buffer::SignalBuffer;
///
/// let mono = SignalBuffer::sine_wave(440.0, 1.0, 44100);
/// let stereo = mono.to_stereo();
/// assert_eq!(stereo.channels(), 2);
/// assert_eq!(stereo.num_frames(), 44100);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SignalBuffer {
    /// Sample data: outer Vec is channels, inner Vec is frames
    samples: Vec<Vec<f32>>,
    /// Sample rate in Hz
    sample_rate: u32,
}

impl SignalBuffer {
    /// Create a buffer from planar channel data
    ///
    /// # Errors
    /// * `InvalidBuffer` - no channels, more than two, ragged channels or a
    ///   zero sample rate
    pub fn from_channels(samples: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if samples.is_empty() || samples.len() > MAX_CHANNELS {
            return Err(Text2FxError::InvalidBuffer {
                reason: format!(
                    "{} channels (only mono/stereo supported)",
                    samples.len()
                ),
            });
        }
        if sample_rate == 0 {
            return Err(Text2FxError::InvalidBuffer {
                reason: "sample rate must be positive".to_string(),
            });
        }
        let frames = samples[0].len();
        if samples.iter().any(|ch| ch.len() != frames) {
            return Err(Text2FxError::InvalidBuffer {
                reason: "channels have different lengths".to_string(),
            });
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Create a mono buffer
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        Self::from_channels(vec![samples], sample_rate)
    }

    /// Create a buffer from interleaved sample data
    ///
    /// # Arguments
    /// * `interleaved` - Interleaved sample data (L, R, L, R, ... for stereo)
    /// * `channels` - Number of channels in the data
    /// * `sample_rate` - Sample rate in Hz
    pub fn from_interleaved(interleaved: &[f32], channels: usize, sample_rate: u32) -> Result<Self> {
        if channels == 0 || channels > MAX_CHANNELS {
            return Err(Text2FxError::UnsupportedFormat {
                details: format!("{}-channel audio (only mono/stereo supported)", channels),
            });
        }
        if interleaved.len() % channels != 0 {
            return Err(Text2FxError::InvalidBuffer {
                reason: format!(
                    "Interleaved data length {} is not divisible by channel count {}",
                    interleaved.len(),
                    channels
                ),
            });
        }

        let frames = interleaved.len() / channels;
        let mut samples = vec![Vec::with_capacity(frames); channels];
        for frame in interleaved.chunks_exact(channels) {
            for (ch, &sample) in frame.iter().enumerate() {
                samples[ch].push(sample);
            }
        }

        Self::from_channels(samples, sample_rate)
    }

    /// Create a silent buffer
    pub fn silence(num_frames: usize, channels: usize, sample_rate: u32) -> Self {
        Self {
            samples: vec![vec![0.0; num_frames]; channels.clamp(1, MAX_CHANNELS)],
            sample_rate,
        }
    }

    /// Create a mono sine wave test tone with unit amplitude
    pub fn sine_wave(frequency: f64, duration_secs: f64, sample_rate: u32) -> Self {
        let num_frames = (duration_secs * sample_rate as f64) as usize;
        let samples = (0..num_frames)
            .map(|i| {
                let t = i as f64 / sample_rate as f64;
                (2.0 * std::f64::consts::PI * frequency * t).sin() as f32
            })
            .collect();
        Self {
            samples: vec![samples],
            sample_rate,
        }
    }

    /// Convert the buffer to interleaved format (L, R, L, R, ...)
    pub fn to_interleaved(&self) -> Vec<f32> {
        let frames = self.num_frames();
        let mut interleaved = Vec::with_capacity(frames * self.channels());
        for frame in 0..frames {
            for channel in &self.samples {
                interleaved.push(channel[frame]);
            }
        }
        interleaved
    }

    /// Return a stereo copy, duplicating a mono channel
    pub fn to_stereo(&self) -> Self {
        match self.samples.len() {
            1 => Self {
                samples: vec![self.samples[0].clone(), self.samples[0].clone()],
                sample_rate: self.sample_rate,
            },
            _ => self.clone(),
        }
    }

    /// Get the number of channels
    #[inline]
    pub fn channels(&self) -> usize {
        self.samples.len()
    }

    /// Check if the buffer holds two channels
    #[inline]
    pub fn is_stereo(&self) -> bool {
        self.channels() == 2
    }

    /// Get the number of frames (samples per channel)
    #[inline]
    pub fn num_frames(&self) -> usize {
        self.samples.first().map(|ch| ch.len()).unwrap_or(0)
    }

    /// Check if the buffer has no frames
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_frames() == 0
    }

    /// Get the sample rate
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Get the duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.num_frames() as f64 / self.sample_rate as f64
    }

    /// Get immutable access to a channel's samples
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.samples[index]
    }

    /// Get mutable access to a channel's samples
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.samples[index]
    }

    /// Borrow all channels
    pub fn channel_data(&self) -> &[Vec<f32>] {
        &self.samples
    }

    /// Widen every channel to `f64` for processing
    pub fn to_f64_channels(&self) -> Vec<Vec<f64>> {
        self.samples
            .iter()
            .map(|ch| ch.iter().map(|&s| s as f64).collect())
            .collect()
    }

    /// Build a buffer from processed `f64` channels, keeping this buffer's rate
    pub fn with_f64_channels(&self, channels: Vec<Vec<f64>>) -> Self {
        Self {
            samples: channels
                .into_iter()
                .map(|ch| ch.into_iter().map(|s| s as f32).collect())
                .collect(),
            sample_rate: self.sample_rate,
        }
    }

    /// Peak absolute amplitude across all channels
    pub fn peak(&self) -> f32 {
        peak_of(self.samples.iter().flatten())
    }

    /// RMS level across all channels (linear)
    pub fn rms(&self) -> f64 {
        let flat: Vec<f32> = self.samples.iter().flatten().copied().collect();
        rms(&flat)
    }

    /// Check if all samples are finite (not NaN or Infinity)
    pub fn is_finite(&self) -> bool {
        self.samples
            .iter()
            .flat_map(|ch| ch.iter())
            .all(|s| s.is_finite())
    }

    /// Check that `other` has the same frame count and sample rate
    pub fn same_timing(&self, other: &SignalBuffer) -> bool {
        self.num_frames() == other.num_frames() && self.sample_rate == other.sample_rate
    }

    /// Check if buffers are approximately equal within tolerance
    pub fn is_approx_equal(&self, other: &SignalBuffer, tolerance: f32) -> bool {
        self.channels() == other.channels()
            && self.same_timing(other)
            && self
                .samples
                .iter()
                .flatten()
                .zip(other.samples.iter().flatten())
                .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_to_linear() {
        assert!((db_to_linear(0.0) - 1.0).abs() < 1e-12);
        assert!((db_to_linear(-20.0) - 0.1).abs() < 1e-12);
        assert!((db_to_linear(6.0206) - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_normalize_peak_scales_to_target() {
        let mut channels = vec![vec![0.1, -0.4, 0.2], vec![0.0, 0.3, -0.1]];
        let before = normalize_peak(&mut channels, 0.95);
        assert!((before - 0.4).abs() < 1e-12);
        assert!((peak_abs(&channels) - 0.95).abs() < 1e-12);
        assert!((channels[0][0] - 0.2375).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_peak_leaves_silence() {
        let mut channels = vec![vec![0.0; 16], vec![0.0; 16]];
        assert_eq!(normalize_peak(&mut channels, 0.95), 0.0);
        assert!(channels.iter().flatten().all(|&s| s == 0.0));
    }

    #[test]
    fn test_sine_wave_generation() {
        let buffer = SignalBuffer::sine_wave(440.0, 1.0, 44100);
        assert_eq!(buffer.channels(), 1);
        assert_eq!(buffer.sample_rate(), 44100);
        assert_eq!(buffer.num_frames(), 44100);
        assert!((buffer.duration_secs() - 1.0).abs() < 1e-9);
        assert!(buffer.peak() <= 1.0);
    }

    #[test]
    fn test_mono_to_stereo_duplicates() {
        let mono = SignalBuffer::mono(vec![0.1, 0.2, 0.3], 8000).unwrap();
        let stereo = mono.to_stereo();
        assert!(stereo.is_stereo());
        assert_eq!(stereo.channel(0), stereo.channel(1));
        assert_eq!(stereo.channel(0), mono.channel(0));
        assert_eq!(stereo.to_stereo(), stereo);
    }

    #[test]
    fn test_interleave_roundtrip() {
        let interleaved = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let buffer = SignalBuffer::from_interleaved(&interleaved, 2, 44100).unwrap();
        assert_eq!(buffer.channel(0), &[1.0, 3.0, 5.0]);
        assert_eq!(buffer.channel(1), &[2.0, 4.0, 6.0]);
        assert_eq!(buffer.to_interleaved(), interleaved);
    }

    #[test]
    fn test_rejects_bad_shapes() {
        assert!(SignalBuffer::from_channels(vec![], 44100).is_err());
        assert!(SignalBuffer::from_channels(vec![vec![0.0]; 3], 44100).is_err());
        assert!(SignalBuffer::from_channels(vec![vec![0.0; 2], vec![0.0; 3]], 44100).is_err());
        assert!(SignalBuffer::mono(vec![0.0; 4], 0).is_err());
        assert!(SignalBuffer::from_interleaved(&[0.0; 5], 2, 44100).is_err());
        assert!(matches!(
            SignalBuffer::from_interleaved(&[0.0; 6], 3, 44100),
            Err(Text2FxError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_empty_buffer_is_legal() {
        let buffer = SignalBuffer::mono(Vec::new(), 44100).unwrap();
        assert!(buffer.is_empty());
        assert_eq!(buffer.peak(), 0.0);
        assert_eq!(buffer.rms(), 0.0);
    }

    #[test]
    fn test_f64_roundtrip_keeps_rate() {
        let buffer = SignalBuffer::sine_wave(100.0, 0.01, 48000);
        let wide = buffer.to_f64_channels();
        let back = buffer.with_f64_channels(wide);
        assert_eq!(back, buffer);
    }

    #[test]
    fn test_is_finite_detects_nan() {
        let mut buffer = SignalBuffer::silence(4, 2, 44100);
        assert!(buffer.is_finite());
        buffer.channel_mut(1)[2] = f32::NAN;
        assert!(!buffer.is_finite());
    }
}
