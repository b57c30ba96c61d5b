//! Audio file I/O for text2fx
//!
//! Decodes WAV files into a [`SignalBuffer`] at a target sample rate and
//! encodes processed buffers back to 32-bit float WAV.
//!
//! Integer input (8/16/24/32-bit) is scaled to [-1, 1). Input at any other
//! rate is converted with a windowed-sinc resampler.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::engine::buffer::{SignalBuffer, MAX_CHANNELS};
use crate::error::{Result, Text2FxError};

/// Decode a WAV file and resample it to `target_rate`
///
/// # Errors
/// * `FileNotFound` - the path does not exist
/// * `Decode` - the file is not a readable WAV
/// * `UnsupportedFormat` - more than two channels or an unknown bit depth
/// * `Resample` - the rate conversion failed
pub fn decode_audio(path: &Path, target_rate: u32) -> Result<SignalBuffer> {
    if !path.exists() {
        return Err(Text2FxError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    if target_rate == 0 {
        return Err(Text2FxError::InvalidConfig {
            reason: "target sample rate must be positive".to_string(),
        });
    }

    let reader = WavReader::open(path).map_err(|source| Text2FxError::Decode {
        path: path.display().to_string(),
        source,
    })?;
    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 || channels > MAX_CHANNELS {
        return Err(Text2FxError::UnsupportedFormat {
            details: format!("{}-channel audio (only mono/stereo supported)", channels),
        });
    }

    let interleaved = read_samples(reader, spec, path)?;
    let decoded = SignalBuffer::from_interleaved(&interleaved, channels, spec.sample_rate)?;
    debug!(
        path = %path.display(),
        channels,
        source_rate = spec.sample_rate,
        bits = spec.bits_per_sample,
        frames = decoded.num_frames(),
        "decoded wav"
    );

    resample(&decoded, target_rate)
}

/// Write `buffer` as a 32-bit float WAV at the buffer's own sample rate
///
/// A mono buffer is written as one channel.
pub fn encode_audio(buffer: &SignalBuffer, path: &Path) -> Result<()> {
    let encode_err = |source| Text2FxError::Encode {
        path: path.display().to_string(),
        source,
    };

    let spec = WavSpec {
        channels: buffer.channels() as u16,
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec).map_err(encode_err)?;
    for sample in buffer.to_interleaved() {
        writer.write_sample(sample).map_err(encode_err)?;
    }
    writer.finalize().map_err(encode_err)?;

    debug!(
        path = %path.display(),
        channels = buffer.channels(),
        frames = buffer.num_frames(),
        "encoded wav"
    );
    Ok(())
}

/// Hex SHA-256 of a file's contents
pub fn file_checksum(path: &Path) -> Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Sha256::new();
    let mut chunk = [0u8; 8192];
    loop {
        let n = reader.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        hasher.update(&chunk[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Convert `buffer` to `target_rate`, or return it unchanged when the rates match
pub fn resample(buffer: &SignalBuffer, target_rate: u32) -> Result<SignalBuffer> {
    let from = buffer.sample_rate();
    if from == target_rate {
        return Ok(buffer.clone());
    }
    if buffer.is_empty() {
        return SignalBuffer::from_channels(vec![Vec::new(); buffer.channels()], target_rate);
    }

    let resample_err = |reason: String| Text2FxError::Resample {
        from,
        to: target_rate,
        reason,
    };

    let ratio = target_rate as f64 / from as f64;
    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let mut resampler = SincFixedIn::<f32>::new(
        ratio,
        2.0,
        params,
        buffer.num_frames(),
        buffer.channels(),
    )
    .map_err(|e| resample_err(e.to_string()))?;

    // Output lags the input by the filter delay; flush until the tail is out.
    let delay = resampler.output_delay();
    let expected = (buffer.num_frames() as u64 * target_rate as u64).div_ceil(from as u64) as usize;
    let mut output = resampler
        .process(buffer.channel_data(), None)
        .map_err(|e| resample_err(e.to_string()))?;
    while output[0].len() < delay + expected {
        let tail = resampler
            .process_partial(None::<&[Vec<f32>]>, None)
            .map_err(|e| resample_err(e.to_string()))?;
        if tail[0].is_empty() {
            break;
        }
        for (channel, rest) in output.iter_mut().zip(tail) {
            channel.extend(rest);
        }
    }

    let output: Vec<Vec<f32>> = output
        .into_iter()
        .map(|channel| channel.into_iter().skip(delay).take(expected).collect())
        .collect();

    debug!(from, to = target_rate, delay, frames = output[0].len(), "resampled");
    SignalBuffer::from_channels(output, target_rate)
}

// ============================================================================
// Internal helper functions
// ============================================================================

/// Read every sample as f32, scaling integer formats by their full-scale value
fn read_samples<R: Read>(mut reader: WavReader<R>, spec: WavSpec, path: &Path) -> Result<Vec<f32>> {
    let decode_err = |source| Text2FxError::Decode {
        path: path.display().to_string(),
        source,
    };

    match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(decode_err),
        (SampleFormat::Int, 8) => reader
            .samples::<i8>()
            .map(|s| s.map(|v| v as f32 / 128.0))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(decode_err),
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|v| v as f32 / 32768.0))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(decode_err),
        (SampleFormat::Int, bits @ (24 | 32)) => {
            let full_scale = (1u64 << (bits - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / full_scale))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(decode_err)
        }
        (format, bits) => Err(Text2FxError::UnsupportedFormat {
            details: format!("{}-bit {:?} audio", bits, format),
        }),
    }
}

// ============================================================================
// Tests
// ============================================================================
