//! Effect trait definition
//!
//! Both effect stages are stateless transforms from one [`SignalBuffer`] to a
//! new one. A stage either produces a complete stereo output or reports a
//! [`ProcessingFailure`]; it never hands back partial audio.

use crate::engine::buffer::{SignalBuffer, MAX_CHANNELS};
use crate::error::ProcessingFailure;

use super::params::{EffectKind, EffectParameters};

/// Base trait for the effect stages
pub trait Effect: Send + Sync {
    /// Which effect this stage implements
    fn kind(&self) -> EffectKind;

    /// Get the effect type identifier
    fn effect_type(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Get human-readable display name
    fn display_name(&self) -> &'static str;

    /// Transform `signal` into a new stereo buffer
    ///
    /// Parameters are clamped by the stage itself, so out-of-range values
    /// never cause a failure.
    fn apply(
        &self,
        signal: &SignalBuffer,
        params: &EffectParameters,
    ) -> Result<SignalBuffer, ProcessingFailure>;
}

/// Reject input a stage cannot work on
pub(crate) fn check_input(
    effect: &'static str,
    signal: &SignalBuffer,
) -> Result<(), ProcessingFailure> {
    let channels = signal.channels();
    if channels == 0 || channels > MAX_CHANNELS {
        return Err(ProcessingFailure::UnsupportedChannels { channels });
    }
    if signal.sample_rate() == 0 {
        return Err(ProcessingFailure::InvalidSampleRate {
            sample_rate: signal.sample_rate(),
        });
    }
    if !signal.is_finite() {
        return Err(ProcessingFailure::NonFiniteInput { effect });
    }
    Ok(())
}

/// Verify a stage's output before it leaves the stage
pub(crate) fn check_output(
    effect: &'static str,
    input: &SignalBuffer,
    output: &SignalBuffer,
) -> Result<(), ProcessingFailure> {
    if output.channels() != MAX_CHANNELS || !output.same_timing(input) {
        return Err(ProcessingFailure::ShapeMismatch { effect });
    }
    if !output.is_finite() {
        return Err(ProcessingFailure::NonFiniteOutput { effect });
    }
    Ok(())
}
