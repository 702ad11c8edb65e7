//! Error types for deep-reverb

use thiserror::Error;

/// Configuration errors reported by setters and constructors.
///
/// Contract violations (bad channel index, delay above the configured
/// maximum, mismatched view shapes) are not represented here: those are
/// debug assertions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DspError {
    #[error("Unstable feedback gain: {0} (magnitude must be below 1)")]
    UnstableGain(f64),

    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(f64),

    #[error("Invalid block size: {0}")]
    InvalidBlockSize(usize),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias
pub type DspResult<T> = Result<T, DspError>;

/// Reject feedback gains that would make a recursive filter unstable.
///
/// Accepts the open interval `(-1, 1)`; unit magnitude, anything beyond it
/// and NaN are refused.
pub fn check_feedback_gain(gain: f64) -> DspResult<f64> {
    if gain.abs() < 1.0 {
        Ok(gain)
    } else {
        Err(DspError::UnstableGain(gain))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gain_bounds() {
        assert_eq!(check_feedback_gain(0.0), Ok(0.0));
        assert_eq!(check_feedback_gain(-0.999), Ok(-0.999));
        assert_eq!(check_feedback_gain(1.0), Err(DspError::UnstableGain(1.0)));
        assert_eq!(check_feedback_gain(-1.0), Err(DspError::UnstableGain(-1.0)));
        assert!(check_feedback_gain(f64::NAN).is_err());
        assert!(check_feedback_gain(f64::INFINITY).is_err());
    }

    #[test]
    fn test_error_display() {
        let err = DspError::UnstableGain(1.5);
        assert_eq!(
            err.to_string(),
            "Unstable feedback gain: 1.5 (magnitude must be below 1)"
        );
    }
}
