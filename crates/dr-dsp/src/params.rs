//! Reverb knobs shared between the control and audio threads
//!
//! Each knob is a normalized `[0, 1]` value in its own atomic. The audio
//! thread takes one [`ParamSnapshot`] per block, so a block never sees a
//! half-applied change of a single knob.

use portable_atomic::{AtomicF32, Ordering};

/// Initial all-pass delay range, in milliseconds
pub const INITIAL_DELAY_MS: (f64, f64) = (20.0, 150.0);

/// Initial all-pass gain range
pub const INITIAL_GAIN: (f64, f64) = (0.25, 0.6);

/// Magnitude range of the main-loop gain (applied negated)
pub const MAIN_GAIN: (f64, f64) = (0.0, 0.9);

#[inline]
fn lerp(t: f64, (lo, hi): (f64, f64)) -> f64 {
    lo + (hi - lo) * t
}

#[inline]
fn normalize(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Lock-free knob values
#[derive(Debug)]
pub struct ReverbParams {
    feedback: AtomicF32,
    size: AtomicF32,
    mix: AtomicF32,
}

impl ReverbParams {
    pub fn new() -> Self {
        Self {
            feedback: AtomicF32::new(0.5),
            size: AtomicF32::new(0.5),
            mix: AtomicF32::new(0.5),
        }
    }

    pub fn set_feedback(&self, value: f32) {
        self.feedback.store(normalize(value), Ordering::Relaxed);
    }

    pub fn set_size(&self, value: f32) {
        self.size.store(normalize(value), Ordering::Relaxed);
    }

    pub fn set_mix(&self, value: f32) {
        self.mix.store(normalize(value), Ordering::Relaxed);
    }

    #[inline]
    pub fn feedback(&self) -> f32 {
        self.feedback.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn size(&self) -> f32 {
        self.size.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn mix(&self) -> f32 {
        self.mix.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn snapshot(&self) -> ParamSnapshot {
        ParamSnapshot {
            feedback: self.feedback(),
            size: self.size(),
            mix: self.mix(),
        }
    }
}

impl Default for ReverbParams {
    fn default() -> Self {
        Self::new()
    }
}

/// Knob values read once at the start of a block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSnapshot {
    pub feedback: f32,
    pub size: f32,
    pub mix: f32,
}

impl ParamSnapshot {
    /// Delay of the initial all-pass, from `size`
    #[inline]
    pub fn initial_delay_ms(&self) -> f64 {
        lerp(self.size as f64, INITIAL_DELAY_MS)
    }

    /// Gain of the initial all-pass, from `feedback`
    #[inline]
    pub fn initial_gain(&self) -> f64 {
        lerp(self.feedback as f64, INITIAL_GAIN)
    }

    /// Main-loop gain, from `feedback`. Always in `(-1, 0]`.
    #[inline]
    pub fn main_gain(&self) -> f64 {
        -lerp(self.feedback as f64, MAIN_GAIN)
    }

    #[inline]
    pub fn mix_ratio(&self) -> f64 {
        self.mix as f64
    }
}
