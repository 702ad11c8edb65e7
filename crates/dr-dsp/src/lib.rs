//! dr-dsp: Block-based DSP processors for deep-reverb
//!
//! ## Modules
//! - `buffer` - Channel-major storage and non-owning views
//! - `context` - Replacing / non-replacing process context
//! - `delay_line` - Multi-channel circular delay
//! - `comb` - Recursive comb filter with click-free delay changes
//! - `allpass` - Schroeder all-pass built on the comb
//! - `mixer` - Dry/wet mixer with dry-path latency
//! - `chain` - Ordered processor chain
//! - `params` - Lock-free knob values
//! - `reverb` - The reverberator topology
//! - `convolution` - Direct-form FIR convolution

pub mod allpass;
pub mod buffer;
pub mod chain;
pub mod comb;
pub mod context;
pub mod convolution;
pub mod delay_line;
pub mod lifecycle;
pub mod mixer;
pub mod params;
pub mod reverb;

pub use allpass::AllPassFilter;
pub use buffer::{AudioBuffer, BufferRef, BufferView};
pub use chain::ProcessorChain;
pub use comb::{CombFilter, CombOutput, crossfade_weights};
pub use context::ProcessContext;
pub use convolution::convolve;
pub use delay_line::DelayLine;
pub use lifecycle::Lifecycle;
pub use mixer::DryWetMixer;
pub use params::{ParamSnapshot, ReverbParams};
pub use reverb::Reverb;

pub use dr_core::{
    DspError, DspResult, MixingType, ProcessSpec, ReverbConfig, Sample, StageConfig,
};

/// Trait for all block processors
///
/// `prepare` may allocate and is called outside the audio callback.
/// `process` and `reset` never allocate, lock, or log.
pub trait Processor<S: Sample>: Send {
    /// Size internal buffers for `spec` and clear all state
    fn prepare(&mut self, spec: ProcessSpec);

    /// Process one block of at most `spec.block_size` samples
    fn process(&mut self, ctx: &mut ProcessContext<'_, S>);

    /// Clear all state without reallocating
    fn reset(&mut self);

    /// Get latency in samples
    fn latency(&self) -> usize {
        0
    }

    fn is_ready(&self) -> bool;
}
