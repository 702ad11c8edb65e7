use dr_core::{DspResult, ProcessSpec, Sample};

use crate::Processor;
use crate::buffer::AudioBuffer;
use crate::comb::{CombFilter, CombOutput};
use crate::context::ProcessContext;
use crate::lifecycle::Lifecycle;

/// Schroeder all-pass: `H(z) = (z^-D - g) / (1 - g·z^-D)`
///
/// Built from a comb with delayed output `c = z^-D / (1 - g·z^-D) · x`:
/// `y = (1 - g²)·c - g·x`. Flat magnitude response for any `|g| < 1`.
#[derive(Debug, Clone)]
pub struct AllPassFilter<S> {
    num_channels: usize,
    gain: S,
    comb: CombFilter<S>,
    dry: AudioBuffer<S>,
    lifecycle: Lifecycle,
}

impl<S: Sample> AllPassFilter<S> {
    pub fn new(num_channels: usize, max_delay: usize) -> Self {
        let comb = CombFilter::new(num_channels, max_delay).with_output(CombOutput::Delayed);
        Self {
            num_channels,
            gain: comb.gain(),
            comb,
            dry: AudioBuffer::new(num_channels, 0),
            lifecycle: Lifecycle::Unprepared,
        }
    }

    /// Set the loop delay; changes are crossfaded over the next block
    pub fn set_delay(&mut self, samples: usize) {
        self.comb.set_delay(samples);
    }

    #[inline]
    pub fn delay(&self) -> usize {
        self.comb.delay()
    }

    pub fn set_gain(&mut self, gain: S) -> DspResult<()> {
        self.comb.set_gain(gain)?;
        self.gain = gain;
        Ok(())
    }

    #[inline]
    pub fn gain(&self) -> S {
        self.gain
    }
}

impl<S: Sample> Processor<S> for AllPassFilter<S> {
    fn prepare(&mut self, spec: ProcessSpec) {
        self.dry.set_size(self.num_channels, spec.block_size);
        self.comb.prepare(spec);
        self.lifecycle.prepare(spec);
    }

    fn process(&mut self, ctx: &mut ProcessContext<'_, S>) {
        if !self.lifecycle.is_ready() {
            return;
        }
        let mut dry = self.dry.view_range(0, ctx.num_samples());
        dry.copy_from_ref(&ctx.input());

        self.comb.process(ctx);

        dry *= -self.gain;
        let output = ctx.output();
        *output *= S::ONE - self.gain * self.gain;
        *output += &dry.to_ref();
    }

    fn reset(&mut self) {
        if !self.lifecycle.is_ready() {
            return;
        }
        self.comb.reset();
        self.dry.clear();
    }

    fn is_ready(&self) -> bool {
        self.lifecycle.is_ready()
    }
}
