//! Recursive comb filter
//!
//! `y[n] = x[n] + g·y[n - D]`, processed block-wise. When the block is
//! longer than `D` the block is split into runs of at most `D` samples so
//! each run only reads history that has already been written.
//!
//! Changing `D` between blocks blends the reads at the old and new delay
//! over the next block with complementary linear weights (see
//! [`crossfade_weights`]), so the output starts on the old path and ends on
//! the new one without a discontinuity.

use dr_core::{DspResult, ProcessSpec, Sample, check_feedback_gain};

use crate::Processor;
use crate::buffer::{AudioBuffer, BufferRef, BufferView};
use crate::context::ProcessContext;
use crate::delay_line::DelayLine;
use crate::lifecycle::Lifecycle;

/// Which signal the comb writes to its output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CombOutput {
    /// The recursion itself, `y[n]`
    #[default]
    Recursive,
    /// The recursion delayed by `D`, `y[n - D]`
    Delayed,
}

/// Weights `(old, new)` applied at `index` of a crossfade lasting `len` samples
#[inline]
pub fn crossfade_weights(index: usize, len: usize) -> (f64, f64) {
    let new = index as f64 / len as f64;
    (1.0 - new, new)
}

/// Blend `old` into `target`, continuing a crossfade of `total` samples at `start`
fn crossfade<S: Sample>(
    target: &mut BufferView<'_, S>,
    old: &BufferRef<'_, S>,
    start: usize,
    total: usize,
) {
    for channel in 0..target.num_channels() {
        let previous = old.channel(channel);
        for (i, (sample, &prior)) in target
            .channel_mut(channel)
            .iter_mut()
            .zip(previous)
            .enumerate()
        {
            let (w_old, w_new) = crossfade_weights(start + i, total);
            *sample = *sample * S::from_f64(w_new) + prior * S::from_f64(w_old);
        }
    }
}

/// Feedback comb filter with a click-free variable delay
#[derive(Debug, Clone)]
pub struct CombFilter<S> {
    num_channels: usize,
    max_delay: usize,
    delay: usize,
    last_delay: usize,
    gain: S,
    output: CombOutput,
    delay_line: DelayLine<S>,
    feedback: AudioBuffer<S>,
    faded: AudioBuffer<S>,
    lifecycle: Lifecycle,
}

impl<S: Sample> CombFilter<S> {
    pub fn new(num_channels: usize, max_delay: usize) -> Self {
        debug_assert!(max_delay > 0, "comb needs a positive maximum delay");
        Self {
            num_channels,
            max_delay,
            delay: 1,
            last_delay: 1,
            gain: S::from_f64(0.5),
            output: CombOutput::Recursive,
            delay_line: DelayLine::new(num_channels, max_delay),
            feedback: AudioBuffer::new(num_channels, 0),
            faded: AudioBuffer::new(num_channels, 0),
            lifecycle: Lifecycle::Unprepared,
        }
    }

    pub fn with_output(mut self, output: CombOutput) -> Self {
        self.output = output;
        self
    }

    /// Set the loop delay in samples. A delay of 0 is treated as 1.
    pub fn set_delay(&mut self, samples: usize) {
        debug_assert!(
            samples <= self.max_delay,
            "delay {samples} exceeds maximum {}",
            self.max_delay
        );
        self.delay = samples.clamp(1, self.max_delay.max(1));
    }

    #[inline]
    pub fn delay(&self) -> usize {
        self.delay
    }

    #[inline]
    pub fn max_delay(&self) -> usize {
        self.max_delay
    }

    /// Set the feedback gain; magnitudes of 1 or more are rejected and the
    /// previous gain is kept.
    pub fn set_gain(&mut self, gain: S) -> DspResult<()> {
        check_feedback_gain(gain.to_f64())?;
        self.gain = gain;
        Ok(())
    }

    #[inline]
    pub fn gain(&self) -> S {
        self.gain
    }

    #[inline]
    pub fn output(&self) -> CombOutput {
        self.output
    }

    /// True while the next block will crossfade to a new delay
    #[inline]
    pub fn is_crossfading(&self) -> bool {
        self.delay != self.last_delay
    }
}

impl<S: Sample> Processor<S> for CombFilter<S> {
    fn prepare(&mut self, spec: ProcessSpec) {
        self.delay_line.prepare(spec);
        self.feedback.set_size(self.num_channels, spec.block_size);
        self.faded.set_size(self.num_channels, spec.block_size);
        self.last_delay = self.delay;
        self.lifecycle.prepare(spec);
        log::debug!(
            "comb prepared: delay {} / {}, gain {:?}",
            self.delay,
            self.max_delay,
            self.gain
        );
    }

    fn process(&mut self, ctx: &mut ProcessContext<'_, S>) {
        if !self.lifecycle.is_ready() {
            return;
        }
        let len = ctx.num_samples();
        debug_assert!(len <= self.lifecycle.block_size(), "block exceeds prepared size");
        debug_assert_eq!(ctx.num_channels(), self.num_channels);

        let delay = self.delay;
        let last = self.last_delay;
        let fading = delay != last;
        let step = if fading { delay.min(last) } else { delay };

        let mut pos = 0;
        while pos < len {
            let chunk = step.min(len - pos);

            let mut history = self.feedback.view_range(pos, chunk);
            self.delay_line.pop_samples(&mut history, delay - chunk);
            if fading {
                let mut previous = self.faded.view_range(pos, chunk);
                self.delay_line.pop_samples(&mut previous, last - chunk);
                crossfade(&mut history, &previous.to_ref(), pos, len);
            }

            history *= self.gain;
            history += &ctx.input().sub_range(pos, chunk);
            self.delay_line.push_samples(&history.to_ref());
            pos += chunk;
        }

        match self.output {
            CombOutput::Recursive => {
                ctx.output().copy_from_ref(&self.feedback.ref_range(0, len));
            }
            CombOutput::Delayed => {
                let output = ctx.output();
                self.delay_line.pop_samples(output, delay);
                if fading {
                    let mut previous = self.faded.view_range(0, len);
                    self.delay_line.pop_samples(&mut previous, last);
                    crossfade(output, &previous.to_ref(), 0, len);
                }
            }
        }

        self.last_delay = delay;
    }

    fn reset(&mut self) {
        if !self.lifecycle.is_ready() {
            return;
        }
        self.delay_line.reset();
        self.feedback.clear();
        self.faded.clear();
        self.last_delay = self.delay;
    }

    fn is_ready(&self) -> bool {
        self.lifecycle.is_ready()
    }
}
