//! Ordered processor chain
//!
//! Stages run in insertion order and each reads what the previous one
//! wrote. With a non-replacing context the first stage reads the context
//! input and writes the output; every later stage runs in place on it.

use dr_core::{ProcessSpec, Sample};

use crate::Processor;
use crate::context::ProcessContext;
use crate::lifecycle::Lifecycle;

pub struct ProcessorChain<S> {
    /// Stages in processing order
    stages: Vec<Box<dyn Processor<S>>>,
    lifecycle: Lifecycle,
}

impl<S: Sample> ProcessorChain<S> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            stages: Vec::with_capacity(capacity),
            lifecycle: Lifecycle::Unprepared,
        }
    }

    /// Append a stage. Allocates: not for the audio thread.
    pub fn push(&mut self, stage: Box<dyn Processor<S>>) {
        self.stages.push(stage);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl<S: Sample> Default for ProcessorChain<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Sample> Processor<S> for ProcessorChain<S> {
    fn prepare(&mut self, spec: ProcessSpec) {
        for stage in &mut self.stages {
            stage.prepare(spec);
        }
        self.lifecycle.prepare(spec);
        log::debug!("processor chain prepared: {} stages", self.stages.len());
    }

    fn process(&mut self, ctx: &mut ProcessContext<'_, S>) {
        if !self.lifecycle.is_ready() {
            return;
        }
        let mut stages = self.stages.iter_mut();
        let Some(first) = stages.next() else {
            ctx.copy_input_to_output();
            return;
        };
        first.process(ctx);

        let mut in_place = ProcessContext::replacing(ctx.output().reborrow());
        for stage in stages {
            stage.process(&mut in_place);
        }
    }

    fn reset(&mut self) {
        if !self.lifecycle.is_ready() {
            return;
        }
        for stage in &mut self.stages {
            stage.reset();
        }
    }

    /// Sum of stage latencies
    fn latency(&self) -> usize {
        self.stages.iter().map(|stage| stage.latency()).sum()
    }

    fn is_ready(&self) -> bool {
        self.lifecycle.is_ready() && self.stages.iter().all(|stage| stage.is_ready())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::AudioBuffer;

    /// y = x·scale + offset, with a fixed reported latency
    struct Affine {
        scale: f64,
        offset: f64,
        latency: usize,
        ready: bool,
    }

    impl Affine {
        fn boxed(scale: f64, offset: f64, latency: usize) -> Box<dyn Processor<f64>> {
            Box::new(Self {
                scale,
                offset,
                latency,
                ready: false,
            })
        }
    }

    impl Processor<f64> for Affine {
        fn prepare(&mut self, _spec: ProcessSpec) {
            self.ready = true;
        }

        fn process(&mut self, ctx: &mut ProcessContext<'_, f64>) {
            ctx.copy_input_to_output();
            let output = ctx.output();
            *output *= self.scale;
            *output += self.offset;
        }

        fn reset(&mut self) {}

        fn latency(&self) -> usize {
            self.latency
        }

        fn is_ready(&self) -> bool {
            self.ready
        }
    }

    #[test]
    fn test_stages_run_in_order() {
        let mut chain = ProcessorChain::new();
        chain.push(Affine::boxed(2.0, 0.0, 0));
        chain.push(Affine::boxed(1.0, 3.0, 0));
        chain.prepare(ProcessSpec::new(48000.0, 4));

        // (x·2) + 3, not (x + 3)·2
        let mut buffer = AudioBuffer::<f64>::from_channels(&[&[1.0, 2.0, 3.0, 4.0]]);
        chain.process(&mut ProcessContext::replacing(buffer.view()));
        assert_eq!(buffer.channel(0), &[5.0, 7.0, 9.0, 11.0]);
    }

    #[test]
    fn test_non_replacing_leaves_input() {
        let mut chain = ProcessorChain::new();
        chain.push(Affine::boxed(2.0, 0.0, 0));
        chain.push(Affine::boxed(2.0, 0.0, 0));
        chain.prepare(ProcessSpec::new(48000.0, 2));

        let input = AudioBuffer::<f64>::from_channels(&[&[1.0, -1.0]]);
        let mut output = AudioBuffer::<f64>::new(1, 2);
        chain.process(&mut ProcessContext::non_replacing(input.to_ref(), output.view()));
        assert_eq!(output.channel(0), &[4.0, -4.0]);
        assert_eq!(input.channel(0), &[1.0, -1.0]);
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let mut chain = ProcessorChain::<f64>::default();
        chain.prepare(ProcessSpec::new(48000.0, 2));
        let input = AudioBuffer::<f64>::from_channels(&[&[0.5, 0.25]]);
        let mut output = AudioBuffer::<f64>::new(1, 2);
        chain.process(&mut ProcessContext::non_replacing(input.to_ref(), output.view()));
        assert_eq!(output.channel(0), input.channel(0));
        assert!(chain.is_empty());
    }

    #[test]
    fn test_latency_is_summed() {
        let mut chain = ProcessorChain::new();
        chain.push(Affine::boxed(1.0, 0.0, 3));
        chain.push(Affine::boxed(1.0, 0.0, 5));
        assert_eq!(chain.latency(), 8);
        assert!(!chain.is_ready());
        chain.prepare(ProcessSpec::default());
        assert!(chain.is_ready());
    }

    #[test]
    fn test_unprepared_leaves_buffer() {
        let mut chain = ProcessorChain::new();
        chain.push(Affine::boxed(2.0, 1.0, 0));
        let mut buffer = AudioBuffer::<f64>::from_channels(&[&[0.5, -0.5, 0.25]]);
        chain.process(&mut ProcessContext::replacing(buffer.view()));
        chain.reset();
        assert_eq!(buffer.channel(0), &[0.5, -0.5, 0.25]);
        assert!(!chain.is_ready());
    }
}
