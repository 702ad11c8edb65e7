//! Algorithmic reverb
//!
//! Signal flow per block:
//!
//! ```text
//!  x ──┬──────────────────────────────────────────────► dry ─┐
//!      └─► initial all-pass ─► u ─┬─► (+) ─► v ─► main delay  │
//!                                 │    ▲            │         ├─► mix ─► out
//!                                 │    └── g·s ◄── stages ─► s│
//!                                 └─► y = (1 - g²)·s - g·u ───┘
//! ```
//!
//! The main loop is itself an all-pass around the stage bank, so the wet
//! path keeps the input's spectral balance while the stages diffuse it.

use std::sync::Arc;

use dr_core::{
    DspError, DspResult, MixingType, NoDenormals, ProcessSpec, ReverbConfig, Sample,
};

use crate::Processor;
use crate::allpass::AllPassFilter;
use crate::buffer::{AudioBuffer, BufferView};
use crate::chain::ProcessorChain;
use crate::context::ProcessContext;
use crate::delay_line::DelayLine;
use crate::lifecycle::Lifecycle;
use crate::mixer::DryWetMixer;
use crate::params::{INITIAL_DELAY_MS, ParamSnapshot, ReverbParams};

/// Clamp a configured delay to the line capacity, warning when it does not fit
fn clamp_delay(samples: usize, max: usize, what: &str) -> usize {
    if samples > max {
        log::warn!("{what} delay of {samples} samples clamped to {max}");
        max
    } else {
        samples.max(1)
    }
}

pub struct Reverb<S> {
    /// Validated configuration
    config: ReverbConfig,
    /// Knobs shared with the control thread
    params: Arc<ReverbParams>,
    /// Output dry/wet mixer
    mixer: DryWetMixer<S>,
    /// Diffuser ahead of the main loop
    initial: AllPassFilter<S>,
    /// Main loop delay line
    main_line: DelayLine<S>,
    /// Main loop delay in samples
    main_delay: usize,
    /// All-pass bank inside the main loop
    stages: ProcessorChain<S>,
    /// Initial all-pass output of the current run
    diffused: AudioBuffer<S>,
    /// Main loop input of the current run
    feedback: AudioBuffer<S>,
    lifecycle: Lifecycle,
}

impl<S: Sample> Reverb<S> {
    pub fn new(config: ReverbConfig) -> DspResult<Self> {
        Self::with_params(config, Arc::new(ReverbParams::new()))
    }

    /// Create a reverb driven by an existing parameter set
    pub fn with_params(config: ReverbConfig, params: Arc<ReverbParams>) -> DspResult<Self> {
        config.validate()?;
        let channels = config.num_channels;
        let max_delay = config.max_delay_samples;

        let mut mixer = DryWetMixer::new(channels, max_delay);
        mixer.set_mixing_type(config.mixing_type);
        mixer.set_dry_latency(config.dry_latency);

        Ok(Self {
            params,
            mixer,
            initial: AllPassFilter::new(channels, max_delay),
            main_line: DelayLine::new(channels, max_delay),
            main_delay: 1,
            stages: ProcessorChain::with_capacity(config.stages.len()),
            diffused: AudioBuffer::new(channels, 0),
            feedback: AudioBuffer::new(channels, 0),
            lifecycle: Lifecycle::Unprepared,
            config,
        })
    }

    #[inline]
    pub fn params(&self) -> &Arc<ReverbParams> {
        &self.params
    }

    #[inline]
    pub fn config(&self) -> &ReverbConfig {
        &self.config
    }

    /// Stages built by the last `prepare`
    #[inline]
    pub fn num_stages(&self) -> usize {
        self.stages.len()
    }

    /// Main loop delay in samples (valid after `prepare`)
    #[inline]
    pub fn main_delay(&self) -> usize {
        self.main_delay
    }

    pub fn set_mixing_type(&mut self, mixing_type: MixingType) {
        self.config.mixing_type = mixing_type;
        self.mixer.set_mixing_type(mixing_type);
    }

    pub fn set_dry_latency(&mut self, samples: usize) -> DspResult<()> {
        if samples > self.config.max_delay_samples {
            return Err(DspError::InvalidConfig(format!(
                "dry_latency {samples} exceeds max_delay_samples {}",
                self.config.max_delay_samples
            )));
        }
        self.config.dry_latency = samples;
        self.mixer.set_dry_latency(samples);
        Ok(())
    }

    fn apply_params(&mut self, snapshot: &ParamSnapshot, spec: ProcessSpec) {
        let delay = spec
            .ms_to_samples(snapshot.initial_delay_ms())
            .min(self.config.max_delay_samples);
        self.initial.set_delay(delay);
        let applied = self.initial.set_gain(S::from_f64(snapshot.initial_gain()));
        debug_assert!(applied.is_ok(), "initial gain outside (-1, 1)");
        self.mixer.set_mixing_ratio(snapshot.mix_ratio());
    }

    /// Run the diffuser and main loop over a run no longer than the loop delay
    fn process_run(&mut self, wet: &mut BufferView<'_, S>, gain: S) {
        let len = wet.num_samples();
        self.initial
            .process(&mut ProcessContext::replacing(wet.reborrow()));
        let mut diffused = self.diffused.view_range(0, len);
        diffused.copy_from_ref(&wet.to_ref());

        self.main_line.pop_samples(wet, self.main_delay - len);
        self.stages
            .process(&mut ProcessContext::replacing(wet.reborrow()));

        let mut feedback = self.feedback.view_range(0, len);
        feedback.copy_from_ref(&wet.to_ref());
        feedback *= gain;
        feedback += &diffused.to_ref();
        self.main_line.push_samples(&feedback.to_ref());

        *wet *= S::ONE - gain * gain;
        diffused *= -gain;
        *wet += &diffused.to_ref();
    }
}

impl<S: Sample> Processor<S> for Reverb<S> {
    fn prepare(&mut self, spec: ProcessSpec) {
        debug_assert!(spec.validate().is_ok(), "invalid process spec {spec:?}");
        let channels = self.config.num_channels;
        let max_delay = self.config.max_delay_samples;

        let mut stages = ProcessorChain::with_capacity(self.config.stages.len());
        for (index, stage) in self.config.stages.iter().enumerate() {
            let mut filter = AllPassFilter::new(channels, max_delay);
            filter.set_delay(clamp_delay(
                spec.ms_to_samples(stage.delay_ms),
                max_delay,
                "stage",
            ));
            // Gains are validated in f64; narrowing to the sample type can still round to 1
            if let Err(err) = filter.set_gain(S::from_f64(stage.gain)) {
                log::warn!("stage {index} skipped: {err}");
                continue;
            }
            stages.push(Box::new(filter));
        }
        stages.prepare(spec);
        self.stages = stages;

        self.main_delay = clamp_delay(
            spec.ms_to_samples(self.config.main_delay_ms),
            max_delay,
            "main loop",
        );
        let longest_initial = spec.ms_to_samples(INITIAL_DELAY_MS.1);
        if longest_initial > max_delay {
            log::warn!(
                "initial all-pass range reaches {longest_initial} samples, clamped to {max_delay}"
            );
        }

        let snapshot = self.params.snapshot();
        self.apply_params(&snapshot, spec);
        self.initial.prepare(spec);
        self.main_line.prepare(spec);
        self.mixer.prepare(spec);
        self.diffused.set_size(channels, spec.block_size);
        self.feedback.set_size(channels, spec.block_size);
        self.lifecycle.prepare(spec);

        log::info!(
            "reverb prepared: {} ch @ {} Hz, block {}, {} stages, main delay {} samples",
            channels,
            spec.sample_rate,
            spec.block_size,
            self.stages.len(),
            self.main_delay
        );
    }

    fn process(&mut self, ctx: &mut ProcessContext<'_, S>) {
        let Lifecycle::Ready(spec) = self.lifecycle else {
            return;
        };
        let _denormals = NoDenormals::new();
        let len = ctx.num_samples();
        debug_assert!(len <= spec.block_size, "block exceeds prepared size");
        ctx.copy_input_to_output();

        let snapshot = self.params.snapshot();
        self.apply_params(&snapshot, spec);
        let gain = S::from_f64(snapshot.main_gain());

        let block = ctx.output();
        self.mixer.push_dry_samples(&block.to_ref());

        // Runs no longer than the loop delay only read fully written history
        let step = self.main_delay.min(len);
        let mut pos = 0;
        while pos < len {
            let run = step.min(len - pos);
            self.process_run(&mut block.sub_range(pos, run), gain);
            pos += run;
        }

        let latency = self.mixer.dry_latency();
        self.mixer.mix_dry_wet(block, latency);
    }

    fn reset(&mut self) {
        if !self.lifecycle.is_ready() {
            return;
        }
        self.mixer.reset();
        self.initial.reset();
        self.main_line.reset();
        self.stages.reset();
        self.diffused.clear();
        self.feedback.clear();
        log::debug!("reverb reset");
    }

    fn is_ready(&self) -> bool {
        self.lifecycle.is_ready()
    }
}
