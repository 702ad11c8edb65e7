//! Dry/wet mixer
//!
//! The dry signal is captured before processing, optionally delayed to line
//! up with a latent wet path, and blended into the wet buffer:
//! `out = wet·w_vol + dry[n - latency]·d_vol`.

use dr_core::{MixingType, ProcessSpec, Sample};

use crate::Processor;
use crate::buffer::{AudioBuffer, BufferRef, BufferView};
use crate::context::ProcessContext;
use crate::delay_line::DelayLine;
use crate::lifecycle::Lifecycle;

#[derive(Debug, Clone)]
pub struct DryWetMixer<S> {
    num_channels: usize,
    max_dry_latency: usize,
    dry_latency: usize,
    ratio: f64,
    mixing_type: MixingType,
    dry_volume: S,
    wet_volume: S,
    dry_line: DelayLine<S>,
    dry: AudioBuffer<S>,
    lifecycle: Lifecycle,
}

impl<S: Sample> DryWetMixer<S> {
    pub fn new(num_channels: usize, max_dry_latency: usize) -> Self {
        let mut mixer = Self {
            num_channels,
            max_dry_latency,
            dry_latency: 0,
            ratio: 0.5,
            mixing_type: MixingType::Linear,
            dry_volume: S::ZERO,
            wet_volume: S::ZERO,
            dry_line: DelayLine::new(num_channels, max_dry_latency),
            dry: AudioBuffer::new(num_channels, 0),
            lifecycle: Lifecycle::Unprepared,
        };
        mixer.update_volumes();
        mixer
    }

    /// Wet proportion, clamped to [0, 1]
    pub fn set_mixing_ratio(&mut self, ratio: f64) {
        debug_assert!(!ratio.is_nan(), "mixing ratio is NaN");
        self.ratio = ratio.clamp(0.0, 1.0);
        self.update_volumes();
    }

    #[inline]
    pub fn mixing_ratio(&self) -> f64 {
        self.ratio
    }

    pub fn set_mixing_type(&mut self, mixing_type: MixingType) {
        self.mixing_type = mixing_type;
        self.update_volumes();
    }

    #[inline]
    pub fn mixing_type(&self) -> MixingType {
        self.mixing_type
    }

    pub fn set_dry_latency(&mut self, samples: usize) {
        debug_assert!(
            samples <= self.max_dry_latency,
            "dry latency {samples} exceeds maximum {}",
            self.max_dry_latency
        );
        self.dry_latency = samples.min(self.max_dry_latency);
    }

    #[inline]
    pub fn dry_latency(&self) -> usize {
        self.dry_latency
    }

    /// Current `(dry, wet)` volumes
    #[inline]
    pub fn volumes(&self) -> (S, S) {
        (self.dry_volume, self.wet_volume)
    }

    fn update_volumes(&mut self) {
        let (dry, wet) = match self.mixing_type {
            MixingType::Linear => (1.0 - self.ratio, self.ratio),
            MixingType::Balanced => (
                2.0 * (1.0 - self.ratio).min(0.5),
                2.0 * self.ratio.min(0.5),
            ),
        };
        self.dry_volume = S::from_f64(dry);
        self.wet_volume = S::from_f64(wet);
    }

    /// Capture the dry signal of the current block
    pub fn push_dry_samples(&mut self, src: &BufferRef<'_, S>) {
        self.dry_line.push_samples(src);
    }

    /// Scale `wet` and add the dry signal from `dry_latency` samples ago
    pub fn mix_dry_wet(&mut self, wet: &mut BufferView<'_, S>, dry_latency: usize) {
        if !self.lifecycle.is_ready() {
            return;
        }
        let mut dry = self.dry.view_range(0, wet.num_samples());
        self.dry_line.pop_samples(&mut dry, dry_latency);
        dry *= self.dry_volume;
        *wet *= self.wet_volume;
        *wet += &dry.to_ref();
    }
}

impl<S: Sample> Processor<S> for DryWetMixer<S> {
    fn prepare(&mut self, spec: ProcessSpec) {
        self.dry_line.prepare(spec);
        self.dry.set_size(self.num_channels, spec.block_size);
        self.lifecycle.prepare(spec);
        log::debug!(
            "dry/wet mixer prepared: {:?}, ratio {}, dry latency {}",
            self.mixing_type,
            self.ratio,
            self.dry_latency
        );
    }

    /// Mix the input as dry with the current output as wet
    fn process(&mut self, ctx: &mut ProcessContext<'_, S>) {
        let latency = self.dry_latency;
        self.push_dry_samples(&ctx.input());
        self.mix_dry_wet(ctx.output(), latency);
    }

    fn reset(&mut self) {
        if !self.lifecycle.is_ready() {
            return;
        }
        self.dry_line.reset();
        self.dry.clear();
    }

    fn latency(&self) -> usize {
        self.dry_latency
    }

    fn is_ready(&self) -> bool {
        self.lifecycle.is_ready()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prepared(ratio: f64, mixing_type: MixingType) -> DryWetMixer<f32> {
        let mut mixer = DryWetMixer::new(1, 16);
        mixer.set_mixing_type(mixing_type);
        mixer.set_mixing_ratio(ratio);
        mixer.prepare(ProcessSpec::new(48000.0, 4));
        mixer
    }

    fn mix(mixer: &mut DryWetMixer<f32>, dry: &[f32], wet: &[f32], latency: usize) -> Vec<f32> {
        let dry = AudioBuffer::from_channels(&[dry]);
        let mut wet = AudioBuffer::from_channels(&[wet]);
        mixer.push_dry_samples(&dry.to_ref());
        mixer.mix_dry_wet(&mut wet.view(), latency);
        wet.channel(0).to_vec()
    }

    #[test]
    fn test_ratio_extremes() {
        let dry = [0.1, -0.2, 0.3, -0.4];
        let wet = [9.0, 8.0, 7.0, 6.0];

        for mixing_type in [MixingType::Linear, MixingType::Balanced] {
            let mut all_dry = prepared(0.0, mixing_type);
            assert_eq!(all_dry.volumes(), (1.0, 0.0));
            assert_eq!(mix(&mut all_dry, &dry, &wet, 0), dry.to_vec());

            let mut all_wet = prepared(1.0, mixing_type);
            assert_eq!(all_wet.volumes(), (0.0, 1.0));
            assert_eq!(mix(&mut all_wet, &dry, &wet, 0), wet.to_vec());
        }
    }

    #[test]
    fn test_volume_laws() {
        let mut mixer = DryWetMixer::<f64>::new(1, 16);
        mixer.set_mixing_ratio(0.25);
        assert_eq!(mixer.volumes(), (0.75, 0.25));

        mixer.set_mixing_type(MixingType::Balanced);
        assert_eq!(mixer.volumes(), (1.0, 0.5));
        mixer.set_mixing_ratio(0.5);
        assert_eq!(mixer.volumes(), (1.0, 1.0));
        mixer.set_mixing_ratio(0.9);
        let (dry, wet) = mixer.volumes();
        approx::assert_relative_eq!(dry, 0.2, epsilon = 1e-12);
        assert_eq!(wet, 1.0);
    }

    #[test]
    fn test_ratio_is_clamped() {
        let mut mixer = DryWetMixer::<f32>::new(1, 16);
        mixer.set_mixing_ratio(3.0);
        assert_eq!(mixer.mixing_ratio(), 1.0);
        mixer.set_mixing_ratio(-1.0);
        assert_eq!(mixer.mixing_ratio(), 0.0);
    }

    #[test]
    fn test_dry_latency() {
        let mut mixer = prepared(0.0, MixingType::Linear);
        mixer.set_dry_latency(2);
        assert_eq!(mixer.latency(), 2);
        let silence = [0.0; 4];
        let first = mix(&mut mixer, &[1.0, 2.0, 3.0, 4.0], &silence, 2);
        assert_eq!(first, vec![0.0, 0.0, 1.0, 2.0]);
        let second = mix(&mut mixer, &[5.0, 6.0, 7.0, 8.0], &silence, 2);
        assert_eq!(second, vec![3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_processor_mixes_input_with_output() {
        let mut mixer = prepared(0.5, MixingType::Linear);
        let dry = AudioBuffer::<f32>::from_channels(&[&[1.0, 1.0, 1.0, 1.0]]);
        let mut wet = AudioBuffer::<f32>::from_channels(&[&[3.0, 3.0, 3.0, 3.0]]);
        mixer.process(&mut ProcessContext::non_replacing(dry.to_ref(), wet.view()));
        assert!(wet.channel(0).iter().all(|&s| s == 2.0));
    }

    #[test]
    fn test_unprepared_leaves_buffer() {
        let mut mixer = DryWetMixer::<f32>::new(1, 16);
        let dry = AudioBuffer::<f32>::from_channels(&[&[1.0, 1.0, 1.0, 1.0]]);
        let mut wet = AudioBuffer::<f32>::from_channels(&[&[3.0, -3.0, 3.0, -3.0]]);

        mixer.process(&mut ProcessContext::non_replacing(dry.to_ref(), wet.view()));
        mixer.push_dry_samples(&dry.to_ref());
        mixer.mix_dry_wet(&mut wet.view(), 0);
        mixer.reset();
        assert_eq!(wet.channel(0), &[3.0, -3.0, 3.0, -3.0]);
        assert!(!mixer.is_ready());
    }
}
