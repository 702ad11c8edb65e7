//! Configuration types for the reverb engine

use serde::{Deserialize, Serialize};

use crate::error::{DspError, DspResult, check_feedback_gain};

/// Default maximum delay of every delay line, in samples
pub const DEFAULT_MAX_DELAY: usize = 44_110;

/// Sample rate and maximum block size handed to `prepare`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcessSpec {
    pub sample_rate: f64,
    /// Largest block the host will deliver
    pub block_size: usize,
}

impl ProcessSpec {
    pub const fn new(sample_rate: f64, block_size: usize) -> Self {
        Self {
            sample_rate,
            block_size,
        }
    }

    /// Convert a duration to a whole number of samples at this rate
    #[inline]
    pub fn ms_to_samples(&self, ms: f64) -> usize {
        (ms * 0.001 * self.sample_rate) as usize
    }

    pub fn validate(&self) -> DspResult<()> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(DspError::InvalidSampleRate(self.sample_rate));
        }
        if self.block_size == 0 {
            return Err(DspError::InvalidBlockSize(self.block_size));
        }
        Ok(())
    }
}

impl Default for ProcessSpec {
    fn default() -> Self {
        Self::new(48000.0, 512)
    }
}

/// Dry/wet mixing law
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MixingType {
    /// `wet = ratio`, `dry = 1 - ratio`
    #[default]
    Linear,
    /// Each path at unity up to the midpoint: `wet = 2·min(0.5, ratio)`,
    /// `dry = 2·min(0.5, 1 - ratio)`
    Balanced,
}

/// One all-pass stage of the reverberator bank
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    pub delay_ms: f64,
    pub gain: f64,
}

impl StageConfig {
    pub const fn new(delay_ms: f64, gain: f64) -> Self {
        Self { delay_ms, gain }
    }
}

/// Default stage delays (ms), mutually prime at common sample rates
pub const DEFAULT_STAGE_DELAYS_MS: [f64; 5] = [72.3, 93.4, 63.3, 33.7, 134.0];

/// Default stage gain
pub const DEFAULT_STAGE_GAIN: f64 = 0.7;

/// Reverb engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReverbConfig {
    /// Channels processed by every stage
    pub num_channels: usize,

    /// Capacity of each delay line, in samples
    pub max_delay_samples: usize,

    /// Dry/wet mixing law
    pub mixing_type: MixingType,

    /// Delay applied to the dry path, in samples
    pub dry_latency: usize,

    /// Delay of the main feedback loop
    pub main_delay_ms: f64,

    /// All-pass bank inside the main loop, in processing order
    pub stages: Vec<StageConfig>,
}

impl Default for ReverbConfig {
    fn default() -> Self {
        Self {
            num_channels: 2,
            max_delay_samples: DEFAULT_MAX_DELAY,
            mixing_type: MixingType::Linear,
            dry_latency: 0,
            main_delay_ms: 67.0,
            stages: DEFAULT_STAGE_DELAYS_MS
                .iter()
                .map(|&delay_ms| StageConfig::new(delay_ms, DEFAULT_STAGE_GAIN))
                .collect(),
        }
    }
}

impl ReverbConfig {
    /// Default configuration for a mono signal
    pub fn mono() -> Self {
        Self {
            num_channels: 1,
            ..Default::default()
        }
    }

    pub fn with_channels(mut self, num_channels: usize) -> Self {
        self.num_channels = num_channels;
        self
    }

    pub fn with_max_delay(mut self, samples: usize) -> Self {
        self.max_delay_samples = samples;
        self
    }

    pub fn with_mixing_type(mut self, mixing_type: MixingType) -> Self {
        self.mixing_type = mixing_type;
        self
    }

    pub fn with_dry_latency(mut self, samples: usize) -> Self {
        self.dry_latency = samples;
        self
    }

    pub fn with_stages(mut self, stages: Vec<StageConfig>) -> Self {
        self.stages = stages;
        self
    }

    pub fn validate(&self) -> DspResult<()> {
        if self.num_channels == 0 {
            return Err(DspError::InvalidConfig("num_channels must be at least 1".into()));
        }
        if self.max_delay_samples == 0 {
            return Err(DspError::InvalidConfig(
                "max_delay_samples must be at least 1".into(),
            ));
        }
        if self.dry_latency > self.max_delay_samples {
            return Err(DspError::InvalidConfig(format!(
                "dry_latency {} exceeds max_delay_samples {}",
                self.dry_latency, self.max_delay_samples
            )));
        }
        if !(self.main_delay_ms.is_finite() && self.main_delay_ms > 0.0) {
            return Err(DspError::InvalidConfig(format!(
                "main_delay_ms must be positive, got {}",
                self.main_delay_ms
            )));
        }
        for (index, stage) in self.stages.iter().enumerate() {
            if !(stage.delay_ms.is_finite() && stage.delay_ms > 0.0) {
                return Err(DspError::InvalidConfig(format!(
                    "stage {index}: delay_ms must be positive, got {}",
                    stage.delay_ms
                )));
            }
            check_feedback_gain(stage.gain)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ReverbConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.stages.len(), 5);
        assert_eq!(config.num_channels, 2);
    }

    #[test]
    fn test_config_rejects_unit_gain() {
        let config = ReverbConfig::default().with_stages(vec![StageConfig::new(30.0, 1.0)]);
        assert_eq!(config.validate(), Err(DspError::UnstableGain(1.0)));
    }

    #[test]
    fn test_config_rejects_excess_latency() {
        let config = ReverbConfig::default()
            .with_max_delay(100)
            .with_dry_latency(101);
        assert!(matches!(config.validate(), Err(DspError::InvalidConfig(_))));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ReverbConfig =
            serde_json::from_str(r#"{ "num_channels": 1, "mixing_type": "Balanced" }"#).unwrap();
        assert_eq!(config.num_channels, 1);
        assert_eq!(config.mixing_type, MixingType::Balanced);
        assert_eq!(config.max_delay_samples, DEFAULT_MAX_DELAY);
        assert_eq!(config.stages, ReverbConfig::default().stages);
    }

    #[test]
    fn test_process_spec() {
        let spec = ProcessSpec::new(48000.0, 256);
        assert!(spec.validate().is_ok());
        assert_eq!(spec.ms_to_samples(67.0), 3216);
        assert_eq!(
            ProcessSpec::new(0.0, 256).validate(),
            Err(DspError::InvalidSampleRate(0.0))
        );
        assert_eq!(
            ProcessSpec::new(44100.0, 0).validate(),
            Err(DspError::InvalidBlockSize(0))
        );
    }
}
