//! Configuration of the walkthrough.
//!
//! Every field has a default matching the reference run, so an empty JSON object (or no file at
//! all) reproduces it. Fields that are present override the defaults one by one.

use std::{
    fs,
    ops::Range,
    path::{Path, PathBuf},
};

use machine_learning::optimization::Adam;
use serde::Deserialize;

use crate::error::{PipelineErr, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Seed for the initial parameters and the synthetic samples.
    pub seed: u64,
    /// Width of every sample vector.
    pub sample_length: usize,
    /// Widths of the four hidden layers.
    pub hidden: [usize; 4],
    pub learning_rate: f32,
    pub adam: AdamConfig,
    /// Scores at or above it are classified as positive.
    pub threshold: f32,
    /// Where the untrained parameters are saved and reloaded from.
    pub snapshot_path: PathBuf,
    /// Directory the JSON reports are written to.
    pub report_dir: PathBuf,
    pub synthetic: SyntheticConfig,
    /// `null` skips the real data stage.
    pub eeg: Option<EegConfig>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            seed: 100,
            sample_length: 226,
            hidden: [500, 1000, 100, 10],
            learning_rate: 1e-3,
            adam: AdamConfig::default(),
            threshold: 0.5,
            snapshot_path: PathBuf::from("p300_model_default_state.safetensors"),
            report_dir: PathBuf::from("reports"),
            synthetic: SyntheticConfig::default(),
            eeg: Some(EegConfig::default()),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdamConfig {
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
}

impl Default for AdamConfig {
    fn default() -> Self {
        Self {
            beta1: Adam::DEFAULT_BETA1,
            beta2: Adam::DEFAULT_BETA2,
            epsilon: Adam::DEFAULT_EPSILON,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyntheticConfig {
    /// Training samples, half positive and half negative.
    pub sample_count: usize,
    pub test_positives: usize,
    pub test_negatives_low: usize,
    pub test_negatives_high: usize,
    pub iterations: usize,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            sample_count: 240,
            test_positives: 10,
            test_negatives_low: 5,
            test_negatives_high: 5,
            iterations: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EegConfig {
    /// The recording, exported as a safetensors container.
    pub raw_path: PathBuf,
    /// The MNE text event file of the recording.
    pub events_path: PathBuf,
    /// The channel every sample vector is taken from.
    pub channel: String,
    pub p300_event: u32,
    pub other_events: Vec<u32>,
    /// Epoch window start relative to the event, in seconds.
    pub tmin: f32,
    /// Epoch window end relative to the event, in seconds.
    pub tmax: f32,
    /// Peak-to-peak rejection threshold for EEG channels, in Volts.
    pub reject_eeg: Option<f32>,
    /// Peak-to-peak rejection threshold for EOG channels, in Volts.
    pub reject_eog: Option<f32>,
    pub splits: SplitConfig,
    pub iterations: usize,
}

impl Default for EegConfig {
    fn default() -> Self {
        Self {
            raw_path: PathBuf::from("data/sample_audvis_filt-0-40_raw.safetensors"),
            events_path: PathBuf::from("data/sample_audvis_filt-0-40_raw-eve.txt"),
            channel: "EEG 058".to_string(),
            p300_event: 5,
            other_events: vec![1, 2, 3, 4],
            tmin: -0.5,
            tmax: 1.0,
            reject_eeg: Some(100e-6),
            reject_eog: Some(150e-6),
            splits: SplitConfig::default(),
            iterations: 50,
        }
    }
}

/// Which epochs of each class go to training and which are held out.
///
/// Every negative epoch outside `negative_train` and `negative_test` is evaluated at the end too.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SplitConfig {
    pub positive_train: Range<usize>,
    pub positive_test: Range<usize>,
    pub negative_train: Range<usize>,
    pub negative_test: Range<usize>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            positive_train: 0..9,
            positive_test: 9..12,
            negative_train: 30..39,
            negative_test: 39..42,
        }
    }
}

impl PipelineConfig {
    /// Loads the configuration from a JSON file, or the defaults when no path is given.
    ///
    /// # Errors
    /// Returns a `PipelineErr` if the file can't be read, parsed or doesn't validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_json(&fs::read_to_string(path)?)?,
            None => Self::default(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Parses a configuration from a JSON string, without validating it.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Returns the widths of every layer, input and output included.
    pub fn layer_widths(&self) -> [usize; 6] {
        let [h1, h2, h3, h4] = self.hidden;
        [self.sample_length, h1, h2, h3, h4, 1]
    }

    pub fn validate(&self) -> Result<()> {
        if self.layer_widths().contains(&0) {
            return invalid("sample_length and every hidden width must be greater than 0");
        }

        if !(self.learning_rate > 0.) {
            return invalid(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            ));
        }

        let AdamConfig { beta1, beta2, .. } = self.adam;
        if !(0. ..1.).contains(&beta1) || !(0. ..1.).contains(&beta2) {
            return invalid(format!(
                "adam betas must be in [0, 1), got {beta1} and {beta2}"
            ));
        }

        if !(0. ..=1.).contains(&self.threshold) {
            return invalid(format!(
                "threshold must be in [0, 1], got {}",
                self.threshold
            ));
        }

        let synthetic = &self.synthetic;
        if synthetic.sample_count == 0 || synthetic.sample_count % 4 != 0 {
            return invalid(format!(
                "synthetic.sample_count must be a positive multiple of 4, got {}",
                synthetic.sample_count
            ));
        }

        if let Some(eeg) = &self.eeg {
            eeg.validate()?;
        }

        Ok(())
    }
}

impl EegConfig {
    fn validate(&self) -> Result<()> {
        if !(self.tmin < self.tmax) {
            return invalid(format!(
                "eeg.tmin ({}) must be lower than eeg.tmax ({})",
                self.tmin, self.tmax
            ));
        }

        if self.other_events.contains(&self.p300_event) {
            return invalid(format!(
                "eeg.other_events must not contain the p300 event ({})",
                self.p300_event
            ));
        }

        let splits = &self.splits;
        for (name, range) in [
            ("positive_train", &splits.positive_train),
            ("positive_test", &splits.positive_test),
            ("negative_train", &splits.negative_train),
            ("negative_test", &splits.negative_test),
        ] {
            if range.is_empty() {
                return invalid(format!(
                    "eeg.splits.{name} must not be empty, got {range:?}"
                ));
            }
        }

        if overlaps(&splits.positive_train, &splits.positive_test)
            || overlaps(&splits.negative_train, &splits.negative_test)
        {
            return invalid("eeg.splits: train and test ranges of a class must not overlap");
        }

        Ok(())
    }
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

fn invalid<T>(msg: impl Into<String>) -> Result<T> {
    Err(PipelineErr::InvalidConfig(msg.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = PipelineConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.layer_widths(), [226, 500, 1000, 100, 10, 1]);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = PipelineConfig::from_json(
            r#"{ "seed": 7, "hidden": [8, 8, 4, 2], "synthetic": { "iterations": 3 } }"#,
        )
        .unwrap();

        assert_eq!(config.seed, 7);
        assert_eq!(config.hidden, [8, 8, 4, 2]);
        assert_eq!(config.synthetic.iterations, 3);
        assert_eq!(config.synthetic.sample_count, 240);
        assert_eq!(config.eeg.unwrap().channel, "EEG 058");
    }

    #[test]
    fn null_eeg_skips_real_data() {
        let config = PipelineConfig::from_json(r#"{ "eeg": null }"#).unwrap();

        assert!(config.eeg.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(PipelineConfig::from_json(r#"{ "sed": 7 }"#).is_err());
    }

    #[test]
    fn rejects_invalid_values() {
        let mut config = PipelineConfig::default();
        config.synthetic.sample_count = 6;
        assert!(matches!(config.validate(), Err(PipelineErr::InvalidConfig(_))));

        let mut config = PipelineConfig::default();
        config.learning_rate = 0.;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.hidden[2] = 0;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        if let Some(eeg) = config.eeg.as_mut() {
            eeg.tmin = 2.;
        }
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        if let Some(eeg) = config.eeg.as_mut() {
            eeg.splits.negative_test = 35..40;
        }
        assert!(config.validate().is_err());
    }
}
