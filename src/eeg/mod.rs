//! Turns a continuous EEG recording into the sample vectors the classifier takes.
//!
//! The recording is re-referenced to the average of its EEG channels, reduced to its good EEG and
//! EOG channels and cut into event-locked epochs. A single channel of every surviving epoch
//! becomes one sample, robust-scaled on its own.

mod dataset;
mod epochs;
mod error;
mod events;
mod recording;
mod scaler;

pub use dataset::EegSplits;
pub use epochs::{EpochWindow, Epochs};
pub use error::{EegErr, Result};
pub use events::{Event, parse_events, read_events};
pub use recording::{ChannelInfo, ChannelKind, Recording};
pub use scaler::{RobustScaler, percentile};

use log::info;
use ndarray::{Array1, Array2, Axis};

use crate::config::{EegConfig, SplitConfig};

/// Both classes of a recording as scaled sample vectors.
#[derive(Debug, Clone)]
pub struct EegSamples {
    /// One scaled P300 epoch per row.
    pub positives: Array2<f32>,
    /// One scaled non-P300 epoch per row.
    pub negatives: Array2<f32>,
    /// Time of every column relative to the event, in seconds.
    pub times: Vec<f32>,
    /// Average response of the channel to P300 events, before scaling.
    pub mean_positive: Array1<f32>,
    /// Average response of the channel to every other event, before scaling.
    pub mean_negative: Array1<f32>,
}

impl EegSamples {
    /// Loads the recording and event file named by `config` and adapts them.
    pub fn load(config: &EegConfig) -> Result<Self> {
        let recording = Recording::load(&config.raw_path)?;
        let events = read_events(&config.events_path)?;
        info!(
            "read {} events from {}",
            events.len(),
            config.events_path.display()
        );

        Self::from_recording(recording, &events, config)
    }

    /// Adapts an in-memory recording.
    ///
    /// # Errors
    /// `EegErr::MissingChannel` if the configured channel isn't a good EEG or EOG channel.
    pub fn from_recording(
        mut recording: Recording,
        events: &[Event],
        config: &EegConfig,
    ) -> Result<Self> {
        recording.set_average_reference();
        let recording = recording.pick(&[ChannelKind::Eeg, ChannelKind::Eog]);

        let window = EpochWindow {
            tmin: config.tmin,
            tmax: config.tmax,
            reject_eeg: config.reject_eeg,
            reject_eog: config.reject_eog,
        };

        let p300 = Epochs::extract(&recording, events, &[config.p300_event], &window)?;
        let others = Epochs::extract(&recording, events, &config.other_events, &window)?;
        info!(
            "extracted {} p300 epochs and {} other epochs",
            p300.len(),
            others.len()
        );

        let mut positives = p300.channel_data(&config.channel)?;
        let mut negatives = others.channel_data(&config.channel)?;
        let mean_positive = mean_or_zeros(&positives);
        let mean_negative = mean_or_zeros(&negatives);

        let scaler = RobustScaler::default();
        scaler.scale_rows(&mut positives);
        scaler.scale_rows(&mut negatives);

        Ok(Self {
            positives,
            negatives,
            times: p300.times().to_vec(),
            mean_positive,
            mean_negative,
        })
    }

    /// Width of every sample.
    pub fn width(&self) -> usize {
        self.times.len()
    }

    pub fn split(&self, splits: &SplitConfig) -> Result<EegSplits> {
        EegSplits::new(self.positives.view(), self.negatives.view(), splits)
    }
}

fn mean_or_zeros(x: &Array2<f32>) -> Array1<f32> {
    x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(x.ncols()))
}

#[cfg(test)]
mod tests {
    use ndarray::Array2;

    use super::*;

    fn config() -> EegConfig {
        EegConfig {
            channel: "EEG 002".to_string(),
            tmin: -0.1,
            tmax: 0.4,
            reject_eeg: Some(1e-3),
            reject_eog: Some(1e-3),
            ..EegConfig::default()
        }
    }

    /// Two EEG channels, one bad one and an EOG channel at 20 Hz. A response follows every
    /// event with id 5, every event with id 9 hits the EOG channel with a blink.
    fn recording(events: &[Event]) -> Recording {
        let n = 400;
        let mut data = Array2::zeros((4, n));

        for (i, mut col) in data.columns_mut().into_iter().enumerate() {
            let t = i as f32;
            col[0] = 1e-6 * (t * 0.3).sin();
            col[1] = 1e-6 * (t * 0.7).cos();
            col[2] = 1.;
            col[3] = 0.;
        }

        for event in events {
            let at = event.sample - 1000;
            match event.id {
                5 => {
                    for k in 2..6 {
                        data[[1, at + k]] += 2e-5;
                    }
                }
                9 => data[[3, at + 1]] = 5e-3,
                _ => {}
            }
        }

        Recording::new(
            20.,
            1000,
            vec![
                ChannelInfo::new("EEG 001", ChannelKind::Eeg),
                ChannelInfo::new("EEG 002", ChannelKind::Eeg),
                ChannelInfo::new("EEG 003", ChannelKind::Eeg),
                ChannelInfo::new("EOG 061", ChannelKind::Eog),
            ],
            vec!["EEG 003".to_string()],
            data,
        )
        .unwrap()
    }

    fn events() -> Vec<Event> {
        [(1020, 5), (1040, 1), (1060, 5), (1080, 2), (1100, 9), (1120, 3), (1398, 4)]
            .into_iter()
            .map(|(sample, id)| Event {
                sample,
                previous: 0,
                id,
            })
            .collect()
    }

    #[test]
    fn adapts_both_classes() {
        let events = events();
        let mut config = config();
        config.other_events = vec![1, 2, 3, 4, 9];

        let samples = EegSamples::from_recording(recording(&events), &events, &config).unwrap();

        // Window is -2..=8 samples; the blink and the last event are dropped.
        assert_eq!(samples.width(), 11);
        assert_eq!(samples.positives.nrows(), 2);
        assert_eq!(samples.negatives.nrows(), 3);

        for row in samples.positives.rows().into_iter().chain(samples.negatives.rows()) {
            let mut sorted = row.to_vec();
            sorted.sort_by(f32::total_cmp);
            assert!(percentile(&sorted, 50.).abs() < 1e-5);
        }

        let peak = samples.mean_positive.iter().copied().fold(f32::MIN, f32::max);
        let other_peak = samples.mean_negative.iter().copied().fold(f32::MIN, f32::max);
        assert!(peak > other_peak);
    }

    #[test]
    fn missing_channel() {
        let events = events();
        let mut config = config();
        config.channel = "EEG 003".to_string();

        let err = EegSamples::from_recording(recording(&events), &events, &config);
        assert!(matches!(err, Err(EegErr::MissingChannel(_))));
    }
}
