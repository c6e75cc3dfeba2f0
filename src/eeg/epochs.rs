use log::{debug, warn};
use ndarray::{Array2, Array3, ArrayView3, Axis, s};

use super::{
    EegErr, Result,
    events::Event,
    recording::{ChannelInfo, ChannelKind, Recording},
};

/// How epochs are cut out of a recording.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochWindow {
    /// Window start relative to the event, in seconds.
    pub tmin: f32,
    /// Window end relative to the event, in seconds, included.
    pub tmax: f32,
    /// Peak-to-peak threshold above which an EEG channel rejects the epoch.
    pub reject_eeg: Option<f32>,
    /// Same as `reject_eeg`, for EOG channels.
    pub reject_eog: Option<f32>,
}

impl EpochWindow {
    /// Returns the first and last sample offsets of the window relative to the event.
    pub fn offsets(&self, sfreq: f32) -> (i64, i64) {
        (
            (self.tmin * sfreq).round() as i64,
            (self.tmax * sfreq).round() as i64,
        )
    }
}

/// Event-locked, baseline-corrected windows of a recording.
#[derive(Debug, Clone)]
pub struct Epochs {
    /// `[epochs, channels, times]`.
    data: Array3<f32>,
    events: Vec<Event>,
    channels: Vec<ChannelInfo>,
    times: Vec<f32>,
}

impl Epochs {
    /// Cuts one epoch around every event whose id is in `ids`.
    ///
    /// Each epoch is baseline-corrected with the mean of its samples at or before the event.
    /// Epochs that don't fit in the recording, or whose peak-to-peak amplitude exceeds the
    /// window's threshold on any EEG or EOG channel, are dropped.
    ///
    /// # Arguments
    /// * `recording` - The continuous data.
    /// * `events` - Every event of the recording, `first_samp` included.
    /// * `ids` - The event ids to keep.
    /// * `window` - The epoch window and the rejection thresholds.
    pub fn extract(
        recording: &Recording,
        events: &[Event],
        ids: &[u32],
        window: &EpochWindow,
    ) -> Result<Self> {
        if !(window.tmin < window.tmax) {
            return Err(EegErr::Format(format!(
                "epoch window [{}, {}] is empty",
                window.tmin, window.tmax
            )));
        }

        let sfreq = recording.sfreq();
        let (start, end) = window.offsets(sfreq);
        let times: Vec<f32> = (start..=end).map(|k| k as f32 / sfreq).collect();
        let baseline = if start <= 0 {
            (end.min(0) - start + 1) as usize
        } else {
            0
        };

        let channels = recording.channels().to_vec();
        let mut kept = Vec::new();
        let mut epochs = Vec::new();

        for event in events.iter().filter(|event| ids.contains(&event.id)) {
            let center = event.sample as i64 - recording.first_samp() as i64;
            let (first, last) = (center + start, center + end);

            if first < 0 || last >= recording.len() as i64 {
                warn!(
                    "dropping event {} at sample {}: window outside the recording",
                    event.id, event.sample
                );
                continue;
            }

            let mut epoch = recording
                .data()
                .slice(s![.., first as usize..=last as usize])
                .to_owned();

            if baseline > 0 {
                let means = epoch
                    .slice(s![.., ..baseline])
                    .mean_axis(Axis(1))
                    .ok_or_else(|| EegErr::Format("empty baseline".to_string()))?;
                epoch -= &means.insert_axis(Axis(1));
            }

            if let Some(channel) = rejected_by(&epoch, &channels, window) {
                warn!(
                    "dropping event {} at sample {}: {channel} exceeds its peak-to-peak threshold",
                    event.id, event.sample
                );
                continue;
            }

            kept.push(*event);
            epochs.push(epoch);
        }

        debug!(
            "kept {} epochs out of {} events with ids {ids:?}",
            kept.len(),
            events.iter().filter(|e| ids.contains(&e.id)).count()
        );

        let mut data = Array3::zeros((epochs.len(), channels.len(), times.len()));
        for (mut out, epoch) in data.outer_iter_mut().zip(&epochs) {
            out.assign(epoch);
        }

        Ok(Self {
            data,
            events: kept,
            channels,
            times,
        })
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn data(&self) -> ArrayView3<'_, f32> {
        self.data.view()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn channels(&self) -> &[ChannelInfo] {
        &self.channels
    }

    /// Time of every sample relative to the event, in seconds.
    pub fn times(&self) -> &[f32] {
        &self.times
    }

    /// Returns a single channel of every epoch, one epoch per row.
    pub fn channel_data(&self, name: &str) -> Result<Array2<f32>> {
        let index = self
            .channels
            .iter()
            .position(|ch| ch.name == name)
            .ok_or_else(|| EegErr::MissingChannel(name.to_string()))?;

        Ok(self.data.index_axis(Axis(1), index).to_owned())
    }

    /// Averages every epoch into a single `[channels, times]` response.
    pub fn average(&self) -> Option<Array2<f32>> {
        self.data.mean_axis(Axis(0))
    }
}

fn rejected_by<'c>(
    epoch: &Array2<f32>,
    channels: &'c [ChannelInfo],
    window: &EpochWindow,
) -> Option<&'c str> {
    channels.iter().zip(epoch.rows()).find_map(|(ch, row)| {
        let threshold = match ch.kind {
            ChannelKind::Eeg => window.reject_eeg,
            ChannelKind::Eog => window.reject_eog,
            _ => None,
        }?;

        let (min, max) = row
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });

        (max - min > threshold).then_some(ch.name.as_str())
    })
}
