//! Continuous recordings exported to a `safetensors` container.
//!
//! The container holds a single F32 tensor `data` shaped `[channels, samples]`, in Volts, and the
//! metadata keys `sfreq`, `first_samp`, `channels` (a JSON list of `{"name", "kind"}`) and,
//! optionally, `bads` (a JSON list of channel names).

use std::{collections::HashMap, fs, path::Path};

use log::info;
use ndarray::{Array2, Axis};
use safetensors::{Dtype, SafeTensors, serialize_to_file, tensor::TensorView};
use serde::{Deserialize, Serialize};

use super::{EegErr, Result};

const DATA: &str = "data";
const SFREQ: &str = "sfreq";
const FIRST_SAMP: &str = "first_samp";
const CHANNELS: &str = "channels";
const BADS: &str = "bads";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Eeg,
    Eog,
    Meg,
    Stim,
    Misc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub name: String,
    pub kind: ChannelKind,
}

impl ChannelInfo {
    pub fn new(name: impl Into<String>, kind: ChannelKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// A multichannel continuous recording.
#[derive(Debug, Clone)]
pub struct Recording {
    sfreq: f32,
    first_samp: usize,
    channels: Vec<ChannelInfo>,
    bads: Vec<String>,
    data: Array2<f32>,
}

impl Recording {
    /// Creates a new `Recording`.
    ///
    /// # Arguments
    /// * `sfreq` - Sampling frequency, in Hz.
    /// * `first_samp` - Absolute index of the first sample of `data`.
    /// * `channels` - One entry per row of `data`.
    /// * `bads` - Names of the channels marked as bad.
    /// * `data` - The samples, one channel per row.
    pub fn new(
        sfreq: f32,
        first_samp: usize,
        channels: Vec<ChannelInfo>,
        bads: Vec<String>,
        data: Array2<f32>,
    ) -> Result<Self> {
        if !(sfreq > 0.) {
            return Err(EegErr::Format(format!(
                "sampling frequency must be positive, got {sfreq}"
            )));
        }

        if channels.len() != data.nrows() {
            return Err(EegErr::Format(format!(
                "{} channels described for {} rows of data",
                channels.len(),
                data.nrows()
            )));
        }

        Ok(Self {
            sfreq,
            first_samp,
            channels,
            bads,
            data,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let recording = Self::decode(&fs::read(path)?)?;
        info!(
            "loaded recording {}: {} channels, {} samples at {} Hz",
            path.display(),
            recording.channels.len(),
            recording.data.ncols(),
            recording.sfreq
        );
        Ok(recording)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let (_, header) = SafeTensors::read_metadata(bytes)?;
        let metadata = header.metadata().as_ref().ok_or_else(|| {
            EegErr::Format("recording holds no metadata".to_string())
        })?;

        let sfreq = parse_meta(metadata, SFREQ)?;
        let first_samp = parse_meta(metadata, FIRST_SAMP)?;
        let channels: Vec<ChannelInfo> = serde_json::from_str(require_meta(metadata, CHANNELS)?)?;
        let bads: Vec<String> = match metadata.get(BADS) {
            Some(raw) => serde_json::from_str(raw)?,
            None => Vec::new(),
        };

        let tensors = SafeTensors::deserialize(bytes)?;
        let tensor = tensors.tensor(DATA)?;

        if tensor.dtype() != Dtype::F32 {
            return Err(EegErr::Format(format!(
                "{DATA}: expected F32, found {:?}",
                tensor.dtype()
            )));
        }

        let &[rows, cols] = tensor.shape() else {
            return Err(EegErr::Format(format!(
                "{DATA}: expected 2 dimensions, found shape {:?}",
                tensor.shape()
            )));
        };

        let values: Vec<f32> = tensor
            .data()
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        let data = Array2::from_shape_vec((rows, cols), values)?;

        Self::new(sfreq, first_samp, channels, bads, data)
    }

    /// Writes the recording in the layout [`Recording::load`] reads.
    pub fn save(&self, path: &Path) -> Result<()> {
        let values: Vec<f32> = self.data.iter().copied().collect();
        let tensor = TensorView::new(
            Dtype::F32,
            vec![self.data.nrows(), self.data.ncols()],
            bytemuck::cast_slice(&values),
        )?;

        let metadata = HashMap::from([
            (SFREQ.to_string(), self.sfreq.to_string()),
            (FIRST_SAMP.to_string(), self.first_samp.to_string()),
            (CHANNELS.to_string(), serde_json::to_string(&self.channels)?),
            (BADS.to_string(), serde_json::to_string(&self.bads)?),
        ]);

        serialize_to_file([(DATA, tensor)], &Some(metadata), path)?;
        Ok(())
    }

    pub fn sfreq(&self) -> f32 {
        self.sfreq
    }

    pub fn first_samp(&self) -> usize {
        self.first_samp
    }

    pub fn channels(&self) -> &[ChannelInfo] {
        &self.channels
    }

    pub fn bads(&self) -> &[String] {
        &self.bads
    }

    pub fn data(&self) -> &Array2<f32> {
        &self.data
    }

    /// Amount of time samples.
    pub fn len(&self) -> usize {
        self.data.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.data.ncols() == 0
    }

    pub fn is_bad(&self, name: &str) -> bool {
        self.bads.iter().any(|bad| bad == name)
    }

    /// Re-references every good EEG channel to the mean of all good EEG channels, sample by
    /// sample. Other channels are left untouched.
    pub fn set_average_reference(&mut self) {
        let eeg: Vec<usize> = self
            .channels
            .iter()
            .enumerate()
            .filter(|(_, ch)| ch.kind == ChannelKind::Eeg && !self.is_bad(&ch.name))
            .map(|(i, _)| i)
            .collect();

        let Some(reference) = self.data.select(Axis(0), &eeg).mean_axis(Axis(0)) else {
            return;
        };

        for i in eeg {
            let mut row = self.data.row_mut(i);
            row -= &reference;
        }
    }

    /// Keeps the good channels of the given kinds, in their original order.
    pub fn pick(&self, kinds: &[ChannelKind]) -> Recording {
        let picked: Vec<usize> = self
            .channels
            .iter()
            .enumerate()
            .filter(|(_, ch)| kinds.contains(&ch.kind) && !self.is_bad(&ch.name))
            .map(|(i, _)| i)
            .collect();

        Recording {
            sfreq: self.sfreq,
            first_samp: self.first_samp,
            channels: picked.iter().map(|&i| self.channels[i].clone()).collect(),
            bads: Vec::new(),
            data: self.data.select(Axis(0), &picked),
        }
    }
}

fn require_meta<'m>(metadata: &'m HashMap<String, String>, key: &str) -> Result<&'m str> {
    metadata
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| EegErr::Format(format!("recording metadata lacks {key:?}")))
}

fn parse_meta<T: std::str::FromStr>(metadata: &HashMap<String, String>, key: &str) -> Result<T> {
    let raw = require_meta(metadata, key)?;
    raw.parse()
        .map_err(|_| EegErr::Format(format!("recording metadata {key:?}: invalid value {raw:?}")))
}
