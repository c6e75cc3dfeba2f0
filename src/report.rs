//! JSON dumps of everything a run produces: loss curves, scores, class means and weights.

use std::{
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
};

use log::info;
use machine_learning::evaluation::{Class, Evaluation};
use serde::Serialize;

use crate::{
    classifier::LayerWeights,
    error::Result,
    pipeline::{EegOutcome, SyntheticOutcome},
};

/// Writes reports into a single directory.
#[derive(Debug, Clone)]
pub struct Reporter {
    dir: PathBuf,
}

impl Reporter {
    /// Creates a new `Reporter`, creating `dir` if it doesn't exist yet.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `report` as indented JSON to `{dir}/{name}.json`.
    pub fn write<T: Serialize>(&self, name: &str, report: &T) -> Result<PathBuf> {
        self.write_with(name, |writer| serde_json::to_writer_pretty(writer, report))
    }

    /// Writes `report` as compact JSON to `{dir}/{name}.json`.
    pub fn write_compact<T: Serialize>(&self, name: &str, report: &T) -> Result<PathBuf> {
        self.write_with(name, |writer| serde_json::to_writer(writer, report))
    }

    fn write_with<F>(&self, name: &str, write: F) -> Result<PathBuf>
    where
        F: FnOnce(BufWriter<File>) -> serde_json::Result<()>,
    {
        let path = self.dir.join(format!("{name}.json"));
        write(BufWriter::new(File::create(&path)?))?;
        info!("wrote {}", path.display());
        Ok(path)
    }
}

/// Scores of a held-out set against the class its samples belong to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreReport {
    pub expected: &'static str,
    pub threshold: f32,
    pub scores: Vec<f32>,
    pub mean_score: f32,
    pub correct: usize,
    pub total: usize,
    pub accuracy: f32,
}

impl ScoreReport {
    pub fn new(evaluation: &Evaluation, expected: Class) -> Self {
        Self {
            expected: match expected {
                Class::Positive => "positive",
                Class::Negative => "negative",
            },
            threshold: evaluation.threshold(),
            scores: evaluation.scores().to_vec(),
            mean_score: evaluation.mean_score(),
            correct: evaluation.correct(expected),
            total: evaluation.len(),
            accuracy: evaluation.accuracy(expected),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyntheticReport {
    pub loss: Vec<f32>,
    pub mean_positive: Vec<f32>,
    pub mean_negative: Vec<f32>,
    pub positive_test: ScoreReport,
    pub negative_test: ScoreReport,
}

impl SyntheticReport {
    pub fn new(outcome: &SyntheticOutcome) -> Self {
        Self {
            loss: outcome.loss.as_slice().to_vec(),
            mean_positive: outcome.mean_positive.to_vec(),
            mean_negative: outcome.mean_negative.to_vec(),
            positive_test: ScoreReport::new(&outcome.positive_test, Class::Positive),
            negative_test: ScoreReport::new(&outcome.negative_test, Class::Negative),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EegReport {
    pub loss: Vec<f32>,
    pub times: Vec<f32>,
    pub mean_positive: Vec<f32>,
    pub mean_negative: Vec<f32>,
    pub positive_test: ScoreReport,
    pub negative_test: ScoreReport,
    pub negative_rest: ScoreReport,
}

impl EegReport {
    pub fn new(outcome: &EegOutcome) -> Self {
        Self {
            loss: outcome.loss.as_slice().to_vec(),
            times: outcome.times.clone(),
            mean_positive: outcome.mean_positive.to_vec(),
            mean_negative: outcome.mean_negative.to_vec(),
            positive_test: ScoreReport::new(&outcome.positive_test, Class::Positive),
            negative_test: ScoreReport::new(&outcome.negative_test, Class::Negative),
            negative_rest: ScoreReport::new(&outcome.negative_rest, Class::Negative),
        }
    }
}

/// The learned parameters of every layer, one matrix row per input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightsReport {
    pub architecture: String,
    pub layers: Vec<LayerReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerReport {
    pub shape: [usize; 2],
    pub weights: Vec<Vec<f32>>,
    pub biases: Vec<f32>,
}

impl WeightsReport {
    pub fn new(architecture: String, layers: &[LayerWeights]) -> Self {
        let layers = layers
            .iter()
            .map(|layer| {
                let (n, m) = layer.weights.dim();
                LayerReport {
                    shape: [n, m],
                    weights: layer.weights.rows().into_iter().map(|r| r.to_vec()).collect(),
                    biases: layer.biases.to_vec(),
                }
            })
            .collect();

        Self {
            architecture,
            layers,
        }
    }
}
