use std::path::Path;

use machine_learning::{
    Result,
    arch::{Sequential, activations::ActFn, layers::Layer, loss::Mse},
    dataset::Dataset,
    evaluation::{Evaluation, Evaluator},
    initialization::ParamInit,
    optimization::Adam,
    snapshot,
    training::{LossTrace, Trainer},
};
use ndarray::{Array1, Array2, ArrayView2};
use rand::{SeedableRng, rngs::StdRng};

use crate::config::{AdamConfig, PipelineConfig};

/// The P300 detector: five dense layers mapping a sample vector to a single score in `[0, 1]`.
///
/// Owns both the layer stack and its flat parameter buffer.
#[derive(Clone)]
pub struct P300Classifier {
    model: Sequential,
    params: Vec<f32>,
}

/// The learned weights and biases of a single layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerWeights {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
}

impl P300Classifier {
    /// Builds the layer stack `sample_length -> h1 -> h2 -> h3 -> h4 -> 1`.
    ///
    /// The first layer is followed by a CELU, the three middle ones by a ReLU and the last one by
    /// a logistic sigmoid.
    pub fn architecture(sample_length: usize, hidden: [usize; 4]) -> Sequential {
        let [h1, h2, h3, h4] = hidden;

        Sequential::new([
            Layer::dense((sample_length, h1), ActFn::celu(1.)),
            Layer::dense((h1, h2), ActFn::relu()),
            Layer::dense((h2, h3), ActFn::relu()),
            Layer::dense((h3, h4), ActFn::relu()),
            Layer::dense((h4, 1), ActFn::sigmoid(1.)),
        ])
    }

    /// Creates a new `P300Classifier` with freshly drawn parameters.
    ///
    /// # Arguments
    /// * `sample_length` - The width of every sample vector.
    /// * `hidden` - The widths of the four hidden layers.
    /// * `seed` - Seed of the generator every parameter is drawn from.
    ///
    /// # Returns
    /// A new `P300Classifier`, the same one for the same arguments.
    pub fn new(sample_length: usize, hidden: [usize; 4], seed: u64) -> Result<Self> {
        let model = Self::architecture(sample_length, hidden);
        model.validate()?;

        let mut rng = StdRng::seed_from_u64(seed);
        let params = model.init_params(ParamInit::FanInUniform, &mut rng)?;

        Ok(Self { model, params })
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        Self::new(config.sample_length, config.hidden, config.seed)
    }

    pub fn model(&self) -> &Sequential {
        &self.model
    }

    pub fn params(&self) -> &[f32] {
        &self.params
    }

    /// Writes the current parameters as a snapshot at `path`.
    pub fn save_snapshot(&self, path: &Path) -> Result<()> {
        snapshot::save(path, &self.model, &self.params)
    }

    /// Replaces the current parameters with the ones stored at `path`.
    pub fn reload(&mut self, path: &Path) -> Result<()> {
        self.params = snapshot::load(path, &self.model)?;
        Ok(())
    }

    /// Scores every row of `x`, without touching the parameters.
    pub fn predict(&mut self, x: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.model.predict(&self.params, x)
    }

    /// Trains the classifier with a brand new Adam optimizer and the mean squared error.
    ///
    /// # Arguments
    /// * `dataset` - The training samples and their labels.
    /// * `iterations` - The exact amount of full-batch steps to run.
    /// * `learning_rate` - Adam's learning rate.
    /// * `adam` - Adam's remaining hyperparameters.
    ///
    /// # Returns
    /// The loss of every step.
    pub fn train(
        &mut self,
        dataset: &Dataset,
        iterations: usize,
        learning_rate: f32,
        adam: AdamConfig,
    ) -> Result<LossTrace> {
        let optimizer = Adam::new(
            self.params.len(),
            learning_rate,
            adam.beta1,
            adam.beta2,
            adam.epsilon,
        );

        let mut trainer = Trainer::new(optimizer, Mse);
        trainer.train(&mut self.model, &mut self.params, dataset, iterations)
    }

    /// Scores held-out samples against `threshold`.
    pub fn evaluate(&mut self, x: ArrayView2<f32>, threshold: f32) -> Result<Evaluation> {
        Evaluator::new(threshold).evaluate(&mut self.model, &self.params, x)
    }

    /// Returns an owned copy of every layer's weights and biases, in order.
    pub fn layer_weights(&self) -> Result<Vec<LayerWeights>> {
        let mut out = Vec::with_capacity(self.model.layers().len());

        for (layer, params) in self.model.layer_params(&self.params)? {
            let Layer::Dense(dense) = layer;
            let (weights, biases) = dense.view_params(params)?;

            out.push(LayerWeights {
                weights: weights.to_owned(),
                biases: biases.to_owned(),
            });
        }

        Ok(out)
    }
}
