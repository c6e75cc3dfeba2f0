use log::{debug, info};

use crate::{
    MlErr, Result,
    arch::{Model, loss::LossFn},
    dataset::Dataset,
    optimization::Optimizer,
};

/// A full-batch trainer: every iteration makes a forward and backward pass over the whole
/// dataset and applies a single optimizer step.
pub struct Trainer<O, L>
where
    O: Optimizer,
    L: LossFn,
{
    optimizer: O,
    loss_fn: L,
    grad: Vec<f32>,
}

impl<O, L> Trainer<O, L>
where
    O: Optimizer,
    L: LossFn,
{
    /// Returns a new `Trainer`.
    ///
    /// # Arguments
    /// * `optimizer` - The optimizer that dictates how to update the parameters on each step.
    /// * `loss_fn` - The loss function used to measure the difference between a model's output and the expected one.
    pub fn new(optimizer: O, loss_fn: L) -> Self {
        Self {
            optimizer,
            loss_fn,
            grad: Vec::new(),
        }
    }

    /// Runs exactly `iterations` training steps over the whole dataset.
    ///
    /// There is no convergence check nor early stopping.
    ///
    /// # Arguments
    /// * `model` - The model being trained.
    /// * `params` - The model's parameters, updated in place.
    /// * `dataset` - The samples and their expected outputs.
    /// * `iterations` - The amount of steps to run.
    ///
    /// # Returns
    /// The loss measured at every step, before that step's update.
    pub fn train<M: Model>(
        &mut self,
        model: &mut M,
        params: &mut [f32],
        dataset: &Dataset,
        iterations: usize,
    ) -> Result<LossTrace> {
        if params.len() != model.size() {
            return Err(MlErr::SizeMismatch {
                what: "model parameters",
                got: params.len(),
                expected: model.size(),
            });
        }

        self.grad.clear();
        self.grad.resize(params.len(), 0.);

        let mut trace = LossTrace::with_capacity(iterations);

        for i in 0..iterations {
            self.grad.fill(0.);

            let loss = model.backprop(
                params,
                &mut self.grad,
                &self.loss_fn,
                dataset.x(),
                dataset.y(),
            )?;
            self.optimizer.update_params(params, &self.grad)?;

            debug!(iteration = i, loss = loss; "training step");
            trace.push(loss);
        }

        if let (Some(first), Some(last)) = (trace.first(), trace.last()) {
            info!(
                "trained {iterations} iterations over {} samples, loss {first:.6} -> {last:.6}",
                dataset.len()
            );
        }

        Ok(trace)
    }
}

/// The loss of every training step, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LossTrace {
    losses: Vec<f32>,
}

impl LossTrace {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            losses: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, loss: f32) {
        self.losses.push(loss);
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.losses
    }

    pub fn len(&self) -> usize {
        self.losses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.losses.is_empty()
    }

    pub fn first(&self) -> Option<f32> {
        self.losses.first().copied()
    }

    pub fn last(&self) -> Option<f32> {
        self.losses.last().copied()
    }

    /// Mean of the first `n` losses (or of all of them if there are fewer).
    pub fn head_mean(&self, n: usize) -> Option<f32> {
        mean(&self.losses[..n.min(self.losses.len())])
    }

    /// Mean of the last `n` losses (or of all of them if there are fewer).
    pub fn tail_mean(&self, n: usize) -> Option<f32> {
        let start = self.losses.len().saturating_sub(n);
        mean(&self.losses[start..])
    }
}

fn mean(values: &[f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }

    Some(values.iter().sum::<f32>() / values.len() as f32)
}

#[cfg(test)]
mod tests {
    use ndarray::array;
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::{
        arch::{Sequential, activations::ActFn, layers::Layer, loss::Mse},
        initialization::ParamInit,
        optimization::Adam,
    };

    #[test]
    fn and2_gate_convergence() {
        let x = array![[0., 0.], [0., 1.], [1., 0.], [1., 1.]];
        let y = array![[0.], [0.], [0.], [1.]];
        let dataset = Dataset::new(x, y).unwrap();

        let mut model = Sequential::new([Layer::dense((2, 1), ActFn::sigmoid(1.))]);
        let mut rng = StdRng::seed_from_u64(100);
        let mut params = model.init_params(ParamInit::FanInUniform, &mut rng).unwrap();
        let mut trainer = Trainer::new(Adam::with_learning_rate(model.size(), 0.1), Mse);

        let trace = trainer.train(&mut model, &mut params, &dataset, 500).unwrap();

        assert_eq!(trace.len(), 500);
        assert!(trace.last().unwrap() < 0.05);

        let y_pred = model.predict(&params, dataset.x()).unwrap();
        assert!(y_pred[[3, 0]] > 0.5);
        assert!(y_pred[[0, 0]] < 0.5);
    }

    #[test]
    fn zero_iterations_leave_params_untouched() {
        let dataset = Dataset::new(array![[1.]], array![[1.]]).unwrap();
        let mut model = Sequential::new([Layer::dense((1, 1), None)]);
        let mut params = vec![0.3, -0.2];
        let mut trainer = Trainer::new(Adam::with_learning_rate(2, 0.1), Mse);

        let trace = trainer.train(&mut model, &mut params, &dataset, 0).unwrap();

        assert!(trace.is_empty());
        assert_eq!(params, [0.3, -0.2]);
    }

    #[test]
    fn rejects_mismatched_params() {
        let dataset = Dataset::new(array![[1.]], array![[1.]]).unwrap();
        let mut model = Sequential::new([Layer::dense((1, 1), None)]);
        let mut trainer = Trainer::new(Adam::with_learning_rate(2, 0.1), Mse);

        assert!(trainer.train(&mut model, &mut [0.; 3], &dataset, 1).is_err());
    }

    #[test]
    fn trace_windows() {
        let mut trace = LossTrace::default();
        [4., 3., 2., 1.].into_iter().for_each(|l| trace.push(l));

        assert_eq!(trace.head_mean(2), Some(3.5));
        assert_eq!(trace.tail_mean(2), Some(1.5));
        assert_eq!(trace.tail_mean(10), Some(2.5));
        assert_eq!(LossTrace::default().head_mean(3), None);
    }
}
