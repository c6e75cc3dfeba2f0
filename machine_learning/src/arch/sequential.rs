use std::mem;

use ndarray::{Array2, ArrayView2};
use rand::Rng;

use super::{Model, layers::Layer, loss::LossFn};
use crate::{MlErr, Result, initialization::ParamInit};

/// A sequential model: information flows forward when computing an output and backward when
/// computing the *deltas* of its layers.
///
/// The model holds no parameters of its own, they are handed in as one flat slice where every
/// layer owns a contiguous range, in order.
#[derive(Clone)]
pub struct Sequential {
    layers: Vec<Layer>,
}

impl Sequential {
    /// Creates a new `Sequential`.
    ///
    /// # Arguments
    /// * `layers` - The layers the sequential is composed of.
    ///
    /// # Returns
    /// A new `Sequential` instance.
    pub fn new<I>(layers: I) -> Self
    where
        I: IntoIterator<Item = Layer>,
    {
        Self {
            layers: layers.into_iter().collect(),
        }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Returns the width of the samples this model takes, if it has any layers.
    pub fn input_width(&self) -> Option<usize> {
        self.layers.first().map(|layer| layer.dim().0)
    }

    /// Returns the width of the model's output, if it has any layers.
    pub fn output_width(&self) -> Option<usize> {
        self.layers.last().map(|layer| layer.dim().1)
    }

    /// Describes the whole layer stack, e.g. `dense(2x3,relu) -> dense(3x1,sigmoid)`.
    pub fn describe(&self) -> String {
        self.layers
            .iter()
            .map(Layer::describe)
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    /// Checks that the model has layers and that every layer takes as many inputs as the
    /// previous one outputs.
    pub fn validate(&self) -> Result<()> {
        if self.layers.is_empty() {
            return Err(MlErr::SizeMismatch {
                what: "model layers",
                got: 0,
                expected: 1,
            });
        }

        for pair in self.layers.windows(2) {
            let (_, prev_m) = pair[0].dim();
            let (curr_n, _) = pair[1].dim();

            if prev_m != curr_n {
                return Err(MlErr::SizeMismatch {
                    what: "adjacent layer widths",
                    got: curr_n,
                    expected: prev_m,
                });
            }
        }

        Ok(())
    }

    /// Generates a fresh parameter buffer for this model, layer by layer.
    ///
    /// # Arguments
    /// * `init` - How each layer's parameters are drawn.
    /// * `rng` - The random number generator to draw them from.
    pub fn init_params<R: Rng + ?Sized>(&self, init: ParamInit, rng: &mut R) -> Result<Vec<f32>> {
        let mut params = Vec::with_capacity(self.size());

        for layer in &self.layers {
            let (fan_in, _) = layer.dim();
            init.extend(rng, fan_in, layer.size(), &mut params)?;
        }

        Ok(params)
    }

    /// Splits a flat parameter buffer into every layer's own slice.
    pub fn layer_params<'p>(&self, params: &'p [f32]) -> Result<Vec<(&Layer, &'p [f32])>> {
        self.check_len("model parameters", params.len())?;

        let mut rest = params;
        let mut out = Vec::with_capacity(self.layers.len());

        for layer in &self.layers {
            let (head, tail) = rest.split_at(layer.size());
            out.push((layer, head));
            rest = tail;
        }

        Ok(out)
    }

    /// Makes a forward pass and returns an owned copy of the output.
    pub fn predict(&mut self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.forward(params, x).map(|y| y.to_owned())
    }

    fn check_len(&self, what: &'static str, len: usize) -> Result<()> {
        let expected = self.size();

        if len != expected {
            return Err(MlErr::SizeMismatch {
                what,
                got: len,
                expected,
            });
        }

        Ok(())
    }
}

impl Model for Sequential {
    fn size(&self) -> usize {
        self.layers.iter().map(|layer| layer.size()).sum()
    }

    fn forward<'a>(
        &'a mut self,
        params: &[f32],
        mut x: ArrayView2<'a, f32>,
    ) -> Result<ArrayView2<'a, f32>> {
        self.check_len("model parameters", params.len())?;

        let mut rest = params;

        for layer in self.layers.iter_mut() {
            let (layer_params, tail) = rest.split_at(layer.size());
            rest = tail;
            x = layer.forward(layer_params, x)?;
        }

        Ok(x)
    }

    fn backprop<L: LossFn>(
        &mut self,
        params: &[f32],
        grad: &mut [f32],
        loss_fn: &L,
        x: ArrayView2<f32>,
        y: ArrayView2<f32>,
    ) -> Result<f32> {
        self.check_len("model gradient", grad.len())?;

        let y_pred = self.forward(params, x)?;

        if y_pred.dim() != y.dim() {
            return Err(MlErr::SizeMismatch {
                what: "expected output rows",
                got: y.nrows(),
                expected: y_pred.nrows(),
            });
        }

        let loss = loss_fn.loss(y_pred, y);
        let mut d_last = loss_fn.loss_prime(y_pred, y);
        let mut d = d_last.view_mut();

        let mut end = params.len();
        let mut grad_rest = grad;

        for layer in self.layers.iter_mut().rev() {
            let start = end - layer.size();
            let (head, layer_grad) = mem::take(&mut grad_rest).split_at_mut(start);
            grad_rest = head;

            d = layer.backward(&params[start..end], layer_grad, d)?;
            end = start;
        }

        Ok(loss)
    }
}
