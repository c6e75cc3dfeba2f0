use ndarray::ArrayView2;

use crate::{Result, arch::loss::LossFn};

pub trait Model {
    /// Returns the amount of parameters in the model.
    fn size(&self) -> usize;

    /// Makes a forward pass through the model.
    ///
    /// # Arguments
    /// * `params` - The model's parameters.
    /// * `x` - The input batch, one sample per row.
    ///
    /// # Returns
    /// The prediction for the given input or an error if the shapes don't match.
    fn forward<'a>(&'a mut self, params: &[f32], x: ArrayView2<'a, f32>)
    -> Result<ArrayView2<'a, f32>>;

    /// Computes the gradient of the loss function with respect to the parameters of the model over
    /// a single batch. `params` is left untouched, applying the gradient is up to the caller.
    ///
    /// # Arguments
    /// * `params` - The model's parameters.
    /// * `grad` - A buffer the computed gradient gets written on.
    /// * `loss_fn` - The loss function.
    /// * `x` - The input batch.
    /// * `y` - The expected output for `x`.
    ///
    /// # Returns
    /// The batch loss.
    fn backprop<L: LossFn>(
        &mut self,
        params: &[f32],
        grad: &mut [f32],
        loss_fn: &L,
        x: ArrayView2<f32>,
        y: ArrayView2<f32>,
    ) -> Result<f32>;
}
