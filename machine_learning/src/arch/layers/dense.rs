use ndarray::{linalg, prelude::*};

use crate::{MlErr, Result, arch::activations::ActFn};

/// A fully connected layer, `a = act_fn(x · W + b)`.
///
/// The layer does not own its parameters: they are borrowed from a flat slice laid out as
/// `[W (row-major, n x m) | b (m)]` on every pass. The matrices computed during the forward pass
/// are kept so that a following `backward` can reuse them.
#[derive(Clone)]
pub struct Dense {
    dim: (usize, usize),
    act_fn: Option<ActFn>,
    size: usize,

    // Forward metadata
    x: Array2<f32>,
    z: Array2<f32>,
    a: Array2<f32>,

    // Backward metadata
    d: Array2<f32>,
}

impl Dense {
    /// Creates a new `Dense` layer.
    ///
    /// # Arguments
    /// * `dim` - The `(input, output)` widths of the layer.
    /// * `act_fn` - The activation applied to the linear output, if any.
    pub fn new(dim: (usize, usize), act_fn: Option<ActFn>) -> Self {
        let zeros = Array2::zeros((0, 0));

        Self {
            dim,
            size: (dim.0 + 1) * dim.1,
            act_fn,
            x: zeros.clone(),
            z: zeros.clone(),
            a: zeros.clone(),
            d: zeros,
        }
    }

    /// Returns the size of this layer.
    ///
    /// # Returns
    /// The amount of parameters this layer has.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn dim(&self) -> (usize, usize) {
        self.dim
    }

    pub fn act_fn(&self) -> Option<&ActFn> {
        self.act_fn.as_ref()
    }

    /// Makes a forward pass through this layer.
    ///
    /// # Arguments
    /// * `params` - This layer's slice of parameters.
    /// * `x` - The input batch, one sample per row.
    ///
    /// # Returns
    /// A view of the layer's output or an error if the shapes don't match.
    pub fn forward(&mut self, params: &[f32], x: ArrayView2<f32>) -> Result<ArrayView2<'_, f32>> {
        if x.ncols() != self.dim.0 {
            return Err(MlErr::SizeMismatch {
                what: "dense layer input width",
                got: x.ncols(),
                expected: self.dim.0,
            });
        }

        let (w, b) = self.view_params(params)?;
        let shape = (x.nrows(), self.dim.1);

        if self.z.dim() != shape {
            self.z = Array2::zeros(shape);
        }

        linalg::general_mat_mul(1.0, &x, &w, 0.0, &mut self.z);
        self.z += &b;

        if self.x.dim() == x.dim() {
            self.x.assign(&x);
        } else {
            self.x = x.to_owned();
        }

        let Some(ref act_fn) = self.act_fn else {
            return Ok(self.z.view());
        };

        if self.a.dim() != shape {
            self.a = Array2::zeros(shape);
        }

        self.a.zip_mut_with(&self.z, |a, &z| *a = act_fn.f(z));
        Ok(self.a.view())
    }

    /// Makes a backward pass through this layer, writing its gradient.
    ///
    /// # Arguments
    /// * `params` - This layer's slice of parameters.
    /// * `grad` - This layer's slice of the gradient, it gets overwritten.
    /// * `d` - The derivative of the loss with respect to this layer's output.
    ///
    /// # Returns
    /// The derivative of the loss with respect to this layer's input.
    pub fn backward(
        &mut self,
        params: &[f32],
        grad: &mut [f32],
        mut d: ArrayViewMut2<f32>,
    ) -> Result<ArrayViewMut2<'_, f32>> {
        if d.dim() != self.z.dim() {
            return Err(MlErr::SizeMismatch {
                what: "dense layer delta rows",
                got: d.nrows(),
                expected: self.z.nrows(),
            });
        }

        if let Some(act_fn) = &self.act_fn {
            d.zip_mut_with(&self.z, |d, &z| *d *= act_fn.df(z));
        }

        let (mut dw, mut db) = self.view_grad(grad)?;
        linalg::general_mat_mul(1.0, &self.x.t(), &d, 0.0, &mut dw);
        db.assign(&d.sum_axis(Axis(0)));

        let (w, _) = self.view_params(params)?;
        let shape = (d.nrows(), self.dim.0);

        if self.d.dim() != shape {
            self.d = Array2::zeros(shape);
        }

        linalg::general_mat_mul(1.0, &d, &w.t(), 0.0, &mut self.d);
        Ok(self.d.view_mut())
    }

    /// Gives a view of the raw gradient slice as the delta weights and delta biases of this layer.
    ///
    /// # Arguments
    /// * `grad` - A gradient slice.
    ///
    /// # Returns
    /// A tuple containing the delta weights and delta biases.
    fn view_grad<'a>(
        &self,
        grad: &'a mut [f32],
    ) -> Result<(ArrayViewMut2<'a, f32>, ArrayViewMut1<'a, f32>)> {
        self.check_len("dense layer gradient", grad.len())?;

        let w_size = self.size - self.dim.1;
        let (dw_raw, db_raw) = grad.split_at_mut(w_size);
        let dw = ArrayViewMut2::from_shape(self.dim, dw_raw)?;
        let db = ArrayViewMut1::from_shape(self.dim.1, db_raw)?;
        Ok((dw, db))
    }

    /// Gives a view of the raw parameter slice as the weights and biases of this layer.
    ///
    /// # Arguments
    /// * `params` - A slice of parameters.
    ///
    /// # Returns
    /// A tuple containing the weights and biases.
    pub fn view_params<'a>(
        &self,
        params: &'a [f32],
    ) -> Result<(ArrayView2<'a, f32>, ArrayView1<'a, f32>)> {
        self.check_len("dense layer parameters", params.len())?;

        let w_size = self.size - self.dim.1;
        let (w_raw, b_raw) = params.split_at(w_size);
        let weights = ArrayView2::from_shape(self.dim, w_raw)?;
        let biases = ArrayView1::from_shape(self.dim.1, b_raw)?;
        Ok((weights, biases))
    }

    fn check_len(&self, what: &'static str, len: usize) -> Result<()> {
        if len != self.size {
            return Err(MlErr::SizeMismatch {
                what,
                got: len,
                expected: self.size,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_applies_weights_biases_and_activation() {
        // W = [[1, 2], [3, 4]], b = [-10, 0.5]
        let params = [1., 2., 3., 4., -10., 0.5];
        let mut dense = Dense::new((2, 2), Some(ActFn::relu()));
        let x = array![[1., 1.], [2., 0.]];

        let y = dense.forward(&params, x.view()).unwrap();

        assert_eq!(y, array![[0., 6.5], [0., 4.5]]);
    }

    #[test]
    fn backward_writes_gradient_and_input_delta() {
        let params = [1., 2., 3., 4., 0., 0.];
        let mut grad = [0.; 6];
        let mut dense = Dense::new((2, 2), None);
        let x = array![[1., 2.]];

        dense.forward(&params, x.view()).unwrap();
        let mut d = array![[1., -1.]];
        let dx = dense.backward(&params, &mut grad, d.view_mut()).unwrap();

        // dx = d · Wᵀ
        assert_eq!(dx, array![[-1., -1.]]);
        // dW = xᵀ · d, db = d
        assert_eq!(grad, [1., -1., 2., -2., 1., -1.]);
    }

    #[test]
    fn rejects_wrong_input_width() {
        let params = [0.; 6];
        let mut dense = Dense::new((2, 2), None);
        let x = Array2::<f32>::zeros((3, 5));

        let err = dense.forward(&params, x.view()).unwrap_err();

        assert!(matches!(err, MlErr::SizeMismatch { got: 5, expected: 2, .. }));
    }

    #[test]
    fn rejects_wrong_parameter_count() {
        let params = [0.; 5];
        let mut dense = Dense::new((2, 2), None);
        let x = Array2::<f32>::zeros((1, 2));

        assert!(dense.forward(&params, x.view()).is_err());
    }
}
