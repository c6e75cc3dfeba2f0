use ndarray::{ArrayView2, ArrayViewMut2};

use super::Dense;
use crate::{Result, arch::activations::ActFn};

#[derive(Clone)]
pub enum Layer {
    Dense(Dense),
}
use Layer::*;

impl Layer {
    pub fn dense<A>(dim: (usize, usize), act_fn: A) -> Self
    where
        A: Into<Option<ActFn>>,
    {
        Self::Dense(Dense::new(dim, act_fn.into()))
    }

    /// Returns the amount of parameters this layer holds.
    pub fn size(&self) -> usize {
        match self {
            Dense(l) => l.size(),
        }
    }

    /// Returns the `(input, output)` widths of this layer.
    pub fn dim(&self) -> (usize, usize) {
        match self {
            Dense(l) => l.dim(),
        }
    }

    /// Returns a short textual description of this layer, e.g. `dense(226x500,celu)`.
    pub fn describe(&self) -> String {
        match self {
            Dense(l) => {
                let (n, m) = l.dim();
                let act = l.act_fn().map_or("linear", ActFn::name);
                format!("dense({n}x{m},{act})")
            }
        }
    }

    pub fn forward(&mut self, params: &[f32], x: ArrayView2<f32>) -> Result<ArrayView2<'_, f32>> {
        match self {
            Dense(l) => l.forward(params, x),
        }
    }

    pub fn backward(
        &mut self,
        params: &[f32],
        grad: &mut [f32],
        d: ArrayViewMut2<f32>,
    ) -> Result<ArrayViewMut2<'_, f32>> {
        match self {
            Dense(l) => l.backward(params, grad, d),
        }
    }
}
