use rand::Rng;
use rand_distr::{Distribution, Uniform};

use crate::Result;

/// How a layer's parameters are drawn when a model is first built.
#[derive(Debug, Clone, Copy)]
pub enum ParamInit {
    /// Parameters are drawn from `U[low, high)`.
    Uniform { low: f32, high: f32 },
    /// Parameters are drawn from `U(-1/√fan_in, 1/√fan_in)`, weights and biases alike.
    FanInUniform,
}

impl ParamInit {
    /// Appends `n` freshly drawn parameters for a layer with `fan_in` inputs to `out`.
    ///
    /// # Returns
    /// An error if the resulting distribution range is invalid (low >= high).
    pub fn extend<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        fan_in: usize,
        n: usize,
        out: &mut Vec<f32>,
    ) -> Result<()> {
        let distribution = match *self {
            ParamInit::Uniform { low, high } => Uniform::new(low, high)?,
            ParamInit::FanInUniform => {
                let bound = 1. / (fan_in.max(1) as f32).sqrt();
                Uniform::new(-bound, bound)?
            }
        };

        out.extend((0..n).map(|_| distribution.sample(rng)));
        Ok(())
    }
}
