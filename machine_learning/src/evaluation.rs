use ndarray::ArrayView2;

use crate::{MlErr, Result, arch::Model};

/// The class a held-out sample is expected to belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    Positive,
    Negative,
}

/// Scores held-out samples with a trained model, without touching its parameters.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator {
    threshold: f32,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl Evaluator {
    /// Creates a new `Evaluator`.
    ///
    /// # Arguments
    /// * `threshold` - Scores at or above it are classified as positive.
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    /// Makes a forward pass over `x` and collects the score of every sample.
    ///
    /// # Returns
    /// The evaluation or an error if the shapes don't match or the model has more than one output.
    pub fn evaluate<M: Model>(
        &self,
        model: &mut M,
        params: &[f32],
        x: ArrayView2<f32>,
    ) -> Result<Evaluation> {
        let y_pred = model.forward(params, x)?;

        if y_pred.ncols() != 1 {
            return Err(MlErr::SizeMismatch {
                what: "model outputs",
                got: y_pred.ncols(),
                expected: 1,
            });
        }

        Ok(Evaluation {
            scores: y_pred.column(0).to_vec(),
            threshold: self.threshold,
        })
    }
}

/// The per-sample scores of a held-out set.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    scores: Vec<f32>,
    threshold: f32,
}

impl Evaluation {
    pub fn scores(&self) -> &[f32] {
        &self.scores
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Classifies every score against the threshold.
    pub fn predictions(&self) -> impl Iterator<Item = Class> + '_ {
        self.scores.iter().map(|&score| {
            if score >= self.threshold {
                Class::Positive
            } else {
                Class::Negative
            }
        })
    }

    /// Mean score over every sample, `0.0` when there are none.
    pub fn mean_score(&self) -> f32 {
        if self.scores.is_empty() {
            return 0.;
        }

        self.scores.iter().sum::<f32>() / self.scores.len() as f32
    }

    /// Amount of samples classified as `expected`.
    pub fn correct(&self, expected: Class) -> usize {
        self.predictions().filter(|&class| class == expected).count()
    }

    /// Proportion of samples classified as `expected`, `0.0` when there are none.
    pub fn accuracy(&self, expected: Class) -> f32 {
        if self.scores.is_empty() {
            return 0.;
        }

        self.correct(expected) as f32 / self.scores.len() as f32
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;
    use crate::arch::{Sequential, activations::ActFn, layers::Layer};

    #[test]
    fn scores_against_threshold() {
        // A single sigmoid unit with w = 1 and b = 0 scores σ(x).
        let mut model = Sequential::new([Layer::dense((1, 1), ActFn::sigmoid(1.))]);
        let params = [1., 0.];
        let x = array![[-3.], [0.], [3.], [-1.]];

        let evaluation = Evaluator::default()
            .evaluate(&mut model, &params, x.view())
            .unwrap();

        assert_eq!(evaluation.len(), 4);
        assert_eq!(evaluation.scores()[1], 0.5);
        assert_eq!(evaluation.correct(Class::Negative), 2);
        assert_eq!(evaluation.accuracy(Class::Positive), 0.5);
        assert!(evaluation.scores().iter().all(|s| (0. ..=1.).contains(s)));
    }

    #[test]
    fn empty_evaluation() {
        let mut model = Sequential::new([Layer::dense((2, 1), ActFn::sigmoid(1.))]);
        let x = ndarray::Array2::<f32>::zeros((0, 2));

        let evaluation = Evaluator::default()
            .evaluate(&mut model, &[0.; 3], x.view())
            .unwrap();

        assert!(evaluation.is_empty());
        assert_eq!(evaluation.mean_score(), 0.);
        assert_eq!(evaluation.accuracy(Class::Negative), 0.);
    }

    #[test]
    fn rejects_multi_output_models() {
        let mut model = Sequential::new([Layer::dense((1, 2), None)]);
        let x = array![[1.]];

        assert!(Evaluator::default()
            .evaluate(&mut model, &[0.; 4], x.view())
            .is_err());
    }
}
