use ndarray::{Array2, ArrayView2, Axis, concatenate};

use crate::{MlErr, Result};

/// An in-memory labeled dataset: one sample per row of `x` and its expected output in the same
/// row of `y`.
#[derive(Debug, Clone)]
pub struct Dataset {
    x: Array2<f32>,
    y: Array2<f32>,
}

impl Dataset {
    /// Creates a new `Dataset`.
    ///
    /// # Returns
    /// An error if `x` and `y` don't have the same amount of rows.
    pub fn new(x: Array2<f32>, y: Array2<f32>) -> Result<Self> {
        if x.nrows() != y.nrows() {
            return Err(MlErr::SizeMismatch {
                what: "dataset labels",
                got: y.nrows(),
                expected: x.nrows(),
            });
        }

        Ok(Self { x, y })
    }

    /// Builds a binary dataset: every row of `positives` labeled `1.0` followed by every row of
    /// `negatives` labeled `0.0`.
    pub fn binary(positives: ArrayView2<f32>, negatives: ArrayView2<f32>) -> Result<Self> {
        if positives.ncols() != negatives.ncols() {
            return Err(MlErr::SizeMismatch {
                what: "negative sample width",
                got: negatives.ncols(),
                expected: positives.ncols(),
            });
        }

        let x = concatenate(Axis(0), &[positives, negatives])?;
        let y = concatenate(
            Axis(0),
            &[
                Array2::ones((positives.nrows(), 1)).view(),
                Array2::zeros((negatives.nrows(), 1)).view(),
            ],
        )?;

        Self::new(x, y)
    }

    pub fn x(&self) -> ArrayView2<'_, f32> {
        self.x.view()
    }

    pub fn y(&self) -> ArrayView2<'_, f32> {
        self.y.view()
    }

    /// Returns the amount of samples.
    pub fn len(&self) -> usize {
        self.x.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.x.nrows() == 0
    }

    /// Returns the width of every sample.
    pub fn width(&self) -> usize {
        self.x.ncols()
    }
}
