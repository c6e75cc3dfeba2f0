use std::ops::Range;

use machine_learning::dataset::Dataset;
use ndarray::{Array2, ArrayView2, Axis, s};

use super::{EegErr, Result};
use crate::config::SplitConfig;

/// The real-data samples split into training and held-out sets.
#[derive(Debug, Clone)]
pub struct EegSplits {
    /// Positive training rows labeled `1.0` followed by negative ones labeled `0.0`.
    ///
    /// Only the positive rows are labeled `1.0`, never a fixed-size prefix of the batch.
    pub train: Dataset,
    pub positive_test: Array2<f32>,
    pub negative_test: Array2<f32>,
    /// Every negative sample used neither for training nor for testing.
    pub negative_rest: Array2<f32>,
}

impl EegSplits {
    /// Splits the samples of both classes, one sample per row.
    ///
    /// # Returns
    /// The splits, or `EegErr::NotEnoughEpochs` if a range goes past the end of its class.
    pub fn new(
        positives: ArrayView2<f32>,
        negatives: ArrayView2<f32>,
        splits: &SplitConfig,
    ) -> Result<Self> {
        let positive_train = rows(positives, &splits.positive_train, "positive training split")?;
        let positive_test = rows(positives, &splits.positive_test, "positive test split")?;
        let negative_train = rows(negatives, &splits.negative_train, "negative training split")?;
        let negative_test = rows(negatives, &splits.negative_test, "negative test split")?;

        let rest: Vec<usize> = (0..negatives.nrows())
            .filter(|i| !splits.negative_train.contains(i) && !splits.negative_test.contains(i))
            .collect();

        Ok(Self {
            train: Dataset::binary(positive_train, negative_train)?,
            positive_test: positive_test.to_owned(),
            negative_test: negative_test.to_owned(),
            negative_rest: negatives.select(Axis(0), &rest),
        })
    }
}

fn rows<'a>(
    x: ArrayView2<'a, f32>,
    range: &Range<usize>,
    what: &'static str,
) -> Result<ArrayView2<'a, f32>> {
    if range.end > x.nrows() || range.start > range.end {
        return Err(EegErr::NotEnoughEpochs {
            what,
            needed: range.end,
            available: x.nrows(),
        });
    }

    Ok(x.slice_move(s![range.clone(), ..]))
}
