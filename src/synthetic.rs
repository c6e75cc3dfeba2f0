//! Toy data for a sanity-check run before touching real recordings.
//!
//! Positive samples are drawn from `U[0.25, 0.75)`. Negative ones from either `U[0, 0.25)` or
//! `U[0.75, 1)`, so the two classes never share a value.

use machine_learning::{Result, dataset::Dataset};
use ndarray::{Array1, Array2, ArrayView2, Axis, concatenate};
use ndarray_rand::RandomExt;
use rand::Rng;
use rand_distr::Uniform;

use crate::config::SyntheticConfig;

const POSITIVE_RANGE: (f32, f32) = (0.25, 0.75);
const LOW_NEGATIVE_RANGE: (f32, f32) = (0., 0.25);
const HIGH_NEGATIVE_RANGE: (f32, f32) = (0.75, 1.);

/// Draws `count` positive samples of width `width`.
pub fn positives<R: Rng + ?Sized>(rng: &mut R, count: usize, width: usize) -> Result<Array2<f32>> {
    uniform(rng, count, width, POSITIVE_RANGE)
}

/// Draws `low` negative samples below the positive range followed by `high` above it.
pub fn negatives<R: Rng + ?Sized>(
    rng: &mut R,
    low: usize,
    high: usize,
    width: usize,
) -> Result<Array2<f32>> {
    let low = uniform(rng, low, width, LOW_NEGATIVE_RANGE)?;
    let high = uniform(rng, high, width, HIGH_NEGATIVE_RANGE)?;
    Ok(concatenate(Axis(0), &[low.view(), high.view()])?)
}

fn uniform<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    width: usize,
    (low, high): (f32, f32),
) -> Result<Array2<f32>> {
    Ok(Array2::random_using((count, width), Uniform::new(low, high)?, rng))
}

/// Everything the synthetic run trains and evaluates on.
#[derive(Debug, Clone)]
pub struct SyntheticData {
    /// Half positives then half negatives (a quarter low, a quarter high).
    pub train: Dataset,
    pub test_positives: Array2<f32>,
    pub test_negatives: Array2<f32>,
}

impl SyntheticData {
    /// Generates the training set and both held-out sets.
    ///
    /// # Arguments
    /// * `config` - How many samples of each kind to draw.
    /// * `width` - The width of every sample.
    /// * `rng` - The generator to draw from.
    pub fn generate<R: Rng + ?Sized>(
        config: &SyntheticConfig,
        width: usize,
        rng: &mut R,
    ) -> Result<Self> {
        let half = config.sample_count / 2;
        let quarter = config.sample_count / 4;

        let train_positives = positives(rng, half, width)?;
        let train_negatives = negatives(rng, quarter, quarter, width)?;
        let train = Dataset::binary(train_positives.view(), train_negatives.view())?;

        let test_positives = positives(rng, config.test_positives, width)?;
        let test_negatives = negatives(
            rng,
            config.test_negatives_low,
            config.test_negatives_high,
            width,
        )?;

        Ok(Self {
            train,
            test_positives,
            test_negatives,
        })
    }

    /// Per-position mean of the positive and of the negative training samples.
    pub fn class_means(&self) -> (Array1<f32>, Array1<f32>) {
        let x = self.train.x();
        let y = self.train.y();

        let (positive, negative): (Vec<usize>, Vec<usize>) =
            (0..x.nrows()).partition(|&i| y[[i, 0]] >= 0.5);

        (row_mean(&x, &positive), row_mean(&x, &negative))
    }
}

fn row_mean(x: &ArrayView2<f32>, rows: &[usize]) -> Array1<f32> {
    x.select(Axis(0), rows)
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(x.ncols()))
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn config() -> SyntheticConfig {
        SyntheticConfig {
            sample_count: 40,
            test_positives: 6,
            test_negatives_low: 2,
            test_negatives_high: 3,
            iterations: 1,
        }
    }

    #[test]
    fn class_ranges_are_disjoint() {
        let mut rng = StdRng::seed_from_u64(100);
        let data = SyntheticData::generate(&config(), 30, &mut rng).unwrap();

        let x = data.train.x();
        let y = data.train.y();

        for (row, label) in x.rows().into_iter().zip(y.column(0)) {
            if *label == 1. {
                assert!(row.iter().all(|v| (0.25..0.75).contains(v)));
            } else {
                assert!(row.iter().all(|v| (0. ..0.25).contains(v) || (0.75..1.).contains(v)));
            }
        }
    }

    #[test]
    fn layout_follows_config() {
        let mut rng = StdRng::seed_from_u64(100);
        let data = SyntheticData::generate(&config(), 30, &mut rng).unwrap();

        assert_eq!(data.train.len(), 40);
        assert_eq!(data.train.width(), 30);
        assert_eq!(data.train.y().sum(), 20.);
        assert!(data.train.y().slice(ndarray::s![..20, 0]).iter().all(|&v| v == 1.));

        // Low negatives come first.
        let x = data.train.x();
        assert!(x.row(20).iter().all(|&v| v < 0.25));
        assert!(x.row(39).iter().all(|&v| v >= 0.75));

        assert_eq!(data.test_positives.dim(), (6, 30));
        assert_eq!(data.test_negatives.dim(), (5, 30));
        assert!(data.test_negatives.row(1).iter().all(|&v| v < 0.25));
        assert!(data.test_negatives.row(2).iter().all(|&v| v >= 0.75));
    }

    #[test]
    fn class_means() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut config = config();
        config.sample_count = 400;
        let data = SyntheticData::generate(&config, 20, &mut rng).unwrap();

        let (positive, negative) = data.class_means();

        assert_eq!(positive.len(), 20);
        assert!(positive.iter().all(|v| (0.4..0.6).contains(v)));
        assert!(negative.iter().all(|v| (0.35..0.65).contains(v)));
    }

    #[test]
    fn same_seed_same_data() {
        let a = SyntheticData::generate(&config(), 8, &mut StdRng::seed_from_u64(1)).unwrap();
        let b = SyntheticData::generate(&config(), 8, &mut StdRng::seed_from_u64(1)).unwrap();

        assert_eq!(a.train.x(), b.train.x());
        assert_eq!(a.test_negatives, b.test_negatives);
    }
}
