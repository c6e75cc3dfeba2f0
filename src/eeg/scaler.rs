use ndarray::{Array2, ArrayViewMut1};

/// Centers on the median and scales by the interquartile range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RobustScaler {
    /// Lower and upper percentile of the range, in `[0, 100]`.
    quantile_range: (f32, f32),
}

impl Default for RobustScaler {
    fn default() -> Self {
        Self {
            quantile_range: (25., 75.),
        }
    }
}

impl RobustScaler {
    /// Scales a single vector in place with its own median and spread.
    ///
    /// A spread of zero is replaced by one, so constant vectors are only centered.
    pub fn scale(&self, mut values: ArrayViewMut1<f32>) {
        let mut sorted = values.to_vec();
        if sorted.is_empty() {
            return;
        }
        sorted.sort_by(f32::total_cmp);

        let (low, high) = self.quantile_range;
        let center = percentile(&sorted, 50.);
        let spread = percentile(&sorted, high) - percentile(&sorted, low);
        let spread = if spread == 0. { 1. } else { spread };

        values.mapv_inplace(|v| (v - center) / spread);
    }

    /// Scales every row of `x` independently.
    pub fn scale_rows(&self, x: &mut Array2<f32>) {
        for row in x.rows_mut() {
            self.scale(row);
        }
    }
}

/// Percentile `q` of an ascending, non empty slice, linearly interpolated between the two
/// closest ranks.
pub fn percentile(sorted: &[f32], q: f32) -> f32 {
    let rank = (q / 100.).clamp(0., 1.) * (sorted.len() - 1) as f32;
    let below = rank.floor() as usize;
    let above = rank.ceil() as usize;

    sorted[below] + (sorted[above] - sorted[below]) * (rank - below as f32)
}
