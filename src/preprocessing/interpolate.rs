//! Polynomial interpolation of missing values along row order

use super::{column_values, is_numeric_dtype};
use crate::error::{ClassifierError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Fills interior gaps of numeric columns with a local polynomial.
///
/// Each missing value at row `i` is estimated from the `order + 1` known
/// rows nearest to `i` that bracket it, using the row index as the x axis.
/// Gaps before the first or after the last known value are left missing,
/// as are columns with fewer than `order + 1` known values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interpolator {
    order: usize,
}

impl Default for Interpolator {
    fn default() -> Self {
        Self::new(2)
    }
}

impl Interpolator {
    /// Create an interpolator of the given polynomial order (at least 1)
    pub fn new(order: usize) -> Self {
        Self { order: order.max(1) }
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Interpolate the given columns of `df`. Non-numeric columns are
    /// returned unchanged.
    pub fn transform(&self, df: &DataFrame, columns: &[String]) -> Result<DataFrame> {
        let mut result = df.clone();

        for name in columns {
            let column = df
                .column(name)
                .map_err(|_| ClassifierError::FeatureNotFound(name.clone()))?;
            if !is_numeric_dtype(column.dtype()) || column.null_count() == 0 {
                continue;
            }

            let filled = self.fill(&column_values(df, name)?);
            let series = Series::new(column.name().clone(), filled);
            result.with_column(series)?;
        }

        Ok(result)
    }

    /// Fill the interior gaps of a single column
    pub fn fill(&self, values: &[Option<f64>]) -> Vec<Option<f64>> {
        let known: Vec<usize> = values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|_| i))
            .collect();

        let mut out = values.to_vec();
        if known.len() < self.order + 1 {
            return out;
        }

        for (i, value) in values.iter().enumerate() {
            if value.is_some() {
                continue;
            }

            let right = known.partition_point(|&k| k < i);
            if right == 0 || right == known.len() {
                continue;
            }

            // Grow the bracketing window [lo, hi] towards the nearer side.
            let (mut lo, mut hi) = (right - 1, right);
            while hi - lo < self.order {
                let can_left = lo > 0;
                let can_right = hi + 1 < known.len();
                match (can_left, can_right) {
                    (true, true) => {
                        if i - known[lo - 1] <= known[hi + 1] - i {
                            lo -= 1;
                        } else {
                            hi += 1;
                        }
                    }
                    (true, false) => lo -= 1,
                    (false, true) => hi += 1,
                    (false, false) => break,
                }
            }

            let points: Vec<(f64, f64)> = known[lo..=hi]
                .iter()
                .filter_map(|&k| values[k].map(|y| (k as f64, y)))
                .collect();
            out[i] = Some(lagrange(&points, i as f64));
        }

        out
    }
}

fn lagrange(points: &[(f64, f64)], x: f64) -> f64 {
    points
        .iter()
        .enumerate()
        .map(|(j, &(xj, yj))| {
            let basis: f64 = points
                .iter()
                .enumerate()
                .filter(|(m, _)| *m != j)
                .map(|(_, &(xm, _))| (x - xm) / (xj - xm))
                .product();
            yj * basis
        })
        .sum()
}
