//! Data preprocessing module
//!
//! Provides the preprocessing steps used before fitting a classifier:
//! - Missing value reporting
//! - Polynomial interpolation of gaps along row order
//! - Feature scaling (standardization)
//! - Label encoding of the target column

mod encoder;
mod interpolate;
mod scaler;

pub use encoder::{ClassLabel, LabelEncoder};
pub use interpolate::Interpolator;
pub use scaler::StandardScaler;

use crate::error::{ClassifierError, Result};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Whether a column dtype can be fed into numeric fitting
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Boolean
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Read a numeric column as nullable f64 values.
pub fn column_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .map_err(|_| ClassifierError::FeatureNotFound(name.to_string()))?;

    if !is_numeric_dtype(column.dtype()) {
        return Err(ClassifierError::DataError(format!(
            "column '{}' has non-numeric dtype {}",
            name,
            column.dtype()
        )));
    }

    let series = column.as_materialized_series().cast(&DataType::Float64)?;
    Ok(series
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect())
}

/// Replace NaN cells of float columns with nulls so they count as missing.
pub fn nan_to_null(df: &DataFrame) -> Result<DataFrame> {
    let mut out = df.clone();

    for column in df.get_columns() {
        if !matches!(column.dtype(), DataType::Float32 | DataType::Float64) {
            continue;
        }
        let series = column.as_materialized_series().cast(&DataType::Float64)?;
        let values = series.f64()?;
        if !values.into_iter().any(|v| v.is_some_and(f64::is_nan)) {
            continue;
        }

        let cleaned: Vec<Option<f64>> = values
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()))
            .collect();
        out.with_column(Series::new(column.name().clone(), cleaned))?;
    }

    Ok(out)
}

/// Extract named columns into a row-major `Array2<f64>`.
///
/// Every value must be present; missing values left after interpolation
/// are reported as a data error naming the column.
pub fn frame_to_matrix(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();

    let col_data: Vec<Vec<f64>> = col_names
        .iter()
        .map(|name| {
            let values = column_values(df, name)?;
            let missing = values.iter().filter(|v| v.is_none()).count();
            if missing > 0 {
                return Err(ClassifierError::DataError(format!(
                    "column '{}' still has {} missing values after interpolation",
                    name, missing
                )));
            }
            Ok(values.into_iter().flatten().collect())
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    Ok(Array2::from_shape_fn((n_rows, col_names.len()), |(r, c)| col_data[c][r]))
}

/// Missing value count for one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMissing {
    pub name: String,
    pub missing: usize,
    /// Percentage of the full dataset height
    pub percent: f64,
}

/// Per-column missing value summary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MissingValueReport {
    pub columns: Vec<ColumnMissing>,
}

impl MissingValueReport {
    /// Count nulls in each column of `df`, relative to `total_rows`.
    pub fn from_frame(df: &DataFrame, total_rows: usize) -> Self {
        let columns = df
            .get_columns()
            .iter()
            .map(|col| {
                let missing = col.null_count();
                let percent = if total_rows > 0 {
                    missing as f64 / total_rows as f64 * 100.0
                } else {
                    0.0
                };
                ColumnMissing {
                    name: col.name().to_string(),
                    missing,
                    percent,
                }
            })
            .collect();

        Self { columns }
    }

    pub fn total_missing(&self) -> usize {
        self.columns.iter().map(|c| c.missing).sum()
    }

    pub fn get(&self, name: &str) -> Option<&ColumnMissing> {
        self.columns.iter().find(|c| c.name == name)
    }
}
