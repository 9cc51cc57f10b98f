//! Label encoding of target classes

use super::is_numeric_dtype;
use crate::error::{ClassifierError, Result};
use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A distinct value of the target column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassLabel {
    Number(f64),
    Text(String),
}

impl ClassLabel {
    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (ClassLabel::Number(a), ClassLabel::Number(b)) => a.total_cmp(b),
            (ClassLabel::Text(a), ClassLabel::Text(b)) => a.cmp(b),
            (ClassLabel::Number(_), ClassLabel::Text(_)) => Ordering::Less,
            (ClassLabel::Text(_), ClassLabel::Number(_)) => Ordering::Greater,
        }
    }
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassLabel::Number(v) => write!(f, "{}", v),
            ClassLabel::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Maps target labels to dense codes `0..K-1` in ascending label order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<ClassLabel>,
    is_fitted: bool,
}

impl LabelEncoder {
    /// Create an unfitted encoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn the sorted set of distinct labels in `series`
    pub fn fit(&mut self, series: &Series) -> Result<&mut Self> {
        let mut classes = Self::labels(series)?;
        classes.sort_by(|a, b| a.compare(b));
        classes.dedup();

        if classes.is_empty() {
            return Err(ClassifierError::ValidationError(format!(
                "target column '{}' has no values",
                series.name()
            )));
        }

        self.classes = classes;
        self.is_fitted = true;
        Ok(self)
    }

    /// Encode every label of `series`
    pub fn transform(&self, series: &Series) -> Result<Array1<f64>> {
        if !self.is_fitted {
            return Err(ClassifierError::ModelNotFitted);
        }

        Self::labels(series)?
            .iter()
            .map(|label| self.code_of(label).map(|c| c as f64))
            .collect()
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, series: &Series) -> Result<Array1<f64>> {
        self.fit(series)?;
        self.transform(series)
    }

    /// Decode codes back to their labels
    pub fn inverse_transform(&self, codes: &[f64]) -> Result<Vec<ClassLabel>> {
        if !self.is_fitted {
            return Err(ClassifierError::ModelNotFitted);
        }

        codes
            .iter()
            .map(|&code| {
                let idx = code.round();
                if idx < 0.0 || idx as usize >= self.classes.len() {
                    return Err(ClassifierError::InvalidInput(format!(
                        "class code {} out of range 0..{}",
                        code,
                        self.classes.len()
                    )));
                }
                Ok(self.classes[idx as usize].clone())
            })
            .collect()
    }

    pub fn classes(&self) -> &[ClassLabel] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    fn code_of(&self, label: &ClassLabel) -> Result<usize> {
        self.classes
            .binary_search_by(|c| c.compare(label))
            .map_err(|_| ClassifierError::InvalidInput(format!("unseen label: {}", label)))
    }

    fn labels(series: &Series) -> Result<Vec<ClassLabel>> {
        let null_count = series.null_count();
        if null_count > 0 {
            return Err(ClassifierError::DataError(format!(
                "target column '{}' contains {} missing values",
                series.name(),
                null_count
            )));
        }

        if is_numeric_dtype(series.dtype()) {
            let values = series.cast(&DataType::Float64)?;
            Ok(values
                .f64()?
                .into_no_null_iter()
                .map(ClassLabel::Number)
                .collect())
        } else {
            let values = series.cast(&DataType::String)?;
            Ok(values
                .str()?
                .into_no_null_iter()
                .map(|s| ClassLabel::Text(s.to_string()))
                .collect())
        }
    }
}
