//! Error types for the downtime classifier

use thiserror::Error;

/// Result type alias for classifier operations
pub type Result<T> = std::result::Result<T, ClassifierError>;

/// Main error type for data preparation, training and inference
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Preprocessing error: {0}")]
    PreprocessingError(String),

    #[error("Inference error: {0}")]
    InferenceError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Column not found: {0}")]
    FeatureNotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ClassifierError {
    /// Whether the error was caused by the caller's request rather than by
    /// the data or the fitted model.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ClassifierError::FeatureNotFound(_)
                | ClassifierError::ValidationError(_)
                | ClassifierError::InvalidInput(_)
        )
    }
}

impl From<polars::error::PolarsError> for ClassifierError {
    fn from(err: polars::error::PolarsError) -> Self {
        ClassifierError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for ClassifierError {
    fn from(err: serde_json::Error) -> Self {
        ClassifierError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for ClassifierError {
    fn from(err: ndarray::ShapeError) -> Self {
        ClassifierError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ClassifierError::FeatureNotFound("speed".to_string());
        assert_eq!(err.to_string(), "Column not found: speed");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ClassifierError = io_err.into();
        assert!(matches!(err, ClassifierError::IoError(_)));
    }

    #[test]
    fn test_client_error_classification() {
        assert!(ClassifierError::ValidationError("x".into()).is_client_error());
        assert!(!ClassifierError::ModelNotFitted.is_client_error());
        assert!(!ClassifierError::ShapeError {
            expected: "3 features".into(),
            actual: "2 features".into(),
        }
        .is_client_error());
    }
}
