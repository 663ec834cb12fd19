use crate::model_manager::ModelError;

/// Represents the different types of errors that can occur while training or
/// using the issue classifier.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    /// The training file is malformed at the given line
    #[error("Dataset error at line {line}: {message}")]
    DatasetError { line: u64, message: String },
    /// The pipeline could not be fitted
    #[error("Build error: {0}")]
    BuildError(String),
    /// The model produced an unusable result
    #[error("Prediction error: {0}")]
    PredictionError(String),
    /// Invalid input parameters
    #[error("Validation error: {0}")]
    ValidationError(String),
    /// The model artifact could not be saved or loaded
    #[error(transparent)]
    ModelError(#[from] ModelError),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("TSV error: {0}")]
    CsvError(#[from] csv::Error),
}
