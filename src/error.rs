//! Error taxonomy for the inference request pipeline

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Result alias used by the transformer and the prediction invoker
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Coarse classification of a pipeline failure.
///
/// The HTTP adapter maps each kind to its own status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    SchemaMismatch,
    ServiceUnavailable,
    PredictionFailed,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::SchemaMismatch => "schema_mismatch",
            ErrorKind::ServiceUnavailable => "service_unavailable",
            ErrorKind::PredictionFailed => "prediction_failed",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure raised while turning a raw transaction into a prediction
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// Malformed timestamp or out-of-domain scalar
    #[error("invalid value for '{field}': {message}")]
    InvalidInput { field: String, message: String },

    /// The model expects a feature the transformer does not produce
    #[error("missing feature in processed data: '{field}'")]
    SchemaMismatch { field: String },

    /// No model instance is loaded
    #[error("model not loaded, check server logs")]
    ServiceUnavailable,

    /// The model collaborator failed during predict/predict_proba
    #[error("error processing prediction: {0}")]
    PredictionFailed(String),
}

impl PipelineError {
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        PipelineError::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn schema_mismatch(field: impl Into<String>) -> Self {
        PipelineError::SchemaMismatch {
            field: field.into(),
        }
    }

    /// Wrap a collaborator error, keeping the whole cause chain as text.
    pub fn prediction_failed(cause: anyhow::Error) -> Self {
        PipelineError::PredictionFailed(format!("{:#}", cause))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::InvalidInput { .. } => ErrorKind::InvalidInput,
            PipelineError::SchemaMismatch { .. } => ErrorKind::SchemaMismatch,
            PipelineError::ServiceUnavailable => ErrorKind::ServiceUnavailable,
            PipelineError::PredictionFailed(_) => ErrorKind::PredictionFailed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            PipelineError::invalid_input("amt", "must be non-negative").kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            PipelineError::schema_mismatch("zip").kind(),
            ErrorKind::SchemaMismatch
        );
        assert_eq!(
            PipelineError::ServiceUnavailable.kind(),
            ErrorKind::ServiceUnavailable
        );
    }

    #[test]
    fn test_prediction_failed_keeps_cause_chain() {
        let cause = anyhow::anyhow!("shape mismatch").context("session run failed");
        let err = PipelineError::prediction_failed(cause);

        assert_eq!(err.kind(), ErrorKind::PredictionFailed);
        assert_eq!(
            err.to_string(),
            "error processing prediction: session run failed: shape mismatch"
        );
    }

    #[test]
    fn test_messages_name_the_field() {
        let err = PipelineError::schema_mismatch("zip");
        assert!(err.to_string().contains("'zip'"));

        let err = PipelineError::invalid_input("trans_date_trans_time", "bad");
        assert!(err.to_string().contains("trans_date_trans_time"));
    }
}
