//! Mapping of pipeline failures to HTTP responses

use crate::error::{ErrorKind, PipelineError};
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    /// Request body did not match the transaction schema
    Validation(JsonRejection),

    /// Failure inside the inference pipeline
    Pipeline(PipelineError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(rejection) => rejection.status(),
            ApiError::Pipeline(err) => status_for(err.kind()),
        }
    }
}

/// Status code for each pipeline error kind.
///
/// Collaborator failures are server faults, not client errors.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::InvalidInput | ErrorKind::SchemaMismatch => StatusCode::BAD_REQUEST,
        ErrorKind::PredictionFailed => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (error, detail) = match &self {
            ApiError::Validation(rejection) => ("validation_error", rejection.body_text()),
            ApiError::Pipeline(err) => (err.kind().as_str(), err.to_string()),
        };

        let body = Json(json!({
            "error": error,
            "detail": detail,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection)
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        ApiError::Pipeline(err)
    }
}
