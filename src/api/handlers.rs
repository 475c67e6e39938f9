//! HTTP handlers

use crate::api::error::{ApiError, ApiResult};
use crate::api::AppState;
use crate::error::ErrorKind;
use crate::metrics::MetricsSnapshot;
use crate::types::prediction::PredictionResult;
use crate::types::transaction::RawTransaction;
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Instant;
use tracing::{debug, error, warn};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
}

/// Static service metadata
pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "Fraud Detection API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Credit card fraud detection using machine learning",
        "endpoints": {
            "health": "/api/health",
            "predict": "/api/predict",
            "metrics": "/api/metrics"
        }
    }))
}

/// Liveness plus model availability
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        model_loaded: state.engine.is_ready(),
    })
}

/// Score a single transaction
pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<RawTransaction>, JsonRejection>,
) -> ApiResult<Json<PredictionResult>> {
    let start = Instant::now();

    let Json(tx) = payload.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "Rejected transaction payload");
        ApiError::from(rejection)
    })?;

    match state.engine.process(&tx) {
        Ok(result) => {
            let latency = start.elapsed();
            state.metrics.record_prediction(latency, &result);
            debug!(
                merchant = %tx.merchant,
                prediction = result.prediction.as_str(),
                fraud_proba = result.proba.fraud,
                latency_us = latency.as_micros() as u64,
                "Transaction scored"
            );
            Ok(Json(result))
        }
        Err(err) => {
            state.metrics.record_failure(err.kind(), start.elapsed());
            match err.kind() {
                ErrorKind::PredictionFailed | ErrorKind::ServiceUnavailable => {
                    error!(kind = %err.kind(), error = %err, "Prediction failed")
                }
                ErrorKind::InvalidInput | ErrorKind::SchemaMismatch => {
                    warn!(kind = %err.kind(), error = %err, "Prediction rejected")
                }
            }
            Err(err.into())
        }
    }
}

/// Service metrics snapshot
pub async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}
