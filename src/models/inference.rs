//! Prediction invoker for fraud detection

use crate::error::{PipelineError, PipelineResult};
use crate::feature_extractor::FeatureExtractor;
use crate::models::handle::ModelHandle;
use crate::types::features::{FeatureRecord, FeatureValue};
use crate::types::prediction::{ClassProbabilities, Label, PredictionResult};
use crate::types::transaction::RawTransaction;
use anyhow::anyhow;
use std::panic::{self, AssertUnwindSafe};
use tracing::debug;

/// Build the single-row feature vector in the model's declared order.
///
/// A name the record cannot supply is a schema mismatch between the
/// transformer and the trained model.
pub fn assemble_vector(
    feature_order: &[String],
    features: &FeatureRecord,
) -> PipelineResult<Vec<FeatureValue>> {
    feature_order
        .iter()
        .map(|name| {
            features
                .get(name)
                .ok_or_else(|| PipelineError::schema_mismatch(name.as_str()))
        })
        .collect()
}

/// Score one feature record against the loaded model.
///
/// `predict` and `predict_proba` both see the same assembled vector.
pub fn predict(model: &ModelHandle, features: &FeatureRecord) -> PipelineResult<PredictionResult> {
    let model = model.get().ok_or(PipelineError::ServiceUnavailable)?;

    let row = assemble_vector(model.feature_order(), features)?;

    let raw_label = invoke(|| model.predict(&row))?;
    let raw_proba = invoke(|| model.predict_proba(&row))?;

    let proba = match raw_proba.as_slice() {
        [not_fraud, fraud] => ClassProbabilities::from_raw([*not_fraud, *fraud]),
        other => {
            return Err(PipelineError::PredictionFailed(format!(
                "expected 2 class probabilities, got {}",
                other.len()
            )))
        }
    };

    let prediction = Label::from_raw(raw_label);

    debug!(
        raw_label = raw_label,
        prediction = prediction.as_str(),
        fraud_proba = proba.fraud,
        "Prediction complete"
    );

    Ok(PredictionResult { prediction, proba })
}

/// Run a collaborator call, folding both errors and panics into `PredictionFailed`.
fn invoke<T>(call: impl FnOnce() -> anyhow::Result<T>) -> PipelineResult<T> {
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(result) => result.map_err(PipelineError::prediction_failed),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(PipelineError::prediction_failed(anyhow!(
                "model panicked: {}",
                message
            )))
        }
    }
}

/// Full request pipeline: validate, transform, predict.
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    model: ModelHandle,
}

impl InferenceEngine {
    pub fn new(model: ModelHandle) -> Self {
        Self { model }
    }

    pub fn is_ready(&self) -> bool {
        self.model.is_loaded()
    }

    /// Score a raw transaction end to end.
    ///
    /// Model presence is checked before any validation or transformation.
    pub fn process(&self, tx: &RawTransaction) -> PipelineResult<PredictionResult> {
        if !self.model.is_loaded() {
            return Err(PipelineError::ServiceUnavailable);
        }

        tx.check()?;
        let features = FeatureExtractor::new().transform(tx)?;
        predict(&self.model, &features)
    }

    /// Names of the features the loaded model expects, if any
    pub fn feature_order(&self) -> Option<Vec<String>> {
        self.model.get().map(|m| m.feature_order().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::handle::FraudModel;
    use crate::models::testing::{PanicOnceModel, StubModel};
    use crate::types::transaction::TransactionTime;
    use std::sync::Arc;

    fn record() -> FeatureRecord {
        FeatureRecord {
            merchant: "Walmart".to_string(),
            category: "groceries".to_string(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            job: "Engineer".to_string(),
            amt: 120.0,
            lat: 39.7817,
            long: -89.6501,
            city_pop: 116250,
            trans_hour: 14,
            trans_day: 4,
            trans_month: 12,
            trans_weekday: 3,
        }
    }

    fn transaction() -> RawTransaction {
        RawTransaction {
            merchant: "Walmart".to_string(),
            category: "groceries".to_string(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            job: "Engineer".to_string(),
            amt: 120.0,
            lat: 39.7817,
            long: -89.6501,
            city_pop: 116250,
            timestamp: TransactionTime::Text("2025-12-04T14:30:00".to_string()),
        }
    }

    fn shared(stub: StubModel) -> (Arc<StubModel>, ModelHandle) {
        let stub = Arc::new(stub);
        let handle = ModelHandle::from(stub.clone() as Arc<dyn FraudModel>);
        (stub, handle)
    }

    #[test]
    fn test_not_fraud_prediction() {
        let handle = ModelHandle::new(StubModel::not_fraud());
        let result = predict(&handle, &record()).unwrap();

        assert_eq!(result.prediction, Label::NotFraud);
        assert_eq!(result.proba.not_fraud, 0.92);
        assert_eq!(result.proba.fraud, 0.08);
    }

    #[test]
    fn test_fraud_prediction() {
        let handle = ModelHandle::new(StubModel::fraud());
        let result = predict(&handle, &record()).unwrap();

        assert_eq!(result.prediction, Label::Fraud);
        assert!(result.proba.fraud > result.proba.not_fraud);
    }

    #[test]
    fn test_label_is_not_inferred_from_probabilities() {
        // Label 1 wins even when the probabilities favour class 0
        let handle = ModelHandle::new(StubModel::new(1, vec![0.7, 0.3]));
        let result = predict(&handle, &record()).unwrap();

        assert_eq!(result.prediction, Label::Fraud);
        assert_eq!(result.proba.not_fraud, 0.7);
    }

    #[test]
    fn test_probabilities_pass_through_unnormalized() {
        let handle = ModelHandle::new(StubModel::new(0, vec![0.5, 0.25]));
        let result = predict(&handle, &record()).unwrap();

        assert_eq!(result.proba.not_fraud + result.proba.fraud, 0.75);
    }

    #[test]
    fn test_deterministic() {
        let handle = ModelHandle::new(StubModel::fraud());
        let first = predict(&handle, &record()).unwrap();
        for _ in 0..5 {
            assert_eq!(predict(&handle, &record()).unwrap(), first);
        }
    }

    #[test]
    fn test_absent_model() {
        let err = predict(&ModelHandle::absent(), &record()).unwrap_err();
        assert_eq!(err, PipelineError::ServiceUnavailable);
    }

    #[test]
    fn test_vector_follows_model_order() {
        let (stub, handle) =
            shared(StubModel::not_fraud().with_order(&["trans_weekday", "amt", "merchant"]));

        predict(&handle, &record()).unwrap();

        let rows = stub.rows.lock().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            vec![
                FeatureValue::Integer(3),
                FeatureValue::Real(120.0),
                FeatureValue::Text("Walmart".to_string()),
            ]
        );
        // predict and predict_proba saw the same row
        assert_eq!(rows[0], rows[1]);
    }

    #[test]
    fn test_schema_mismatch_skips_model() {
        let (stub, handle) = shared(StubModel::not_fraud().with_order(&["amt", "zip", "lat"]));

        let err = predict(&handle, &record()).unwrap_err();

        assert_eq!(err, PipelineError::schema_mismatch("zip"));
        assert_eq!(stub.call_count(), 0);
    }

    #[test]
    fn test_collaborator_error() {
        let handle = ModelHandle::new(StubModel::not_fraud().failing("shape mismatch"));
        let err = predict(&handle, &record()).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::PredictionFailed);
        assert!(err.to_string().contains("shape mismatch"));
    }

    #[test]
    fn test_collaborator_panic() {
        let handle = ModelHandle::new(StubModel::not_fraud().panicking());
        let err = predict(&handle, &record()).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::PredictionFailed);
        assert!(err.to_string().contains("stub model exploded"));
    }

    #[test]
    fn test_model_recovers_after_panic() {
        let handle = ModelHandle::new(PanicOnceModel::new());

        let err = predict(&handle, &record()).unwrap_err();
        assert!(err.to_string().contains("session crashed mid-run"));

        let result = predict(&handle, &record()).unwrap();
        assert_eq!(result.prediction, Label::Fraud);
        assert_eq!(result.proba.fraud, 0.8);
    }

    #[test]
    fn test_wrong_probability_shape() {
        let handle = ModelHandle::new(StubModel::new(0, vec![1.0]));
        let err = predict(&handle, &record()).unwrap_err();

        assert_eq!(
            err,
            PipelineError::PredictionFailed("expected 2 class probabilities, got 1".to_string())
        );
    }

    #[test]
    fn test_engine_end_to_end() {
        let engine = InferenceEngine::new(ModelHandle::new(StubModel::not_fraud()));
        let result = engine.process(&transaction()).unwrap();

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            serde_json::json!({
                "prediction": "not_fraud",
                "proba": {"not_fraud": 0.92, "fraud": 0.08}
            })
        );
    }

    #[test]
    fn test_engine_without_model_does_no_work() {
        let engine = InferenceEngine::new(ModelHandle::absent());
        let mut tx = transaction();
        tx.timestamp = TransactionTime::Text("garbage".to_string());

        assert!(!engine.is_ready());
        assert_eq!(engine.process(&tx).unwrap_err(), PipelineError::ServiceUnavailable);
        assert_eq!(engine.feature_order(), None);
    }

    #[test]
    fn test_engine_rejects_bad_input_before_model() {
        let (stub, handle) = shared(StubModel::not_fraud());
        let engine = InferenceEngine::new(handle);

        let mut tx = transaction();
        tx.timestamp = TransactionTime::Text("yesterday".to_string());
        assert_eq!(engine.process(&tx).unwrap_err().kind(), ErrorKind::InvalidInput);

        let mut tx = transaction();
        tx.amt = -3.0;
        assert_eq!(engine.process(&tx).unwrap_err().kind(), ErrorKind::InvalidInput);

        assert_eq!(stub.call_count(), 0);
    }
}
