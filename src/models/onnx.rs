//! ONNX Runtime backed fraud classifier

use crate::models::handle::FraudModel;
use crate::types::features::FeatureValue;
use anyhow::{anyhow, bail, Context, Result};
use ort::memory::Allocator;
use ort::session::{Session, SessionOutputs};
use ort::tensor::TensorElementType;
use ort::value::{
    DowncastableTarget, DynMapValueType, DynSequenceValueType, DynValue, Tensor, ValueType,
};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Classifier exported as a per-column ONNX graph.
///
/// Each feature is a separate `[N, 1]` graph input named after its training
/// column, which makes the graph's input list the authoritative feature order.
pub struct OnnxModel {
    /// Model name
    name: String,
    /// ONNX Runtime session (running needs exclusive access)
    session: Mutex<Session>,
    /// Input names in declaration order
    feature_order: Vec<String>,
    /// Element type of each input, parallel to `feature_order`
    input_types: Vec<TensorElementType>,
    /// Output holding the predicted label
    label_output: String,
    /// Output holding class probabilities
    proba_output: String,
}

impl OnnxModel {
    /// Inspect a session's inputs and outputs and wrap it.
    pub fn from_session(name: &str, session: Session) -> Result<Self> {
        let mut feature_order = Vec::with_capacity(session.inputs.len());
        let mut input_types = Vec::with_capacity(session.inputs.len());

        for input in &session.inputs {
            let ty = match &input.input_type {
                ValueType::Tensor { ty, .. } => *ty,
                other => bail!("input '{}' is not a tensor: {:?}", input.name, other),
            };
            feature_order.push(input.name.clone());
            input_types.push(ty);
        }

        if feature_order.is_empty() {
            bail!("model '{}' declares no inputs", name);
        }
        if session.outputs.len() < 2 {
            bail!(
                "model '{}' must expose label and probability outputs, found {}",
                name,
                session.outputs.len()
            );
        }

        let label_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("label"))
            .or_else(|| session.outputs.first())
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "output_label".to_string());

        let proba_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .or_else(|| session.outputs.last())
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "output_probability".to_string());

        Ok(Self {
            name: name.to_string(),
            session: Mutex::new(session),
            feature_order,
            input_types,
            label_output,
            proba_output,
        })
    }

    /// Run the graph on one row and hand the outputs to `extract`.
    fn run<T>(
        &self,
        row: &[FeatureValue],
        extract: impl FnOnce(&SessionOutputs) -> Result<T>,
    ) -> Result<T> {
        if row.len() != self.feature_order.len() {
            bail!(
                "expected {} features, got {}",
                self.feature_order.len(),
                row.len()
            );
        }

        let inputs = self
            .feature_order
            .iter()
            .zip(&self.input_types)
            .zip(row)
            .map(|((name, ty), value)| Ok((name.clone(), column_tensor(name, *ty, value)?)))
            .collect::<Result<Vec<(String, DynValue)>>>()?;

        let mut session = lock_session(&self.session);

        let outputs = session
            .run(inputs)
            .with_context(|| format!("inference failed for model '{}'", self.name))?;

        extract(&outputs)
    }

    fn extract_label(&self, outputs: &SessionOutputs) -> Result<i64> {
        let output = outputs
            .get(self.label_output.as_str())
            .ok_or_else(|| anyhow!("missing output '{}'", self.label_output))?;

        let (_, data) = output.try_extract_tensor::<i64>()?;
        data.first()
            .copied()
            .ok_or_else(|| anyhow!("empty label output"))
    }

    /// Extract class probabilities.
    /// Handles both `[1, 2]` tensors and seq(map(int64, float)) outputs.
    fn extract_probabilities(&self, outputs: &SessionOutputs) -> Result<Vec<f64>> {
        let output = outputs
            .get(self.proba_output.as_str())
            .ok_or_else(|| anyhow!("missing output '{}'", self.proba_output))?;

        if let Ok((_, data)) = output.try_extract_tensor::<f32>() {
            debug!(model = %self.name, "Extracted probabilities from tensor");
            return Ok(data.iter().map(|&p| p as f64).collect());
        }

        let dtype = output.dtype();
        if DynSequenceValueType::can_downcast(&dtype) {
            return extract_from_sequence_map(output);
        }

        bail!("unsupported probability output type {:?}", dtype)
    }
}

impl FraudModel for OnnxModel {
    fn feature_order(&self) -> &[String] {
        &self.feature_order
    }

    fn predict(&self, row: &[FeatureValue]) -> Result<i64> {
        self.run(row, |outputs| self.extract_label(outputs))
    }

    fn predict_proba(&self, row: &[FeatureValue]) -> Result<Vec<f64>> {
        self.run(row, |outputs| self.extract_probabilities(outputs))
    }

    fn describe(&self) -> String {
        format!("{}: {} features", self.name, self.feature_order.len())
    }
}

/// Take the session lock, recovering it if an earlier run panicked.
///
/// A session holds no state between runs, so a poisoned lock is still usable.
pub(crate) fn lock_session<T>(session: &Mutex<T>) -> MutexGuard<'_, T> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Build a `[1, 1]` tensor for a single column, converted to the input's element type.
fn column_tensor(name: &str, ty: TensorElementType, value: &FeatureValue) -> Result<DynValue> {
    let shape = vec![1_i64, 1];

    let tensor = match ty {
        TensorElementType::String => {
            Tensor::<String>::from_string_array((shape, &[value.to_string()][..]))?.into_dyn()
        }
        TensorElementType::Float32 => {
            Tensor::from_array((shape, vec![numeric(name, value)? as f32]))?.into_dyn()
        }
        TensorElementType::Float64 => {
            Tensor::from_array((shape, vec![numeric(name, value)?]))?.into_dyn()
        }
        TensorElementType::Int64 => {
            Tensor::from_array((shape, vec![integer(name, value)?]))?.into_dyn()
        }
        TensorElementType::Int32 => {
            let v = i32::try_from(integer(name, value)?)
                .with_context(|| format!("feature '{}' does not fit in int32", name))?;
            Tensor::from_array((shape, vec![v]))?.into_dyn()
        }
        other => bail!("input '{}' has unsupported element type {:?}", name, other),
    };

    Ok(tensor)
}

fn numeric(name: &str, value: &FeatureValue) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| anyhow!("feature '{}' is text but the model expects a number", name))
}

fn integer(name: &str, value: &FeatureValue) -> Result<i64> {
    match value {
        FeatureValue::Integer(v) => Ok(*v),
        FeatureValue::Real(v) if v.fract() == 0.0 => Ok(*v as i64),
        other => bail!("feature '{}' value {} is not an integer", name, other),
    }
}

/// Extract `[P(0), P(1)]` from seq(map(int64, float)), as emitted by
/// sklearn pipelines with ZipMap.
fn extract_from_sequence_map(output: &DynValue) -> Result<Vec<f64>> {
    let allocator = Allocator::default();

    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(|e| anyhow!("Failed to downcast to sequence: {}", e))?;

    let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;
    let map_value = maps.first().ok_or_else(|| anyhow!("Empty sequence"))?;

    let kv_pairs = map_value.try_extract_key_values::<i64, f32>()?;

    let class_prob = |class: i64| {
        kv_pairs
            .iter()
            .find(|(class_id, _)| *class_id == class)
            .map(|(_, p)| *p as f64)
            .ok_or_else(|| anyhow!("No probability for class {} in map", class))
    };

    Ok(vec![class_prob(0)?, class_prob(1)?])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_conversion() {
        assert_eq!(integer("city_pop", &FeatureValue::Integer(116250)).unwrap(), 116250);
        assert_eq!(integer("amt", &FeatureValue::Real(120.0)).unwrap(), 120);
        assert!(integer("amt", &FeatureValue::Real(120.5)).is_err());
        assert!(integer("state", &FeatureValue::Text("IL".into())).is_err());
    }

    #[test]
    fn test_numeric_conversion() {
        assert_eq!(numeric("trans_hour", &FeatureValue::Integer(14)).unwrap(), 14.0);
        let err = numeric("merchant", &FeatureValue::Text("Walmart".into())).unwrap_err();
        assert!(err.to_string().contains("merchant"));
    }
}
