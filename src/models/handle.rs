//! Classifier capability and the shared handle that carries it

use crate::types::features::FeatureValue;
use anyhow::Result;
use std::fmt;
use std::sync::Arc;

/// A trained binary fraud classifier.
///
/// Implementations are loaded once and then only read, so they must be
/// shareable across request handlers.
pub trait FraudModel: Send + Sync {
    /// Feature names in the exact order the model was trained on
    fn feature_order(&self) -> &[String];

    /// Raw class label for a single row (`1` = fraud)
    fn predict(&self, row: &[FeatureValue]) -> Result<i64>;

    /// Class probabilities for a single row, indexed `[P(class 0), P(class 1)]`
    fn predict_proba(&self, row: &[FeatureValue]) -> Result<Vec<f64>>;

    /// Short human-readable description used in logs
    fn describe(&self) -> String {
        format!("{} features", self.feature_order().len())
    }
}

/// Process-wide handle to the loaded model, possibly absent.
///
/// Cloning is cheap; all clones share the same read-only model.
#[derive(Clone, Default)]
pub struct ModelHandle {
    model: Option<Arc<dyn FraudModel>>,
}

impl ModelHandle {
    /// Wrap a loaded model
    pub fn new<M: FraudModel + 'static>(model: M) -> Self {
        Self {
            model: Some(Arc::new(model)),
        }
    }

    /// Handle with no model behind it; every prediction fails fast
    pub fn absent() -> Self {
        Self { model: None }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn get(&self) -> Option<&dyn FraudModel> {
        self.model.as_deref()
    }
}

impl From<Arc<dyn FraudModel>> for ModelHandle {
    fn from(model: Arc<dyn FraudModel>) -> Self {
        Self { model: Some(model) }
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(model) => write!(f, "ModelHandle({})", model.describe()),
            None => f.write_str("ModelHandle(absent)"),
        }
    }
}
