//! ONNX model loader

use crate::models::handle::{FraudModel, ModelHandle};
use crate::models::onnx::OnnxModel;
use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;
use tracing::{error, info};

/// Loader for ONNX models
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with default settings (1 thread)
    pub fn new() -> Result<Self> {
        Self::with_threads(1)
    }

    /// Create a new model loader with specified number of threads
    pub fn with_threads(onnx_threads: usize) -> Result<Self> {
        ort::init().commit()?;
        info!(onnx_threads = onnx_threads, "ONNX Runtime initialized");
        Ok(Self { onnx_threads })
    }

    /// Load a fraud classifier from an ONNX file
    pub fn load_model<P: AsRef<Path>>(&self, path: P) -> Result<OnnxModel> {
        let path = path.as_ref();

        if !path.exists() {
            anyhow::bail!("Model file not found: {}", path.display());
        }

        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("model");

        info!(model = %name, path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.onnx_threads)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model from {:?}", path))?;

        let model = OnnxModel::from_session(name, session)
            .with_context(|| format!("Unsupported model layout in {:?}", path))?;

        info!(
            model = %name,
            features = ?model.feature_order(),
            "Model loaded successfully"
        );

        Ok(model)
    }
}

/// Load the classifier, returning an absent handle instead of failing.
///
/// The service keeps running without a model and reports it through health.
pub fn load_model<P: AsRef<Path>>(path: P, onnx_threads: usize) -> ModelHandle {
    let path = path.as_ref();

    if !path.exists() {
        error!(path = %path.display(), "Model file not found");
        return ModelHandle::absent();
    }

    let loaded = ModelLoader::with_threads(onnx_threads).and_then(|loader| loader.load_model(path));

    match loaded {
        Ok(model) => ModelHandle::new(model),
        Err(e) => {
            error!(path = %path.display(), error = %format!("{:#}", e), "Error loading model");
            ModelHandle::absent()
        }
    }
}
