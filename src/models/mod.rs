//! Fraud classifier capability and prediction invoker

pub mod handle;
pub mod inference;
pub mod loader;
pub mod onnx;

#[cfg(test)]
pub(crate) mod testing;

pub use handle::{FraudModel, ModelHandle};
pub use inference::{predict, InferenceEngine};
pub use loader::{load_model, ModelLoader};
pub use onnx::OnnxModel;
