//! Fraud Detection API Library
//!
//! Scores card transactions with a trained binary classifier: raw records are
//! validated, their timestamp decomposed into calendar features, the features
//! reordered to the model's trained layout, and the model output shaped into
//! a typed fraud / not-fraud response.

pub mod api;
pub mod config;
pub mod error;
pub mod feature_extractor;
pub mod metrics;
pub mod models;
pub mod types;

pub use config::AppConfig;
pub use error::{ErrorKind, PipelineError, PipelineResult};
pub use feature_extractor::FeatureExtractor;
pub use models::{handle::FraudModel, handle::ModelHandle, inference::InferenceEngine};
pub use types::{
    features::FeatureRecord, prediction::PredictionResult, transaction::RawTransaction,
};
