//! Type definitions for the fraud detection API

pub mod features;
pub mod prediction;
pub mod transaction;

pub use features::{FeatureRecord, FeatureValue, FEATURE_NAMES};
pub use prediction::{ClassProbabilities, Label, PredictionResult};
pub use transaction::{RawTransaction, TransactionTime};
