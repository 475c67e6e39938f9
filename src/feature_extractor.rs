//! Feature extraction for fraud model inference.
//!
//! Turns a raw transaction into the flat feature record the classifier was
//! trained on, decomposing the combined timestamp into calendar components.

use crate::error::PipelineResult;
use crate::types::features::{FeatureRecord, FEATURE_NAMES};
use crate::types::transaction::RawTransaction;
use chrono::{Datelike, Timelike};

/// Feature extractor that transforms raw transactions into feature records.
///
/// Weekdays are numbered from Monday = 0, the convention the model was fit with.
pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Create a new feature extractor.
    pub fn new() -> Self {
        Self
    }

    /// Transform a raw transaction into a feature record.
    ///
    /// Fails with `InvalidInput` when the timestamp text is not ISO-8601.
    /// Structured timestamps are used as given.
    pub fn transform(&self, tx: &RawTransaction) -> PipelineResult<FeatureRecord> {
        let when = tx.timestamp.resolve()?;

        Ok(FeatureRecord {
            merchant: tx.merchant.clone(),
            category: tx.category.clone(),
            city: tx.city.clone(),
            state: tx.state.clone(),
            job: tx.job.clone(),
            amt: tx.amt,
            lat: tx.lat,
            long: tx.long,
            city_pop: tx.city_pop,
            trans_hour: when.hour(),
            trans_day: when.day(),
            trans_month: when.month(),
            trans_weekday: when.weekday().num_days_from_monday(),
        })
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        FEATURE_NAMES.len()
    }

    /// Get feature names in canonical order.
    pub fn feature_names(&self) -> &'static [&'static str] {
        &FEATURE_NAMES
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}
