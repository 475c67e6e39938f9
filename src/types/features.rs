//! Flat feature records produced by the feature transformer

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical feature layout, in the order the transformer emits it.
///
/// Models may expect a different order; see `models::inference`.
pub const FEATURE_NAMES: [&str; 13] = [
    "merchant",
    "category",
    "city",
    "state",
    "job",
    "amt",
    "lat",
    "long",
    "city_pop",
    "trans_hour",
    "trans_day",
    "trans_month",
    "trans_weekday",
];

/// A single scalar cell of a feature vector.
///
/// Categorical columns stay as text; encoding them is the model pipeline's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Text(String),
    Integer(i64),
    Real(f64),
}

impl FeatureValue {
    /// Numeric view of the value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FeatureValue::Integer(v) => Some(*v as f64),
            FeatureValue::Real(v) => Some(*v),
            FeatureValue::Text(_) => None,
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Text(v) => f.write_str(v),
            FeatureValue::Integer(v) => write!(f, "{}", v),
            FeatureValue::Real(v) => write!(f, "{}", v),
        }
    }
}

/// Transaction with its timestamp decomposed into calendar components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub merchant: String,
    pub category: String,
    pub city: String,
    pub state: String,
    pub job: String,
    pub amt: f64,
    pub lat: f64,
    pub long: f64,
    pub city_pop: u64,
    /// Hour of the transaction (0-23)
    pub trans_hour: u32,
    /// Day of the month (1-31)
    pub trans_day: u32,
    /// Month of the transaction (1-12)
    pub trans_month: u32,
    /// Day of the week (0 = Monday, 6 = Sunday)
    pub trans_weekday: u32,
}

impl FeatureRecord {
    /// Look up a feature by its trained column name.
    pub fn get(&self, name: &str) -> Option<FeatureValue> {
        let value = match name {
            "merchant" => FeatureValue::Text(self.merchant.clone()),
            "category" => FeatureValue::Text(self.category.clone()),
            "city" => FeatureValue::Text(self.city.clone()),
            "state" => FeatureValue::Text(self.state.clone()),
            "job" => FeatureValue::Text(self.job.clone()),
            "amt" => FeatureValue::Real(self.amt),
            "lat" => FeatureValue::Real(self.lat),
            "long" => FeatureValue::Real(self.long),
            "city_pop" => FeatureValue::Integer(self.city_pop as i64),
            "trans_hour" => FeatureValue::Integer(self.trans_hour.into()),
            "trans_day" => FeatureValue::Integer(self.trans_day.into()),
            "trans_month" => FeatureValue::Integer(self.trans_month.into()),
            "trans_weekday" => FeatureValue::Integer(self.trans_weekday.into()),
            _ => return None,
        };
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn test_every_canonical_name_resolves() {
        let record = record();
        for name in FEATURE_NAMES {
            assert!(record.get(name).is_some(), "missing {}", name);
        }
    }

    #[test]
    fn test_lookup_by_name() {
        let record = record();
        assert_eq!(record.get("merchant"), Some(FeatureValue::Text("Walmart".into())));
        assert_eq!(record.get("amt"), Some(FeatureValue::Real(120.0)));
        assert_eq!(record.get("trans_weekday"), Some(FeatureValue::Integer(3)));
        assert_eq!(record.get("trans_date_trans_time"), None);
        assert_eq!(record.get("is_fraud"), None);
    }

    #[test]
    fn test_numeric_view() {
        assert_eq!(FeatureValue::Integer(7).as_f64(), Some(7.0));
        assert_eq!(FeatureValue::Real(0.5).as_f64(), Some(0.5));
        assert_eq!(FeatureValue::Text("IL".into()).as_f64(), None);
    }
}
