//! Raw transaction records as received from callers

use crate::error::{PipelineError, PipelineResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

/// Wire name of the combined transaction timestamp
pub const TIMESTAMP_FIELD: &str = "trans_date_trans_time";

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
];

/// Transaction timestamp, either still as ISO-8601 text or already parsed.
///
/// JSON bodies always produce `Text`; parsing is deferred to the feature
/// transformer so that a bad timestamp is reported as invalid input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TransactionTime {
    Text(String),
    Structured(NaiveDateTime),
}

impl TransactionTime {
    /// Resolve to calendar fields as given by the caller (no timezone conversion).
    pub fn resolve(&self) -> PipelineResult<NaiveDateTime> {
        match self {
            TransactionTime::Structured(dt) => Ok(*dt),
            TransactionTime::Text(text) => parse_iso_datetime(text),
        }
    }
}

impl From<NaiveDateTime> for TransactionTime {
    fn from(dt: NaiveDateTime) -> Self {
        TransactionTime::Structured(dt)
    }
}

impl From<&str> for TransactionTime {
    fn from(text: &str) -> Self {
        TransactionTime::Text(text.to_string())
    }
}

/// Parse an ISO-8601 date-time, keeping the local wall-clock fields.
///
/// Accepts `T` or space separators, optional seconds and fractions, a
/// date-only form (midnight), and an optional UTC offset or `Z` which is
/// ignored for calendar decomposition. Leap seconds are rejected.
pub fn parse_iso_datetime(text: &str) -> PipelineResult<NaiveDateTime> {
    parse_lenient(text)
        .filter(|dt| dt.nanosecond() < 1_000_000_000)
        .ok_or_else(|| {
            PipelineError::invalid_input(
                TIMESTAMP_FIELD,
                format!("invalid datetime format: '{}' is not an ISO-8601 date-time", text),
            )
        })
}

fn parse_lenient(text: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }

    // `Z` is shorthand for +00:00
    let offset_text = match text.strip_suffix(&['Z', 'z'][..]) {
        Some(rest) => format!("{}+00:00", rest),
        None => text.to_string(),
    };

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&offset_text, format) {
            return Some(dt.naive_local());
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// A card transaction to be scored.
///
/// Every field is required; a missing field is a schema error, never a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct RawTransaction {
    /// Merchant name
    pub merchant: String,

    /// Transaction category (e.g. groceries, gas_transport)
    pub category: String,

    /// Cardholder city
    pub city: String,

    /// Cardholder state
    pub state: String,

    /// Cardholder job
    pub job: String,

    /// Transaction amount
    #[validate(range(min = 0.0, message = "must be non-negative"))]
    pub amt: f64,

    /// Latitude of the cardholder location
    #[validate(range(min = -90.0, max = 90.0, message = "must be within [-90, 90]"))]
    pub lat: f64,

    /// Longitude of the cardholder location
    #[validate(range(min = -180.0, max = 180.0, message = "must be within [-180, 180]"))]
    pub long: f64,

    /// Population of the cardholder city
    pub city_pop: u64,

    /// Date and time of the transaction
    #[serde(rename = "trans_date_trans_time")]
    pub timestamp: TransactionTime,
}

impl RawTransaction {
    /// Check scalar domains, reporting the first offending field by name.
    pub fn check(&self) -> PipelineResult<()> {
        for (field, value) in [("amt", self.amt), ("lat", self.lat), ("long", self.long)] {
            if !value.is_finite() {
                return Err(PipelineError::invalid_input(field, "must be a finite number"));
            }
        }

        self.validate().map_err(first_violation)
    }
}

fn first_violation(errors: ValidationErrors) -> PipelineError {
    let field_errors = errors.field_errors();
    let mut fields: Vec<_> = field_errors.keys().cloned().collect();
    fields.sort();

    let Some(field) = fields.into_iter().next() else {
        return PipelineError::invalid_input("transaction", errors.to_string());
    };

    let message = field_errors
        .get(&field)
        .and_then(|errs| errs.first())
        .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "out of range".to_string());

    PipelineError::invalid_input(field.to_string(), message)
}
