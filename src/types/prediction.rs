//! Typed prediction results

use serde::{Deserialize, Serialize};

/// Raw classifier label meaning fraud. Any other label is `not_fraud`.
pub const FRAUD_LABEL: i64 = 1;

/// Binary classification outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Fraud,
    NotFraud,
}

impl Label {
    /// Map a raw model label: `1` is fraud, anything else is not.
    pub fn from_raw(raw: i64) -> Self {
        if raw == FRAUD_LABEL {
            Label::Fraud
        } else {
            Label::NotFraud
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Fraud => "fraud",
            Label::NotFraud => "not_fraud",
        }
    }
}

/// Per-class probabilities, passed through from the model without renormalizing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassProbabilities {
    pub not_fraud: f64,
    pub fraud: f64,
}

impl ClassProbabilities {
    /// Build from the model's `[P(not_fraud), P(fraud)]` vector.
    ///
    /// The positional order is a contract with the trained classifier,
    /// whose class 0 is legitimate and class 1 is fraud.
    pub fn from_raw(raw: [f64; 2]) -> Self {
        Self {
            not_fraud: raw[0],
            fraud: raw[1],
        }
    }
}

/// Response body of a successful prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub prediction: Label,
    pub proba: ClassProbabilities,
}
