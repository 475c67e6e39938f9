//! Test doubles for the classifier capability

use crate::models::handle::FraudModel;
use crate::models::onnx::lock_session;
use crate::types::features::{FeatureValue, FEATURE_NAMES};
use anyhow::{bail, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Model returning canned outputs and recording what it was called with.
pub struct StubModel {
    pub order: Vec<String>,
    pub label: i64,
    pub proba: Vec<f64>,
    pub fail_with: Option<String>,
    pub panic_on_predict: bool,
    pub calls: AtomicUsize,
    pub rows: Mutex<Vec<Vec<FeatureValue>>>,
}

impl StubModel {
    pub fn new(label: i64, proba: Vec<f64>) -> Self {
        Self {
            order: FEATURE_NAMES.iter().map(|n| n.to_string()).collect(),
            label,
            proba,
            fail_with: None,
            panic_on_predict: false,
            calls: AtomicUsize::new(0),
            rows: Mutex::new(Vec::new()),
        }
    }

    pub fn not_fraud() -> Self {
        Self::new(0, vec![0.92, 0.08])
    }

    pub fn fraud() -> Self {
        Self::new(1, vec![0.15, 0.85])
    }

    pub fn with_order(mut self, order: &[&str]) -> Self {
        self.order = order.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.fail_with = Some(message.to_string());
        self
    }

    pub fn panicking(mut self) -> Self {
        self.panic_on_predict = true;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self, row: &[FeatureValue]) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.rows.lock().unwrap().push(row.to_vec());
        if let Some(message) = &self.fail_with {
            bail!("{}", message);
        }
        Ok(())
    }
}

impl FraudModel for StubModel {
    fn feature_order(&self) -> &[String] {
        &self.order
    }

    fn predict(&self, row: &[FeatureValue]) -> Result<i64> {
        self.record(row)?;
        if self.panic_on_predict {
            panic!("stub model exploded");
        }
        Ok(self.label)
    }

    fn predict_proba(&self, row: &[FeatureValue]) -> Result<Vec<f64>> {
        self.record(row)?;
        Ok(self.proba.clone())
    }
}

/// Model guarding an exclusive session the way the ONNX model does, which
/// panics on its first run while the lock is held.
pub struct PanicOnceModel {
    pub order: Vec<String>,
    pub session: Mutex<usize>,
}

impl PanicOnceModel {
    pub fn new() -> Self {
        Self {
            order: FEATURE_NAMES.iter().map(|n| n.to_string()).collect(),
            session: Mutex::new(0),
        }
    }

    fn run(&self) -> usize {
        let mut runs = lock_session(&self.session);
        *runs += 1;
        if *runs == 1 {
            panic!("session crashed mid-run");
        }
        *runs
    }
}

impl FraudModel for PanicOnceModel {
    fn feature_order(&self) -> &[String] {
        &self.order
    }

    fn predict(&self, _row: &[FeatureValue]) -> Result<i64> {
        self.run();
        Ok(1)
    }

    fn predict_proba(&self, _row: &[FeatureValue]) -> Result<Vec<f64>> {
        self.run();
        Ok(vec![0.2, 0.8])
    }
}
