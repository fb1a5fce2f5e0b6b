//! Statistical model integration.
//!
//! Two model roles feed the engine: an amount-based outlier detector
//! (heuristic mode) and a calibrated probability-of-fraud classifier
//! (hybrid mode). Both are optional at runtime; the scorer degrades to
//! rule-only behavior when neither is loaded.

pub mod features;
pub mod onnx;
pub mod scorer;

pub use features::{feature_vector, FEATURE_COUNT};
pub use onnx::{ModelLoader, OnnxModel};
pub use scorer::AnomalyScorer;

use anyhow::Result;

/// Verdict of the amount-outlier model
#[derive(Debug, Clone, Copy)]
pub struct OutlierVerdict {
    pub is_anomaly: bool,
    /// Decision-function margin; negative values lean anomalous
    pub margin: f64,
}

/// One-class outlier model over the claimed amount
pub trait OutlierModel: Send + Sync {
    fn score_amount(&self, amount: f64) -> Result<OutlierVerdict>;
}

/// Calibrated binary classifier over the fixed feature vector
pub trait FraudClassifier: Send + Sync {
    /// Probability of fraud in [0, 1]
    fn fraud_probability(&self, features: &[f32]) -> Result<f64>;

    /// Version tag reported in assessment metadata
    fn version(&self) -> &str;
}
