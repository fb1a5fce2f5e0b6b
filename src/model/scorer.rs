//! Converts model output into score contributions.
//!
//! Heuristic mode contributes an amount-anomaly signal; hybrid mode yields
//! a calibrated probability that replaces the summed score entirely. Both
//! are best-effort: a missing or failing model degrades, never errors.

use super::{FraudClassifier, OutlierModel};
use crate::signals;
use crate::types::{ModelMetadata, Signal};
use std::sync::Arc;
use tracing::warn;

/// Hybrid classification outcome
#[derive(Debug, Clone)]
pub struct HybridScore {
    /// round(probability x 100)
    pub score: u32,
    pub metadata: ModelMetadata,
    /// Informational confidence signal for the reason trail
    pub confidence_signal: Signal,
}

#[derive(Default)]
pub struct AnomalyScorer {
    outlier: Option<Arc<dyn OutlierModel>>,
    classifier: Option<Arc<dyn FraudClassifier>>,
}

impl AnomalyScorer {
    pub fn new(
        outlier: Option<Arc<dyn OutlierModel>>,
        classifier: Option<Arc<dyn FraudClassifier>>,
    ) -> Self {
        Self { outlier, classifier }
    }

    pub fn rule_only() -> Self {
        Self::default()
    }

    pub fn has_classifier(&self) -> bool {
        self.classifier.is_some()
    }

    /// Heuristic contribution: an amount-anomaly signal when the outlier
    /// model flags the value. No model or a failing model means no signal.
    pub fn amount_signal(&self, amount: f64) -> Option<Signal> {
        let model = self.outlier.as_ref()?;
        match model.score_amount(amount) {
            Ok(verdict) if verdict.is_anomaly => Some(signals::AMOUNT_ANOMALY.signal(format!(
                "Invoice amount anomaly detected (margin {:.4})",
                verdict.margin
            ))),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "outlier model failed, skipping amount check");
                None
            }
        }
    }

    /// Hybrid contribution: the classifier's probability as a replacement
    /// score. `None` when no classifier is loaded or inference fails, in
    /// which case the caller keeps the summed score.
    pub fn classify(&self, features: &[f32]) -> Option<HybridScore> {
        let classifier = self.classifier.as_ref()?;
        let probability = match classifier.fraud_probability(features) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "classifier inference failed, keeping heuristic score");
                return None;
            }
        };

        let score = (probability * 100.0).round() as u32;
        let confidence = format!("{:.1}%", probability.max(1.0 - probability) * 100.0);

        Some(HybridScore {
            score,
            confidence_signal: signals::AI_CONFIDENCE
                .signal(format!("AI confidence: {confidence}")),
            metadata: ModelMetadata {
                used: true,
                confidence,
                version: classifier.version().to_string(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OutlierVerdict;
    use anyhow::Result;

    struct FixedOutlier(bool);

    impl OutlierModel for FixedOutlier {
        fn score_amount(&self, _amount: f64) -> Result<OutlierVerdict> {
            Ok(OutlierVerdict {
                is_anomaly: self.0,
                margin: if self.0 { -0.12 } else { 0.08 },
            })
        }
    }

    struct FailingOutlier;

    impl OutlierModel for FailingOutlier {
        fn score_amount(&self, _amount: f64) -> Result<OutlierVerdict> {
            anyhow::bail!("inference exploded")
        }
    }

    struct FixedClassifier(f64);

    impl FraudClassifier for FixedClassifier {
        fn fraud_probability(&self, _features: &[f32]) -> Result<f64> {
            Ok(self.0)
        }
        fn version(&self) -> &str {
            "v1.0-test"
        }
    }

    struct FailingClassifier;

    impl FraudClassifier for FailingClassifier {
        fn fraud_probability(&self, _features: &[f32]) -> Result<f64> {
            anyhow::bail!("inference exploded")
        }
        fn version(&self) -> &str {
            "v0-broken"
        }
    }

    #[test]
    fn no_model_means_no_anomaly_and_no_error() {
        let scorer = AnomalyScorer::rule_only();
        assert!(scorer.amount_signal(1_000_000.0).is_none());
        assert!(scorer.classify(&[0.0; 8]).is_none());
    }

    #[test]
    fn outlier_flag_becomes_weight_30_signal() {
        let scorer = AnomalyScorer::new(Some(Arc::new(FixedOutlier(true))), None);
        let signal = scorer.amount_signal(999_999.0).unwrap();
        assert_eq!(signal.name, "amount-anomaly");
        assert_eq!(signal.weight, 30);
    }

    #[test]
    fn inlier_amount_yields_no_signal() {
        let scorer = AnomalyScorer::new(Some(Arc::new(FixedOutlier(false))), None);
        assert!(scorer.amount_signal(100.0).is_none());
    }

    #[test]
    fn failing_outlier_model_degrades_silently() {
        let scorer = AnomalyScorer::new(Some(Arc::new(FailingOutlier)), None);
        assert!(scorer.amount_signal(100.0).is_none());
    }

    #[test]
    fn hybrid_probability_becomes_replacement_score() {
        let scorer = AnomalyScorer::new(None, Some(Arc::new(FixedClassifier(0.82))));
        let hybrid = scorer.classify(&[0.0; 8]).unwrap();
        assert_eq!(hybrid.score, 82);
        assert_eq!(hybrid.metadata.confidence, "82.0%");
        assert!(hybrid.confidence_signal.evidence.contains("82.0%"));
        assert_eq!(hybrid.confidence_signal.weight, 0);
    }

    #[test]
    fn low_probability_confidence_is_inverted() {
        let scorer = AnomalyScorer::new(None, Some(Arc::new(FixedClassifier(0.1))));
        let hybrid = scorer.classify(&[0.0; 8]).unwrap();
        assert_eq!(hybrid.score, 10);
        assert_eq!(hybrid.metadata.confidence, "90.0%");
    }

    #[test]
    fn failing_classifier_falls_back_to_heuristic() {
        let scorer = AnomalyScorer::new(None, Some(Arc::new(FailingClassifier)));
        assert!(scorer.classify(&[0.0; 8]).is_none());
    }
}
