//! Risk assessment output types: signals, verdicts, and the assembled result

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single named, weighted piece of fraud evidence.
///
/// Signals are additive and independent. The same name may appear more than
/// once in a trail and each occurrence still contributes its weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    pub name: String,
    pub weight: u32,
    /// Human-readable reason string shown to reviewers
    pub evidence: String,
}

impl Signal {
    pub fn new(name: impl Into<String>, weight: u32, evidence: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            weight,
            evidence: evidence.into(),
        }
    }
}

/// Categorical outcome of an assessment.
///
/// `Green`/`Red` belong to the binary profile, `Safe`/`Review`/`Flagged` to
/// the tri-level profile. `Unscoreable` is the terminal outcome for a
/// document the engine could not read at all; its score of 0 means
/// "no evidence either way", never "safe".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Green,
    Red,
    Safe,
    Review,
    Flagged,
    Unscoreable,
}

/// Threshold profile mapping a clamped score to a verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "profile", rename_all = "lowercase")]
pub enum VerdictProfile {
    /// Single cut: score >= red_threshold is RED, else GREEN
    Binary { red_threshold: u32 },
    /// Two cuts: >= flagged_threshold is FLAGGED, >= review_threshold is
    /// REVIEW, else SAFE
    TriLevel {
        review_threshold: u32,
        flagged_threshold: u32,
    },
}

impl VerdictProfile {
    pub fn binary() -> Self {
        Self::Binary { red_threshold: 50 }
    }

    pub fn tri_level() -> Self {
        Self::TriLevel {
            review_threshold: 30,
            flagged_threshold: 60,
        }
    }

    /// Map a clamped score to its verdict under this profile.
    pub fn classify(&self, score: u32) -> Verdict {
        match *self {
            VerdictProfile::Binary { red_threshold } => {
                if score >= red_threshold {
                    Verdict::Red
                } else {
                    Verdict::Green
                }
            }
            VerdictProfile::TriLevel {
                review_threshold,
                flagged_threshold,
            } => {
                if score >= flagged_threshold {
                    Verdict::Flagged
                } else if score >= review_threshold {
                    Verdict::Review
                } else {
                    Verdict::Safe
                }
            }
        }
    }
}

impl Default for VerdictProfile {
    fn default() -> Self {
        Self::tri_level()
    }
}

/// How signal weights combine into the composite score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "law", rename_all = "snake_case")]
pub enum ScoringLaw {
    /// Every signal contributes its own weight
    WeightedSum,
    /// Textual signals contribute a flat per-signal base capped at 100;
    /// visual, duplicate-image, location and anomaly penalties add on top
    PerSignalBase { per_signal: u32 },
}

impl Default for ScoringLaw {
    fn default() -> Self {
        Self::WeightedSum
    }
}

/// Metadata about the classifier when hybrid scoring replaced the sum
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub used: bool,
    /// Calibrated confidence, e.g. "82.0%"
    pub confidence: String,
    pub version: String,
}

/// Final assessment for one submission. Constructed once per request and
/// owned by the caller; never mutated after return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub assessment_id: String,
    pub claim_id: String,
    /// Composite fraud score, clamped to [0, 100]
    pub score: u32,
    pub verdict: Verdict,
    /// Ordered reason trail, detector order preserved
    pub signals: Vec<Signal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelMetadata>,
    pub timestamp: DateTime<Utc>,
}

impl RiskAssessment {
    pub fn new(claim_id: impl Into<String>, score: u32, verdict: Verdict, signals: Vec<Signal>) -> Self {
        Self {
            assessment_id: uuid::Uuid::new_v4().to_string(),
            claim_id: claim_id.into(),
            score,
            verdict,
            signals,
            model: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_model(mut self, model: ModelMetadata) -> Self {
        self.model = Some(model);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_profile_thresholds() {
        let profile = VerdictProfile::binary();
        assert_eq!(profile.classify(49), Verdict::Green);
        assert_eq!(profile.classify(50), Verdict::Red);
        assert_eq!(profile.classify(100), Verdict::Red);
    }

    #[test]
    fn tri_level_profile_thresholds() {
        let profile = VerdictProfile::tri_level();
        assert_eq!(profile.classify(0), Verdict::Safe);
        assert_eq!(profile.classify(29), Verdict::Safe);
        assert_eq!(profile.classify(30), Verdict::Review);
        assert_eq!(profile.classify(59), Verdict::Review);
        assert_eq!(profile.classify(60), Verdict::Flagged);
    }

    #[test]
    fn assessment_serialization_round_trip() {
        let assessment = RiskAssessment::new(
            "INV-42",
            75,
            Verdict::Flagged,
            vec![Signal::new("vendor-redlisted", 100, "Vendor 'X' is redlisted")],
        );

        let json = serde_json::to_string(&assessment).unwrap();
        let back: RiskAssessment = serde_json::from_str(&json).unwrap();

        assert_eq!(back.claim_id, "INV-42");
        assert_eq!(back.score, 75);
        assert_eq!(back.verdict, Verdict::Flagged);
        assert_eq!(back.signals.len(), 1);
        assert!(back.model.is_none());
    }

    #[test]
    fn duplicate_signal_names_are_kept() {
        let signals = vec![
            Signal::new("metadata-issue", 20, "Missing GST number"),
            Signal::new("metadata-issue", 20, "No date found on document"),
        ];
        assert_eq!(signals.len(), 2);
        let total: u32 = signals.iter().map(|s| s.weight).sum();
        assert_eq!(total, 40);
    }
}
