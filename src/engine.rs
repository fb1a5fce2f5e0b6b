//! Risk fusion engine: runs every detector in fixed order, fuses their
//! signals under the configured scoring law, and classifies the result.
//!
//! The engine is the only component that sees all the evidence. Detectors
//! are isolated: one failing signal source degrades to "no signals from
//! this source" and the assessment continues. The single short-circuit is
//! a document image that yields no text at all, which terminates in the
//! distinct unscoreable outcome.

use crate::collab::{ForensicsAnalyzer, OcrEngine};
use crate::detectors::{
    DuplicateIndex, FieldAnomalyDetector, LocationValidator, VisualForensicsAdapter,
};
use crate::error::EngineError;
use crate::metrics::PipelineMetrics;
use crate::model::{feature_vector, AnomalyScorer};
use crate::parser::FieldParser;
use crate::signals;
use crate::types::{
    assessment::ScoringLaw, ClaimContext, DocumentFields, RiskAssessment, Signal,
    SubmissionRequest, Verdict, VerdictProfile, VisualForensicsResult,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Pipeline stage, tracked for structured logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Idle,
    Extracting,
    ScoringSignals,
    Classifying,
    Done,
    Error,
}

pub struct RiskFusionEngine {
    profile: VerdictProfile,
    law: ScoringLaw,
    parser: FieldParser,
    field: FieldAnomalyDetector,
    visual: VisualForensicsAdapter,
    location: Option<LocationValidator>,
    duplicates: Arc<DuplicateIndex>,
    scorer: AnomalyScorer,
    ocr: Option<Arc<dyn OcrEngine>>,
    forensics: Option<Arc<dyn ForensicsAnalyzer>>,
    metrics: Option<Arc<PipelineMetrics>>,
}

impl RiskFusionEngine {
    pub fn new(
        profile: VerdictProfile,
        law: ScoringLaw,
        field: FieldAnomalyDetector,
        duplicates: Arc<DuplicateIndex>,
        scorer: AnomalyScorer,
    ) -> Self {
        Self {
            profile,
            law,
            parser: FieldParser::new(),
            field,
            visual: VisualForensicsAdapter::new(),
            location: None,
            duplicates,
            scorer,
            ocr: None,
            forensics: None,
            metrics: None,
        }
    }

    pub fn with_ocr(mut self, ocr: Arc<dyn OcrEngine>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    pub fn with_forensics(mut self, forensics: Arc<dyn ForensicsAnalyzer>) -> Self {
        self.forensics = Some(forensics);
        self
    }

    pub fn with_location(mut self, location: LocationValidator) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<PipelineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Assess one submission. Always returns a well-formed assessment;
    /// failures inside any single detector reduce to missing signals.
    pub fn assess(&self, request: &SubmissionRequest) -> RiskAssessment {
        let claim = &request.claim;
        let mut stage = Stage::Idle;
        debug!(claim_id = %claim.claim_id, ?stage, "assessment started");

        // Idle -> Extracting
        stage = Stage::Extracting;
        debug!(claim_id = %claim.claim_id, ?stage, "extracting evidence");
        let image_path = request.image_path.as_deref().map(Path::new);
        let text = self.resolve_text(request, image_path);

        if text.as_deref() == Some("") {
            // The one terminal failure: a document that produced no text.
            // Score 0 here means "unscoreable", not "safe".
            stage = Stage::Error;
            warn!(claim_id = %claim.claim_id, ?stage, "no text extracted from document");
            return RiskAssessment::new(
                claim.claim_id.clone(),
                0,
                Verdict::Unscoreable,
                vec![signals::UNSCOREABLE.signal(
                    "Unable to extract text from image - OCR returned empty",
                )],
            );
        }

        let fields: Option<DocumentFields> = text.as_deref().map(|t| self.parser.parse(t));

        // Extracting -> ScoringSignals; detectors run in fixed order
        stage = Stage::ScoringSignals;
        debug!(claim_id = %claim.claim_id, ?stage, "running detectors");
        let field_signals = self.field.scan(claim, fields.as_ref());
        let location_signals = self.location_signals(claim, image_path);
        let report = self.resolve_forensics(request, image_path);
        let visual_signals = report
            .as_ref()
            .map(|r| self.visual.map(r))
            .unwrap_or_default();
        let provenance_signals = self.duplicate_signals(claim, image_path);
        let anomaly_signals: Vec<Signal> =
            self.scorer.amount_signal(claim.amount).into_iter().collect();

        // ScoringSignals -> Classifying
        stage = Stage::Classifying;
        debug!(claim_id = %claim.claim_id, ?stage, "fusing signals");
        let penalty_groups = [
            &location_signals,
            &visual_signals,
            &provenance_signals,
            &anomaly_signals,
        ];
        let penalties: u32 = penalty_groups
            .iter()
            .flat_map(|g| g.iter())
            .map(|s| s.weight)
            .sum();

        let summed = match self.law {
            ScoringLaw::WeightedSum => {
                field_signals.iter().map(|s| s.weight).sum::<u32>() + penalties
            }
            ScoringLaw::PerSignalBase { per_signal } => {
                (field_signals.len() as u32 * per_signal).min(100) + penalties
            }
        };
        let summed = summed.min(100);

        let mut trail = field_signals;
        trail.extend(location_signals);
        trail.extend(visual_signals);
        trail.extend(provenance_signals);
        trail.extend(anomaly_signals);

        // Hybrid mode replaces the sum with the calibrated probability; the
        // rule signals stay in the trail for explainability.
        let hybrid = if fields.is_some() {
            let features = feature_vector(
                text.as_deref().map_or(0, str::len),
                &trail,
                report.as_ref(),
            );
            self.scorer.classify(&features)
        } else {
            None
        };

        let (score, model) = match hybrid {
            Some(h) => {
                trail.push(h.confidence_signal.clone());
                (h.score.min(100), Some(h.metadata))
            }
            None => (summed, None),
        };

        let verdict = self.profile.classify(score);

        stage = Stage::Done;
        info!(
            claim_id = %claim.claim_id,
            risk_score = score,
            verdict = ?verdict,
            signals = trail.len(),
            hybrid = model.is_some(),
            ?stage,
            "assessment complete"
        );

        let mut assessment = RiskAssessment::new(claim.claim_id.clone(), score, verdict, trail);
        if let Some(model) = model {
            assessment = assessment.with_model(model);
        }
        assessment
    }

    /// Message-supplied text wins; otherwise the OCR collaborator runs.
    fn resolve_text(&self, request: &SubmissionRequest, image_path: Option<&Path>) -> Option<String> {
        if let Some(text) = &request.ocr_text {
            return Some(text.clone());
        }
        match (image_path, &self.ocr) {
            (Some(path), Some(ocr)) => Some(ocr.text(path)),
            (Some(path), None) => {
                warn!(
                    image = %path.display(),
                    "image submitted but no OCR collaborator configured; assessing claim data only"
                );
                None
            }
            _ => None,
        }
    }

    fn resolve_forensics(
        &self,
        request: &SubmissionRequest,
        image_path: Option<&Path>,
    ) -> Option<VisualForensicsResult> {
        if let Some(report) = &request.forensics {
            return Some(report.clone());
        }
        match (image_path, &self.forensics) {
            (Some(path), Some(analyzer)) => Some(analyzer.analyze(path)),
            _ => None,
        }
    }

    /// Location consistency: the validator when it can run, caller flags
    /// otherwise. An explicit measured mismatch weighs 40; a missing
    /// distance (no GPS metadata, unreadable file) weighs 20.
    fn location_signals(&self, claim: &ClaimContext, image_path: Option<&Path>) -> Vec<Signal> {
        let mut out = Vec::new();

        let validated = match (&self.location, claim.project_location, image_path) {
            (Some(validator), Some(site), Some(path)) => {
                let check = validator.validate(path, site);
                if !check.valid {
                    let reason = check
                        .reason
                        .unwrap_or_else(|| "Image location mismatch".to_string());
                    if check.distance_meters >= 0.0 {
                        out.push(signals::GPS_MISMATCH.signal(reason));
                    } else {
                        out.push(signals::GPS_MISSING.signal(reason));
                    }
                }
                true
            }
            _ => false,
        };

        if !validated {
            if claim.flags.gps_valid == Some(false) {
                let reason = claim
                    .flags
                    .gps_mismatch_reason
                    .clone()
                    .unwrap_or_else(|| "Image location mismatch".to_string());
                out.push(signals::GPS_MISMATCH.signal(reason));
            } else if claim.flags.image_has_gps == Some(false) {
                out.push(signals::GPS_MISSING.signal("Image metadata missing GPS coordinates"));
            }
        }

        if claim.flags.image_date_valid == Some(false) {
            out.push(signals::STALE_IMAGE_DATE.signal("Image date is invalid or too old"));
        }

        out
    }

    fn duplicate_signals(&self, claim: &ClaimContext, image_path: Option<&Path>) -> Vec<Signal> {
        let Some(path) = image_path else {
            return Vec::new();
        };
        match self.duplicates.check_and_register(path, &claim.claim_id) {
            Ok(check) if check.is_duplicate => {
                vec![signals::DUPLICATE_IMAGE.signal(format!(
                    "Duplicate or reused image detected (distance {}, matches {})",
                    check.distance,
                    check.matched_with.as_deref().unwrap_or("unknown")
                ))]
            }
            Ok(_) => Vec::new(),
            Err(e) => {
                // Partial-failure isolation: the index could not hash the
                // image, so this source contributes nothing
                let err = EngineError::detector("duplicate-index", e);
                warn!(claim_id = %claim.claim_id, error = %err, "duplicate check failed");
                if let Some(metrics) = &self.metrics {
                    metrics.record_detector_failure("duplicate-index");
                }
                Vec::new()
            }
        }
    }
}
