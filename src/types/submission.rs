//! Incoming submission message

use crate::types::claim::ClaimContext;
use crate::types::forensics::VisualForensicsResult;
use serde::{Deserialize, Serialize};

/// One assessment request as it arrives on the wire.
///
/// Upstream stages may have already run the OCR and CV collaborators; their
/// outputs ride along with the message and take precedence over the engine's
/// own collaborator calls. A request with neither an image nor pre-extracted
/// evidence is assessed from the claim data alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionRequest {
    pub claim: ClaimContext,
    /// Path to the stored document image, when one was uploaded
    #[serde(default)]
    pub image_path: Option<String>,
    /// Recognized text, when OCR already ran upstream. `Some("")` means OCR
    /// ran and found nothing, which is the unscoreable condition.
    #[serde(default)]
    pub ocr_text: Option<String>,
    /// Visual forensics report, when the CV stage already ran upstream
    #[serde(default)]
    pub forensics: Option<VisualForensicsResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_submission_deserializes() {
        let json = r#"{
            "claim": {
                "claim_id": "INV-7",
                "amount": 100.0,
                "project_budget": 1000.0,
                "vendor_name": "Good Supplies Inc"
            }
        }"#;

        let req: SubmissionRequest = serde_json::from_str(json).unwrap();
        assert!(req.image_path.is_none());
        assert!(req.ocr_text.is_none());
        assert!(req.forensics.is_none());
    }
}
