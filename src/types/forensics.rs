//! Visual forensics report consumed from the CV collaborator

use serde::{Deserialize, Serialize};

/// Perceived quality of a detected signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SignatureQuality {
    Clear,
    Blurred,
    #[default]
    Unknown,
}

/// Signature portion of the forensics report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureReport {
    pub present: bool,
    #[serde(default)]
    pub quality: SignatureQuality,
    /// "Low" means no forgery indication; anything else carries the
    /// analyzer's note (e.g. "Medium (Possible Digital Overlay)")
    #[serde(default = "default_forgery_risk")]
    pub forgery_risk: String,
}

impl Default for SignatureReport {
    fn default() -> Self {
        Self {
            present: false,
            quality: SignatureQuality::Unknown,
            forgery_risk: default_forgery_risk(),
        }
    }
}

fn default_forgery_risk() -> String {
    "Low".to_string()
}

impl SignatureReport {
    /// Whether the analyzer raised any forgery concern
    pub fn forgery_flagged(&self) -> bool {
        self.forgery_risk != "Low"
    }
}

/// QR code portion of the forensics report
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QrReport {
    pub found: bool,
    pub valid: bool,
}

/// Tamper-detection portion of the forensics report
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TamperReport {
    pub is_tampered: bool,
    #[serde(default)]
    pub notes: Vec<String>,
}

/// Full report from the signature/QR/tamper analyzer.
///
/// The analyzer never fails; unreadable input yields a default report with
/// `error` set, which the adapter treats as "no visual evidence".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisualForensicsResult {
    #[serde(default)]
    pub signature: SignatureReport,
    #[serde(default)]
    pub qr: QrReport,
    #[serde(default)]
    pub tampering: TamperReport,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forgery_flag_only_clear_for_low() {
        let mut sig = SignatureReport {
            present: true,
            quality: SignatureQuality::Clear,
            forgery_risk: "Low".to_string(),
        };
        assert!(!sig.forgery_flagged());

        sig.forgery_risk = "Medium (Too Blurry)".to_string();
        assert!(sig.forgery_flagged());
    }

    #[test]
    fn report_deserializes_from_partial_json() {
        let json = r#"{"signature": {"present": false}, "qr": {"found": true, "valid": false}}"#;
        let report: VisualForensicsResult = serde_json::from_str(json).unwrap();
        assert!(!report.signature.present);
        assert_eq!(report.signature.forgery_risk, "Low");
        assert!(report.qr.found);
        assert!(!report.tampering.is_tampered);
    }
}
