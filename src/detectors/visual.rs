//! Maps the external visual forensics report to catalog signals.
//!
//! Pure mapping, no I/O. All five outcomes are independent: a signature can
//! be blurred and forgery-flagged at the same time.

use crate::signals;
use crate::types::{Signal, SignatureQuality, VisualForensicsResult};

pub struct VisualForensicsAdapter;

impl VisualForensicsAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn map(&self, report: &VisualForensicsResult) -> Vec<Signal> {
        let mut out = Vec::new();

        if report.error.is_some() {
            // Analyzer could not read the image: no visual evidence
            return out;
        }

        if !report.signature.present {
            out.push(signals::SIGNATURE_MISSING.signal(
                "Signature missing or not detected against background",
            ));
        } else if report.signature.quality == SignatureQuality::Blurred {
            out.push(
                signals::SIGNATURE_BLURRED.signal("Signature appears blurred/low quality"),
            );
        }

        if report.signature.forgery_flagged() {
            out.push(signals::SIGNATURE_FORGERY.signal(format!(
                "Signature flag: {}",
                report.signature.forgery_risk
            )));
        }

        if report.qr.found && !report.qr.valid {
            out.push(signals::QR_INVALID.signal("QR code detected but unreadable/invalid"));
        }

        if report.tampering.is_tampered {
            let notes = if report.tampering.notes.is_empty() {
                "Visual inconsistency detected (potential cut-paste)".to_string()
            } else {
                report.tampering.notes.join("; ")
            };
            out.push(signals::VISUAL_TAMPER.signal(notes));
        }

        out
    }
}

impl Default for VisualForensicsAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{QrReport, SignatureReport, TamperReport};

    fn names(signals: &[Signal]) -> Vec<&str> {
        signals.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn clean_report_yields_no_signals_except_missing_signature() {
        let report = VisualForensicsResult {
            signature: SignatureReport {
                present: true,
                quality: SignatureQuality::Clear,
                forgery_risk: "Low".to_string(),
            },
            qr: QrReport { found: true, valid: true },
            tampering: TamperReport::default(),
            error: None,
        };
        assert!(VisualForensicsAdapter::new().map(&report).is_empty());
    }

    #[test]
    fn missing_signature_weight_20() {
        let report = VisualForensicsResult::default();
        let out = VisualForensicsAdapter::new().map(&report);
        let sig = out.iter().find(|s| s.name == "signature-missing").unwrap();
        assert_eq!(sig.weight, 20);
    }

    #[test]
    fn blurred_and_forged_are_independent() {
        let report = VisualForensicsResult {
            signature: SignatureReport {
                present: true,
                quality: SignatureQuality::Blurred,
                forgery_risk: "Medium (Possible Digital Overlay)".to_string(),
            },
            ..VisualForensicsResult::default()
        };
        let out = VisualForensicsAdapter::new().map(&report);
        let names = names(&out);
        assert!(names.contains(&"signature-blurred"));
        assert!(names.contains(&"signature-forgery-flag"));
    }

    #[test]
    fn qr_invalid_only_when_found_but_not_valid() {
        let mut report = VisualForensicsResult {
            signature: SignatureReport {
                present: true,
                quality: SignatureQuality::Clear,
                forgery_risk: "Low".to_string(),
            },
            ..VisualForensicsResult::default()
        };

        report.qr = QrReport { found: false, valid: false };
        assert!(!names(&VisualForensicsAdapter::new().map(&report)).contains(&"qr-invalid"));

        report.qr = QrReport { found: true, valid: false };
        assert!(names(&VisualForensicsAdapter::new().map(&report)).contains(&"qr-invalid"));
    }

    #[test]
    fn tampering_carries_analyzer_notes() {
        let report = VisualForensicsResult {
            signature: SignatureReport {
                present: true,
                quality: SignatureQuality::Clear,
                forgery_risk: "Low".to_string(),
            },
            tampering: TamperReport {
                is_tampered: true,
                notes: vec!["Inconsistent noise pattern in 'Total Amount' region".to_string()],
            },
            ..VisualForensicsResult::default()
        };
        let out = VisualForensicsAdapter::new().map(&report);
        let tamper = out.iter().find(|s| s.name == "visual-tamper").unwrap();
        assert!(tamper.evidence.contains("Total Amount"));
    }

    #[test]
    fn analyzer_error_yields_no_signals() {
        let report = VisualForensicsResult {
            error: Some("Failed to load image".to_string()),
            ..VisualForensicsResult::default()
        };
        assert!(VisualForensicsAdapter::new().map(&report).is_empty());
    }
}
