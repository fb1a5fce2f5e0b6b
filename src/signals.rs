//! Catalog of named fraud signals and their fixed weights.
//!
//! Pure data. Detectors build [`Signal`]s from these specs so that names and
//! weights stay consistent across the reason trail, the metrics labels, and
//! the tests.

use crate::types::Signal;

/// Static description of one signal kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalSpec {
    pub name: &'static str,
    pub weight: u32,
}

impl SignalSpec {
    /// Instantiate a signal with this spec's catalog weight
    pub fn signal(&self, evidence: impl Into<String>) -> Signal {
        Signal::new(self.name, self.weight, evidence)
    }

    /// Instantiate a signal with a weight overriding the catalog default
    /// (used by the metadata-issue group, whose per-issue weight is a
    /// scoring-profile parameter)
    pub fn signal_weighted(&self, weight: u32, evidence: impl Into<String>) -> Signal {
        Signal::new(self.name, weight, evidence)
    }
}

// Field / claim signals
pub const OVER_BUDGET: SignalSpec = SignalSpec { name: "over-budget", weight: 50 };
pub const NEAR_BUDGET: SignalSpec = SignalSpec { name: "near-budget", weight: 30 };
pub const VENDOR_REDLISTED: SignalSpec = SignalSpec { name: "vendor-redlisted", weight: 100 };
pub const VENDOR_UNREGISTERED: SignalSpec = SignalSpec { name: "vendor-unregistered", weight: 40 };
pub const DUPLICATE_INVOICE_ID: SignalSpec = SignalSpec { name: "duplicate-invoice-id", weight: 100 };

/// Document metadata issues. The catalog weight is the simple-profile
/// default; the document-analysis profile overrides it per config.
pub const METADATA_ISSUE: SignalSpec = SignalSpec { name: "metadata-issue", weight: 20 };
pub const AMOUNT_MISMATCH: SignalSpec = SignalSpec { name: "amount-mismatch", weight: 20 };
pub const BUDGET_SHARE_EXCEEDED: SignalSpec = SignalSpec { name: "budget-share-exceeded", weight: 20 };
pub const INVALID_TAX_ID: SignalSpec = SignalSpec { name: "invalid-tax-id", weight: 20 };
pub const VENDOR_NAME_MISMATCH: SignalSpec = SignalSpec { name: "vendor-name-mismatch", weight: 20 };
pub const STALE_DOCUMENT_DATE: SignalSpec = SignalSpec { name: "stale-document-date", weight: 20 };

// Visual forensics signals
pub const SIGNATURE_MISSING: SignalSpec = SignalSpec { name: "signature-missing", weight: 20 };
pub const SIGNATURE_BLURRED: SignalSpec = SignalSpec { name: "signature-blurred", weight: 10 };
pub const SIGNATURE_FORGERY: SignalSpec = SignalSpec { name: "signature-forgery-flag", weight: 25 };
pub const QR_INVALID: SignalSpec = SignalSpec { name: "qr-invalid", weight: 15 };
pub const VISUAL_TAMPER: SignalSpec = SignalSpec { name: "visual-tamper", weight: 20 };

// Image provenance signals
pub const DUPLICATE_IMAGE: SignalSpec = SignalSpec { name: "duplicate-image", weight: 30 };
pub const GPS_MISMATCH: SignalSpec = SignalSpec { name: "gps-mismatch", weight: 40 };
pub const GPS_MISSING: SignalSpec = SignalSpec { name: "gps-missing", weight: 20 };
pub const STALE_IMAGE_DATE: SignalSpec = SignalSpec { name: "stale-image-date", weight: 20 };

// Model signals
pub const AMOUNT_ANOMALY: SignalSpec = SignalSpec { name: "amount-anomaly", weight: 30 };
/// Informational; carries the classifier confidence, contributes no weight
pub const AI_CONFIDENCE: SignalSpec = SignalSpec { name: "ai-confidence", weight: 0 };

/// Raised instead of a verdict when a document image yields no text at all
pub const UNSCOREABLE: SignalSpec = SignalSpec { name: "unscoreable", weight: 0 };

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_weights() {
        assert_eq!(OVER_BUDGET.weight, 50);
        assert_eq!(NEAR_BUDGET.weight, 30);
        assert_eq!(VENDOR_REDLISTED.weight, 100);
        assert_eq!(VENDOR_UNREGISTERED.weight, 40);
        assert_eq!(DUPLICATE_INVOICE_ID.weight, 100);
        assert_eq!(AMOUNT_MISMATCH.weight, 20);
        assert_eq!(BUDGET_SHARE_EXCEEDED.weight, 20);
        assert_eq!(SIGNATURE_MISSING.weight, 20);
        assert_eq!(SIGNATURE_BLURRED.weight, 10);
        assert_eq!(SIGNATURE_FORGERY.weight, 25);
        assert_eq!(QR_INVALID.weight, 15);
        assert_eq!(VISUAL_TAMPER.weight, 20);
        assert_eq!(DUPLICATE_IMAGE.weight, 30);
        assert_eq!(GPS_MISMATCH.weight, 40);
        assert_eq!(GPS_MISSING.weight, 20);
        assert_eq!(AMOUNT_ANOMALY.weight, 30);
        assert_eq!(AI_CONFIDENCE.weight, 0);
    }

    #[test]
    fn weighted_override_keeps_name() {
        let s = METADATA_ISSUE.signal_weighted(15, "Missing GST number");
        assert_eq!(s.name, "metadata-issue");
        assert_eq!(s.weight, 15);
    }
}
