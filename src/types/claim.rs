//! Claim context and extracted document fields

use serde::{Deserialize, Serialize};

/// Geographic coordinates (decimal degrees)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// Flags a caller may assert when an upstream system has already run a check.
///
/// All optional; `None` means "not checked externally".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClaimFlags {
    /// Vendor is known-bad according to the caller
    #[serde(default)]
    pub redlisted: Option<bool>,
    /// Invoice number already submitted according to the caller
    #[serde(default)]
    pub duplicate_invoice: Option<bool>,
    /// Image carries GPS metadata (caller checked, engine did not)
    #[serde(default)]
    pub image_has_gps: Option<bool>,
    /// Image capture date is plausible (caller checked)
    #[serde(default)]
    pub image_date_valid: Option<bool>,
    /// A geolocation check ran upstream and produced this result
    #[serde(default)]
    pub gps_valid: Option<bool>,
    /// Human-readable reason accompanying `gps_valid == false`
    #[serde(default)]
    pub gps_mismatch_reason: Option<String>,
}

/// Structured claim data accompanying a document submission.
///
/// Caller-owned, read-only input; the engine never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimContext {
    /// Claim / invoice identifier as submitted
    pub claim_id: String,
    /// Claimed amount
    pub amount: f64,
    /// Authorized budget ceiling for the project this claim bills against
    pub project_budget: f64,
    /// Vendor identity as claimed
    pub vendor_name: String,
    /// Project site coordinates, when the project is geolocated
    #[serde(default)]
    pub project_location: Option<GeoPoint>,
    /// Externally pre-computed flags
    #[serde(default)]
    pub flags: ClaimFlags,
}

/// Fields extracted from a document image. Any field may be absent;
/// detectors degrade per-field and never fail on missing data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentFields {
    pub invoice_number: Option<String>,
    pub amount: Option<f64>,
    /// Tax registration (GST) identifier
    pub tax_id: Option<String>,
    /// Date as printed on the document, `D[-/.]M[-/.]YY[YY]`
    pub date: Option<String>,
    pub vendor_name: Option<String>,
    /// First 500 characters of recognized text
    pub raw_text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_deserializes_without_optional_sections() {
        let json = r#"{
            "claim_id": "INV-2024-001",
            "amount": 45000.0,
            "project_budget": 100000.0,
            "vendor_name": "Alpha Construction"
        }"#;

        let claim: ClaimContext = serde_json::from_str(json).unwrap();
        assert!(claim.project_location.is_none());
        assert!(claim.flags.redlisted.is_none());
        assert!(claim.flags.gps_valid.is_none());
    }

    #[test]
    fn document_fields_default_is_all_absent() {
        let fields = DocumentFields::default();
        assert!(fields.invoice_number.is_none());
        assert!(fields.tax_id.is_none());
        assert!(fields.raw_text.is_empty());
    }
}
