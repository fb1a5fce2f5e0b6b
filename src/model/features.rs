//! Feature vector for the fraud classifier.
//!
//! Order is fixed and must match the training pipeline exactly:
//! text length, amount mismatch, invalid tax id, signature present,
//! signature blurred, signature forgery, QR invalid, tampering.

use crate::signals;
use crate::types::{Signal, SignatureQuality, VisualForensicsResult};

pub const FEATURE_COUNT: usize = 8;

/// Text length is normalized against this ceiling
const TEXT_LEN_NORM: f32 = 2000.0;

/// Build the classifier input from the heuristic run's evidence.
///
/// `field_signals` is the field detector's output; the binary flags are
/// derived from the catalog names so feature semantics track the rules.
pub fn feature_vector(
    text_len: usize,
    field_signals: &[Signal],
    forensics: Option<&VisualForensicsResult>,
) -> Vec<f32> {
    let has = |name: &str| field_signals.iter().any(|s| s.name == name);
    let amount_mismatch = has(signals::OVER_BUDGET.name)
        || has(signals::NEAR_BUDGET.name)
        || has(signals::AMOUNT_MISMATCH.name);
    let tax_id_invalid = has(signals::INVALID_TAX_ID.name);

    let (sig_present, sig_blurred, sig_forgery, qr_invalid, tampered) = match forensics {
        Some(vf) if vf.error.is_none() => (
            vf.signature.present,
            vf.signature.quality == SignatureQuality::Blurred,
            vf.signature.forgery_flagged(),
            vf.qr.found && !vf.qr.valid,
            vf.tampering.is_tampered,
        ),
        _ => (false, false, false, false, false),
    };

    let as_f32 = |b: bool| if b { 1.0 } else { 0.0 };

    vec![
        (text_len as f32 / TEXT_LEN_NORM).min(1.0),
        as_f32(amount_mismatch),
        as_f32(tax_id_invalid),
        as_f32(sig_present),
        as_f32(sig_blurred),
        as_f32(sig_forgery),
        as_f32(qr_invalid),
        as_f32(tampered),
    ]
}
