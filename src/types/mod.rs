//! Wire and domain types for the invoice risk pipeline

pub mod assessment;
pub mod claim;
pub mod forensics;
pub mod submission;

pub use assessment::{ModelMetadata, RiskAssessment, Signal, Verdict, VerdictProfile};
pub use claim::{ClaimContext, ClaimFlags, DocumentFields, GeoPoint};
pub use forensics::{
    QrReport, SignatureQuality, SignatureReport, TamperReport, VisualForensicsResult,
};
pub use submission::SubmissionRequest;
