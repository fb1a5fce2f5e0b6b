//! Signal detectors. Each one turns its slice of the evidence into zero or
//! more catalog signals and never aborts the assessment.

pub mod duplicate_index;
pub mod field_anomaly;
pub mod location;
pub mod visual;

pub use duplicate_index::{DuplicateCheck, DuplicateIndex};
pub use field_anomaly::{FieldAnomalyDetector, SeenInvoices, VendorRegistry};
pub use location::{LocationCheck, LocationValidator};
pub use visual::VisualForensicsAdapter;
