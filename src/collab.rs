//! Collaborator contracts the engine consumes.
//!
//! OCR, visual forensics, and EXIF geolocation are implemented elsewhere
//! (sidecar services or upstream pipeline stages); the engine only depends
//! on these traits. Each contract is total: collaborators signal failure
//! through their return value, never by panicking, and the engine treats a
//! failing collaborator as one missing signal source.

use crate::types::{GeoPoint, VisualForensicsResult};
use std::path::Path;

/// Text recognition over a document image.
pub trait OcrEngine: Send + Sync {
    /// Recognized UTF-8 text. Empty string on failure.
    fn text(&self, image_path: &Path) -> String;
}

/// Signature / QR / tamper analysis over a document image.
pub trait ForensicsAnalyzer: Send + Sync {
    /// Full report; unreadable input yields a default report with `error`
    /// set.
    fn analyze(&self, image_path: &Path) -> VisualForensicsResult;
}

/// EXIF geolocation extraction.
pub trait GpsReader: Send + Sync {
    /// Embedded capture coordinates, if the image carries GPS metadata.
    fn extract(&self, image_path: &Path) -> Option<GeoPoint>;
}
