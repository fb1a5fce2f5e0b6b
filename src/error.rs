//! Error taxonomy for the fusion engine.
//!
//! Only `Input` ever reaches a caller, and then only as an unscoreable
//! assessment. Detector and store failures are recovered where they occur;
//! a missing model is a mode, not an error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Missing or corrupt input; reported as a terminal unscoreable result
    #[error("unreadable input: {0}")]
    Input(String),

    /// One signal source failed; recovered locally, contributes no signals
    #[error("detector '{detector}' failed: {cause}")]
    Detector { detector: &'static str, cause: String },

    /// No trained model is loaded; scorer falls back to rule-only mode
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    /// Persisted store could not be read or written
    #[error("store error: {0}")]
    Store(#[from] std::io::Error),
}

impl EngineError {
    pub fn detector(detector: &'static str, cause: impl std::fmt::Display) -> Self {
        Self::Detector {
            detector,
            cause: cause.to_string(),
        }
    }
}
