//! Invoice Risk Pipeline Library
//!
//! A real-time document fraud risk assessment pipeline. Claim submissions
//! arrive over NATS, a fusion engine combines weak signals from field,
//! visual, location and provenance detectors with optional ONNX models,
//! and explainable risk assessments flow back out.

pub mod collab;
pub mod config;
pub mod consumer;
pub mod detectors;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod model;
pub mod parser;
pub mod phash;
pub mod producer;
pub mod signals;
pub mod types;

pub use config::AppConfig;
pub use consumer::{SubmissionConsumer, SubmissionStream};
pub use engine::RiskFusionEngine;
pub use error::EngineError;
pub use producer::AssessmentProducer;
pub use types::{RiskAssessment, SubmissionRequest, Verdict};
