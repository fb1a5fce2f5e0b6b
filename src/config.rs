//! Configuration management for the invoice risk pipeline

use crate::types::assessment::{ScoringLaw, VerdictProfile};
use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    pub models: ModelsConfig,
    pub detection: DetectionConfig,
    pub detectors: DetectorsConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject for incoming claim submissions
    pub submission_subject: String,
    /// Subject for outgoing risk assessments
    pub assessment_subject: String,
}

/// ONNX models configuration. Both model files are optional; the pipeline
/// runs rule-only without them.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    /// Directory containing ONNX model files
    pub models_dir: String,
    /// Amount outlier model file name (IsolationForest export)
    #[serde(default = "default_outlier_model")]
    pub outlier_model: String,
    /// Fraud classifier file name (RandomForest export)
    #[serde(default = "default_classifier_model")]
    pub classifier_model: String,
    /// Version tag reported in assessment metadata
    #[serde(default = "default_model_version")]
    pub version: String,
    /// Number of threads for ONNX inference per model (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_outlier_model() -> String {
    "amount_outlier.onnx".to_string()
}

fn default_classifier_model() -> String {
    "fraud_classifier.onnx".to_string()
}

fn default_model_version() -> String {
    "v1.0".to_string()
}

fn default_onnx_threads() -> usize {
    1
}

/// Detection configuration: how signal weights turn into a verdict
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionConfig {
    /// Verdict profile: binary GREEN/RED or tri-level SAFE/REVIEW/FLAGGED
    #[serde(default)]
    pub verdict_profile: VerdictProfile,
    /// Scoring law: weighted sum or per-signal base
    #[serde(default)]
    pub scoring_law: ScoringLaw,
    /// Per-issue weight of the document metadata signal group
    #[serde(default = "default_metadata_issue_weight")]
    pub metadata_issue_weight: u32,
}

fn default_metadata_issue_weight() -> u32 {
    20
}

/// Detector configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DetectorsConfig {
    /// Vendors whose claims are rejected outright
    #[serde(default)]
    pub redlist: Vec<String>,
    /// Roster of registered vendors
    #[serde(default)]
    pub registered_vendors: Vec<String>,
    /// Maximum Hamming distance still considered the same image
    #[serde(default = "default_duplicate_threshold")]
    pub duplicate_threshold: u32,
    /// JSON log persisting seen image hashes across restarts
    #[serde(default = "default_hash_log")]
    pub hash_log: String,
    /// Acceptable distance between capture point and project site, meters
    #[serde(default = "default_gps_radius_m")]
    pub gps_radius_m: f64,
}

fn default_duplicate_threshold() -> u32 {
    5
}

fn default_hash_log() -> String {
    "data/image_hashes.json".to_string()
}

fn default_gps_radius_m() -> f64 {
    200.0
}

/// Pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Number of worker threads
    pub workers: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                submission_subject: "claims.submissions".to_string(),
                assessment_subject: "claims.assessments".to_string(),
            },
            models: ModelsConfig {
                models_dir: "models".to_string(),
                outlier_model: default_outlier_model(),
                classifier_model: default_classifier_model(),
                version: default_model_version(),
                onnx_threads: 1,
            },
            detection: DetectionConfig {
                verdict_profile: VerdictProfile::default(),
                scoring_law: ScoringLaw::default(),
                metadata_issue_weight: default_metadata_issue_weight(),
            },
            detectors: DetectorsConfig {
                redlist: Vec::new(),
                registered_vendors: Vec::new(),
                duplicate_threshold: default_duplicate_threshold(),
                hash_log: default_hash_log(),
                gps_radius_m: default_gps_radius_m(),
            },
            pipeline: PipelineConfig { workers: 4 },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.nats.url, "nats://localhost:4222");
        assert_eq!(config.detectors.duplicate_threshold, 5);
        assert_eq!(config.detectors.gps_radius_m, 200.0);
        assert_eq!(config.detection.metadata_issue_weight, 20);
        assert_eq!(config.pipeline.workers, 4);
    }

    #[test]
    fn test_load_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[nats]
url = "nats://nats.internal:4222"
submission_subject = "claims.submissions"
assessment_subject = "claims.assessments"

[models]
models_dir = "models"

[detection]
metadata_issue_weight = 15

[detection.verdict_profile]
profile = "binary"
red_threshold = 50

[detectors]
redlist = ["Shady Vendors Ltd"]
registered_vendors = ["Good Supplies Inc"]

[pipeline]
workers = 8

[logging]
level = "debug"
format = "pretty"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from_path(&path).unwrap();
        assert_eq!(config.nats.url, "nats://nats.internal:4222");
        assert_eq!(config.detection.metadata_issue_weight, 15);
        assert_eq!(config.detectors.redlist, vec!["Shady Vendors Ltd"]);
        assert_eq!(config.pipeline.workers, 8);
        assert!(matches!(
            config.detection.verdict_profile,
            VerdictProfile::Binary { red_threshold: 50 }
        ));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(AppConfig::load_from_path("/nonexistent/config.toml").is_err());
    }
}
