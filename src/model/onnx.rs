//! ONNX Runtime sessions for the two model roles.
//!
//! Exported scikit-learn models come in two output flavors: plain tensors
//! (RandomForest, IsolationForest) and seq(map(int64, float)) probability
//! maps. Extraction tries both.

use super::{FraudClassifier, OutlierModel, OutlierVerdict};
use anyhow::{Context, Result};
use ort::memory::Allocator;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType};
use std::path::Path;
use std::sync::RwLock;
use tracing::{debug, info, warn};

/// A loaded ONNX model with resolved I/O names
pub struct OnnxModel {
    pub name: String,
    session: RwLock<Session>,
    input_name: String,
    output_name: String,
    version: String,
}

/// Loads optional model files; absence is a mode, not an error.
pub struct ModelLoader {
    threads: usize,
}

impl ModelLoader {
    pub fn new(threads: usize) -> Result<Self> {
        ort::init().commit()?;
        info!(threads, "ONNX Runtime initialized");
        Ok(Self { threads })
    }

    /// Load one model file. Returns `None` (with a warning) when the file
    /// is absent or unloadable so the pipeline can run rule-only.
    pub fn load_optional(&self, path: &Path, name: &str, version: &str) -> Option<OnnxModel> {
        if !path.exists() {
            warn!(model = %name, path = %path.display(), "model file not found, running without it");
            return None;
        }
        match self.load(path, name, version) {
            Ok(model) => Some(model),
            Err(e) => {
                warn!(model = %name, error = %e, "failed to load model, running without it");
                None
            }
        }
    }

    fn load(&self, path: &Path, name: &str, version: &str) -> Result<OnnxModel> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.threads)?
            .commit_from_file(path)
            .context(format!("failed to load model from {:?}", path))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob") || o.name.contains("scores"))
            .map(|o| o.name.clone())
            .unwrap_or_else(|| {
                session
                    .outputs
                    .last()
                    .map(|o| o.name.clone())
                    .unwrap_or_else(|| "probabilities".to_string())
            });

        info!(
            model = %name,
            input = %input_name,
            output = %output_name,
            "model loaded"
        );

        Ok(OnnxModel {
            name: name.to_string(),
            session: RwLock::new(session),
            input_name,
            output_name,
            version: version.to_string(),
        })
    }
}

impl OnnxModel {
    fn run_raw(&self, features: &[f32]) -> Result<RawOutputs> {
        use ort::value::Tensor;

        let shape = vec![1_i64, features.len() as i64];
        let input_tensor = Tensor::from_array((shape, features.to_vec()))
            .context("failed to create input tensor")?;

        let mut session = self
            .session
            .write()
            .map_err(|e| anyhow::anyhow!("model lock poisoned: {e}"))?;

        let outputs = session.run(ort::inputs![&self.input_name => input_tensor])?;
        RawOutputs::collect(&outputs, &self.output_name, &self.name)
    }
}

/// Decoded model outputs, whichever of the flavors were present
struct RawOutputs {
    /// Fraud-class probability or decision score
    score: Option<f64>,
    /// Class label (-1/1 outlier convention or 0/1 classes)
    label: Option<i64>,
}

impl RawOutputs {
    fn collect(
        outputs: &ort::session::SessionOutputs,
        preferred: &str,
        model_name: &str,
    ) -> Result<Self> {
        let mut score = None;
        let mut label = None;

        // Preferred output first, then everything else
        if let Some(output) = outputs.get(preferred) {
            score = extract_score(output, model_name);
        }

        for (name, output) in outputs.iter() {
            if label.is_none() {
                if let Ok((_, data)) = output.try_extract_tensor::<i64>() {
                    if name.contains("label") {
                        label = data.first().copied();
                    }
                }
            }
            if score.is_none() && !name.contains("label") {
                score = extract_score(&output, model_name);
            }
        }

        Ok(Self { score, label })
    }
}

/// Pull a probability/score out of one output value: tensor first, then the
/// seq(map) shape used by some sklearn exporters.
fn extract_score(output: &ort::value::DynValue, model_name: &str) -> Option<f64> {
    if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
        let dims: Vec<i64> = shape.iter().copied().collect();
        // [batch, classes] picks the fraud class (index 1); anything else
        // takes the first value
        let value = if dims.last().copied().unwrap_or(1) >= 2 && data.len() >= 2 {
            data[1]
        } else {
            *data.first()?
        };
        debug!(model = %model_name, value, "score from tensor");
        return Some(value as f64);
    }

    if DynSequenceValueType::can_downcast(&output.dtype()) {
        if let Some(p) = extract_from_sequence_map(output, model_name) {
            return Some(p);
        }
    }

    None
}

/// seq(map(int64, float)): find the class-1 probability
fn extract_from_sequence_map(output: &ort::value::DynValue, model_name: &str) -> Option<f64> {
    let allocator = Allocator::default();
    let sequence = output.downcast_ref::<DynSequenceValueType>().ok()?;
    let maps = sequence
        .try_extract_sequence::<DynMapValueType>(&allocator)
        .ok()?;
    let first = maps.first()?;
    let kv_pairs = first.try_extract_key_values::<i64, f32>().ok()?;

    for (class_id, prob) in &kv_pairs {
        if *class_id == 1 {
            debug!(model = %model_name, prob = *prob, "score from seq(map)");
            return Some(*prob as f64);
        }
    }
    // Only class 0 present: invert
    kv_pairs
        .iter()
        .find(|(id, _)| *id == 0)
        .map(|(_, p)| 1.0 - *p as f64)
}

impl FraudClassifier for OnnxModel {
    fn fraud_probability(&self, features: &[f32]) -> Result<f64> {
        let raw = self.run_raw(features)?;
        let p = raw
            .score
            .ok_or_else(|| anyhow::anyhow!("model '{}' produced no probability", self.name))?;
        Ok(p.clamp(0.0, 1.0))
    }

    fn version(&self) -> &str {
        &self.version
    }
}

impl OutlierModel for OnnxModel {
    fn score_amount(&self, amount: f64) -> Result<OutlierVerdict> {
        let raw = self.run_raw(&[amount as f32])?;
        let margin = raw.score.unwrap_or(0.0);
        // IsolationForest convention: label -1 flags the outlier; without a
        // label output, a negative decision margin does
        let is_anomaly = match raw.label {
            Some(label) => label == -1,
            None => margin < 0.0,
        };
        Ok(OutlierVerdict { is_anomaly, margin })
    }
}
