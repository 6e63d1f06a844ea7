//! ONNX Runtime backed classifier.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ndarray::Array4;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use serde::Deserialize;
use tracing::info;

use super::{Classifier, ModelConfig, DEFAULT_INPUT_SIZE};
use crate::Error;

/// Optional `<model>.json` file shipped next to the model artifact.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ModelSidecar {
    input_size: Option<u32>,
}

/// Binary real/fake classifier exported to ONNX.
///
/// Accepts NHWC input `[1, H, W, 3]`. A single output value is read as a
/// sigmoid probability of "fake"; two outputs are softmaxed and index 1 is
/// taken as "fake".
pub struct OnnxClassifier {
    session: Mutex<Session>,
    input_size: u32,
    path: PathBuf,
}

impl OnnxClassifier {
    /// Load the model described by `config`.
    pub fn load(config: &ModelConfig) -> Result<Self, Error> {
        info!("Loading ONNX model from {:?}", config.path);

        if !config.path.exists() {
            return Err(Error::Model(format!("Model not found: {:?}", config.path)));
        }

        let input_size = resolve_input_size(config)?;

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(&config.path)?;

        Ok(Self {
            session: Mutex::new(session),
            input_size,
            path: config.path.clone(),
        })
    }

    /// Path the model was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &'static str {
        "onnx"
    }

    fn input_size(&self) -> u32 {
        self.input_size
    }

    fn predict(&self, input: Array4<f32>) -> Result<f32, Error> {
        let input_tensor = Tensor::from_array(input)?;

        // Session::run needs exclusive access
        let mut session = self
            .session
            .lock()
            .map_err(|_| Error::Model("Mutex poisoned".to_string()))?;

        let outputs = session.run(ort::inputs![input_tensor])?;
        let values: Vec<f32> = outputs[0].try_extract_array::<f32>()?.iter().cloned().collect();

        fake_probability(&values)
    }
}

/// Sidecar value, then config value, then [`DEFAULT_INPUT_SIZE`].
fn resolve_input_size(config: &ModelConfig) -> Result<u32, Error> {
    let sidecar_path = config.path.with_extension("json");
    let sidecar = if sidecar_path.is_file() {
        let content = fs::read_to_string(&sidecar_path)?;
        serde_json::from_str::<ModelSidecar>(&content)?
    } else {
        ModelSidecar::default()
    };

    let size = sidecar
        .input_size
        .or(config.input_size)
        .unwrap_or(DEFAULT_INPUT_SIZE);

    if size == 0 {
        return Err(Error::Model("Model input size must be positive".to_string()));
    }

    Ok(size)
}

fn fake_probability(values: &[f32]) -> Result<f32, Error> {
    match values {
        [p] => Ok(*p),
        [a, b, ..] => {
            let max = a.max(*b);
            let ea = (a - max).exp();
            let eb = (b - max).exp();
            Ok(eb / (ea + eb))
        }
        [] => Err(Error::Model("Model produced no output".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fake_probability_sigmoid_output() {
        assert_eq!(fake_probability(&[0.73]).unwrap(), 0.73);
    }

    #[test]
    fn test_fake_probability_two_logits() {
        let p = fake_probability(&[0.0, 0.0]).unwrap();
        assert!((p - 0.5).abs() < 1e-6);

        let p = fake_probability(&[-2.0, 3.0]).unwrap();
        assert!(p > 0.99);
    }

    #[test]
    fn test_fake_probability_empty() {
        assert!(fake_probability(&[]).is_err());
    }

    #[test]
    fn test_missing_model_is_error() {
        let result = OnnxClassifier::load(&ModelConfig::new("/nonexistent/model.onnx"));
        assert!(matches!(result, Err(Error::Model(_))));
    }

    #[test]
    fn test_input_size_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ModelConfig::new(dir.path().join("model.onnx"));
        assert_eq!(resolve_input_size(&config).unwrap(), DEFAULT_INPUT_SIZE);

        let config = config.with_input_size(299);
        assert_eq!(resolve_input_size(&config).unwrap(), 299);
    }

    #[test]
    fn test_sidecar_wins_over_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("model.json"), r#"{"input_size": 256}"#).unwrap();

        let config = ModelConfig::new(dir.path().join("model.onnx")).with_input_size(299);
        assert_eq!(resolve_input_size(&config).unwrap(), 256);
    }

    #[test]
    fn test_sidecar_without_size_uses_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("model.json"), r#"{"trained_on": "faces"}"#).unwrap();

        let config = ModelConfig::new(dir.path().join("model.onnx")).with_input_size(299);
        assert_eq!(resolve_input_size(&config).unwrap(), 299);
    }

    #[test]
    fn test_zero_input_size_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = ModelConfig::new(dir.path().join("model.onnx")).with_input_size(0);
        assert!(resolve_input_size(&config).is_err());
    }
}
