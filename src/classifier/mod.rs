//! Binary real/fake classifier and its fail-open adapter.
//!
//! A [`Classifier`] turns a preprocessed `[1, H, W, 3]` tensor into the
//! probability that the input is synthetic. [`ClassifierAdapter`] owns an
//! optional classifier: when the model could not be loaded at startup every
//! score falls back to the neutral value without attempting inference, so the
//! rest of the pipeline stays usable without a trained artifact.

mod onnx;
pub mod preprocess;

pub use onnx::OnnxClassifier;

use std::path::PathBuf;

use ndarray::Array4;
use tracing::{info, warn};

use crate::scoring::{FallbackReason, Scored};
use crate::{Error, NEUTRAL_SCORE};

/// Input resolution used when neither the model sidecar nor the config names one.
pub const DEFAULT_INPUT_SIZE: u32 = 224;

/// A loaded binary classifier.
pub trait Classifier: Send + Sync {
    /// The name of this classifier (for logging).
    fn name(&self) -> &'static str;

    /// Edge length in pixels of the square input the model expects.
    fn input_size(&self) -> u32;

    /// Run inference on a `[1, H, W, 3]` tensor scaled to [0,1].
    ///
    /// Returns the probability that the input is fake.
    fn predict(&self, input: Array4<f32>) -> Result<f32, Error>;
}

/// Where to load the model from and how to feed it.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Path to the ONNX model file.
    pub path: PathBuf,
    /// Input resolution override. A `<model>.json` sidecar takes precedence.
    pub input_size: Option<u32>,
}

impl ModelConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            input_size: None,
        }
    }

    pub fn with_input_size(mut self, size: u32) -> Self {
        self.input_size = Some(size);
        self
    }
}

/// Fail-open wrapper around an optional [`Classifier`].
pub struct ClassifierAdapter {
    engine: Option<Box<dyn Classifier>>,
    input_size: u32,
}

impl ClassifierAdapter {
    /// Wrap an already loaded classifier.
    pub fn new<C: Classifier + 'static>(classifier: C) -> Self {
        let input_size = classifier.input_size();
        Self {
            engine: Some(Box::new(classifier)),
            input_size,
        }
    }

    /// An adapter with no model; every score is a fallback.
    pub fn unavailable(input_size: u32) -> Self {
        Self {
            engine: None,
            input_size,
        }
    }

    /// Load the ONNX model, degrading to [`ClassifierAdapter::unavailable`] on failure.
    pub fn load(config: &ModelConfig) -> Self {
        match OnnxClassifier::load(config) {
            Ok(classifier) => {
                info!(
                    "Classifier ready ({}x{} input)",
                    classifier.input_size(),
                    classifier.input_size()
                );
                Self::new(classifier)
            }
            Err(e) => {
                warn!(
                    "Classifier unavailable, all scores will be {}: {}",
                    NEUTRAL_SCORE, e
                );
                Self::unavailable(config.input_size.unwrap_or(DEFAULT_INPUT_SIZE))
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.engine.is_some()
    }

    pub fn input_size(&self) -> u32 {
        self.input_size
    }

    /// Name of the wrapped classifier, or `"none"`.
    pub fn engine_name(&self) -> &'static str {
        self.engine.as_ref().map(|e| e.name()).unwrap_or("none")
    }

    /// Score one preprocessed sample.
    pub fn score(&self, input: Array4<f32>) -> Scored {
        let Some(engine) = &self.engine else {
            return Scored::Fallback(FallbackReason::ModelUnavailable);
        };

        match engine.predict(input) {
            Ok(p) if p.is_finite() => Scored::single(f64::from(p).clamp(0.0, 1.0)),
            Ok(p) => {
                warn!("{} returned a non-finite score: {}", engine.name(), p);
                Scored::Fallback(FallbackReason::InferenceFailed)
            }
            Err(e) => {
                warn!("{} inference failed: {}", engine.name(), e);
                Scored::Fallback(FallbackReason::InferenceFailed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(f32);

    impl Classifier for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn input_size(&self) -> u32 {
            8
        }

        fn predict(&self, _input: Array4<f32>) -> Result<f32, Error> {
            Ok(self.0)
        }
    }

    struct Broken;

    impl Classifier for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn input_size(&self) -> u32 {
            8
        }

        fn predict(&self, _input: Array4<f32>) -> Result<f32, Error> {
            Err(Error::Model("boom".to_string()))
        }
    }

    fn input() -> Array4<f32> {
        Array4::zeros((1, 8, 8, 3))
    }

    #[test]
    fn test_unavailable_adapter_returns_neutral() {
        let adapter = ClassifierAdapter::unavailable(224);
        assert!(!adapter.is_available());
        assert_eq!(adapter.engine_name(), "none");
        let scored = adapter.score(input());
        assert_eq!(scored, Scored::Fallback(FallbackReason::ModelUnavailable));
        assert_eq!(scored.value(), 0.5);
    }

    #[test]
    fn test_adapter_passes_score_through() {
        let adapter = ClassifierAdapter::new(Fixed(0.25));
        assert!(adapter.is_available());
        assert_eq!(adapter.input_size(), 8);
        assert_eq!(adapter.engine_name(), "fixed");
        assert_eq!(adapter.score(input()), Scored::single(0.25));
    }

    #[test]
    fn test_adapter_clamps_out_of_range() {
        let adapter = ClassifierAdapter::new(Fixed(1.7));
        assert_eq!(adapter.score(input()).value(), 1.0);
        let adapter = ClassifierAdapter::new(Fixed(-0.2));
        assert_eq!(adapter.score(input()).value(), 0.0);
    }

    #[test]
    fn test_adapter_rejects_nan() {
        let adapter = ClassifierAdapter::new(Fixed(f32::NAN));
        assert_eq!(
            adapter.score(input()),
            Scored::Fallback(FallbackReason::InferenceFailed)
        );
    }

    #[test]
    fn test_inference_error_falls_back() {
        let adapter = ClassifierAdapter::new(Broken);
        let scored = adapter.score(input());
        assert_eq!(scored, Scored::Fallback(FallbackReason::InferenceFailed));
        assert_eq!(scored.value(), 0.5);
    }

    #[test]
    fn test_load_missing_model_degrades() {
        let config = ModelConfig::new("/nonexistent/deepfake.onnx").with_input_size(299);
        let adapter = ClassifierAdapter::load(&config);
        assert!(!adapter.is_available());
        assert_eq!(adapter.input_size(), 299);
    }

    #[test]
    fn test_load_missing_model_default_size() {
        let adapter = ClassifierAdapter::load(&ModelConfig::new("/nonexistent/model.onnx"));
        assert_eq!(adapter.input_size(), DEFAULT_INPUT_SIZE);
    }
}
