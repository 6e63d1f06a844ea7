//! Deepcheck - deepfake detection and authenticity scoring
//!
//! Scores an image or video with a pretrained binary classifier, fuses the
//! result with auxiliary signals into one authenticity score, and keeps an
//! auditable JSON report per processed file.
//!
//! # Architecture
//!
//! The pipeline is built from small injectable pieces:
//! 1. [`ClassifierAdapter`] wraps the ONNX model and falls back to a neutral
//!    score when no model could be loaded
//! 2. [`FrameSampler`] picks which video frames get classified
//! 3. [`MediaScorer`] dispatches by media kind and aggregates sample scores
//! 4. [`FusionWeights`] combines AI, metadata and chain-verification signals
//! 5. [`ReportStore`] persists reports and builds the dashboard aggregate
//!
//! [`Auditor`] wires all of them together for a single upload.
//!
//! # Example
//!
//! ```no_run
//! use deepcheck::{ClassifierAdapter, MediaScorer, ModelConfig, SamplingPolicy, VideoTools};
//!
//! let adapter = ClassifierAdapter::load(&ModelConfig::new("model/deepfake.onnx"));
//! let sampler = SamplingPolicy::default().build(VideoTools::default());
//! let scorer = MediaScorer::new(adapter, sampler);
//!
//! let scored = scorer.score_media("clip.mp4").unwrap();
//! println!("AI score: {:.3}", scored.value());
//! if let Some(reason) = scored.fallback_reason() {
//!     println!("Fell back: {}", reason);
//! }
//! ```

pub use error::Error;

pub mod audit;
pub mod classifier;
pub mod config;
pub mod fusion;
pub mod hash;
pub mod report;
pub mod scoring;
pub mod verify;
pub mod video;

pub use audit::{AuditOutcome, Auditor};
pub use classifier::{Classifier, ClassifierAdapter, ModelConfig, OnnxClassifier};
pub use fusion::{FusionWeights, MetadataScorer, StaticMetadataScore};
pub use report::{Dashboard, DashboardEntry, Report, ReportStore, StoredReport};
pub use scoring::{FallbackReason, MediaKind, MediaScorer, Scored};
pub use verify::{ChainVerifier, NullVerifier};
pub use video::{Frame, FrameSampler, SamplingPolicy, VideoTools};

/// Score returned whenever a real score cannot be produced: maximal uncertainty.
pub const NEUTRAL_SCORE: f64 = 0.5;

mod error {
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum Error {
        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),

        #[error("JSON error: {0}")]
        Json(#[from] serde_json::Error),

        #[error("Image error: {0}")]
        Image(#[from] image::ImageError),

        #[error("Shape error: {0}")]
        Shape(#[from] ndarray::ShapeError),

        #[error("ORT error: {0}")]
        Ort(#[from] ort::Error),

        #[error("Model error: {0}")]
        Model(String),

        #[error("Probe error: {0}")]
        Probe(String),

        #[error("Config error: {0}")]
        Config(String),

        #[error("Unsupported media type: {0}")]
        UnsupportedMedia(String),
    }
}
