mod file_config;

pub use file_config::{FileConfig, FusionConfig};

use anyhow::{anyhow, bail, Context, Result};
use std::path::PathBuf;

use crate::classifier::ModelConfig;
use crate::fusion::{FusionWeights, StaticMetadataScore, STATIC_METADATA_SCORE};
use crate::video::{FrameSampler, SamplingPolicy, VideoTools};

pub const DEFAULT_MODEL_PATH: &str = "model/deepfake_model.onnx";
pub const DEFAULT_REPORTS_DIR: &str = "reports";

/// CLI arguments that can be used for config resolution.
/// Every field here can be overridden by the TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub model_path: Option<PathBuf>,
    pub reports_dir: Option<PathBuf>,
    pub sampling: Option<SamplingPolicy>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub model_path: PathBuf,
    /// Overrides the default input size when the model has no sidecar.
    pub model_input_size: Option<u32>,
    pub reports_dir: PathBuf,
    pub sampling: SamplingPolicy,
    pub video_tools: VideoTools,
    pub metadata_score: f64,
    pub weights: FusionWeights,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let model_path = file
            .model_path
            .map(PathBuf::from)
            .or_else(|| cli.model_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH));

        if file.model_input_size == Some(0) {
            bail!("model_input_size must be greater than 0");
        }

        let reports_dir = file
            .reports_dir
            .map(PathBuf::from)
            .or_else(|| cli.reports_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORTS_DIR));

        let sampling = match file.sampling.as_deref() {
            Some(name) => SamplingPolicy::from_name(name)
                .ok_or_else(|| anyhow!("Unknown sampling policy: {:?}", name))?,
            None => cli.sampling.unwrap_or_default(),
        };
        let sampling = apply_sampling_params(sampling, file.stride_every_n, file.sample_count)?;

        let defaults = VideoTools::default();
        let video_tools = VideoTools {
            ffmpeg: file.ffmpeg_path.map(PathBuf::from).unwrap_or(defaults.ffmpeg),
            ffprobe: file
                .ffprobe_path
                .map(PathBuf::from)
                .unwrap_or(defaults.ffprobe),
        };

        let metadata_score = file.metadata_score.unwrap_or(STATIC_METADATA_SCORE);
        if !(0.0..=1.0).contains(&metadata_score) {
            bail!("metadata_score must be within [0, 1], got {}", metadata_score);
        }

        // Missing [fusion] entries keep their default weight
        let fusion = file.fusion.unwrap_or_default();
        let default_weights = FusionWeights::default();
        let weights = FusionWeights::new(
            fusion.ai.unwrap_or(default_weights.ai),
            fusion.metadata.unwrap_or(default_weights.metadata),
            fusion.verification.unwrap_or(default_weights.verification),
        )
        .context("Invalid [fusion] weights")?;

        Ok(Self {
            model_path,
            model_input_size: file.model_input_size,
            reports_dir,
            sampling,
            video_tools,
            metadata_score,
            weights,
        })
    }

    pub fn model_config(&self) -> ModelConfig {
        let config = ModelConfig::new(&self.model_path);
        match self.model_input_size {
            Some(size) => config.with_input_size(size),
            None => config,
        }
    }

    pub fn sampler(&self) -> Box<dyn FrameSampler> {
        self.sampling.build(self.video_tools.clone())
    }

    pub fn metadata_scorer(&self) -> StaticMetadataScore {
        StaticMetadataScore(self.metadata_score)
    }
}

/// Replace the policy's default parameter with the configured one, if any.
fn apply_sampling_params(
    policy: SamplingPolicy,
    stride_every_n: Option<u32>,
    sample_count: Option<u32>,
) -> Result<SamplingPolicy> {
    if stride_every_n == Some(0) {
        bail!("stride_every_n must be greater than 0");
    }
    if sample_count == Some(0) {
        bail!("sample_count must be greater than 0");
    }

    Ok(match policy {
        SamplingPolicy::FixedStride { every_n } => SamplingPolicy::FixedStride {
            every_n: stride_every_n.unwrap_or(every_n),
        },
        SamplingPolicy::FixedCount { num_frames } => SamplingPolicy::FixedCount {
            num_frames: sample_count.unwrap_or(num_frames),
        },
    })
}
