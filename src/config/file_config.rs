use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct FileConfig {
    // Model (can override CLI)
    pub model_path: Option<String>,
    pub model_input_size: Option<u32>,

    // Storage (can override CLI)
    pub reports_dir: Option<String>,

    // Video sampling
    /// "stride" or "count"
    pub sampling: Option<String>,
    pub stride_every_n: Option<u32>,
    pub sample_count: Option<u32>,
    pub ffmpeg_path: Option<String>,
    pub ffprobe_path: Option<String>,

    // Fusion
    pub metadata_score: Option<f64>,
    pub fusion: Option<FusionConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct FusionConfig {
    pub ai: Option<f64>,
    pub metadata: Option<f64>,
    pub verification: Option<f64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
