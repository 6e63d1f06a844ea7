//! Authenticity score fusion.
//!
//! The AI score is a probability of "fake", so `1 - ai_score` is its
//! contribution to authenticity. It is weighted highest as the most direct
//! signal; metadata integrity and chain-of-custody verification fill the rest.

use std::path::Path;

use crate::Error;

/// Metadata score used until a real metadata analysis exists.
pub const STATIC_METADATA_SCORE: f64 = 0.8;

const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Linear weights of the three authenticity signals. Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionWeights {
    pub ai: f64,
    pub metadata: f64,
    pub verification: f64,
}

impl FusionWeights {
    pub const DEFAULT: FusionWeights = FusionWeights {
        ai: 0.6,
        metadata: 0.3,
        verification: 0.1,
    };

    /// Build weights, rejecting negative values or a sum other than 1.0.
    pub fn new(ai: f64, metadata: f64, verification: f64) -> Result<Self, Error> {
        let weights = Self {
            ai,
            metadata,
            verification,
        };
        weights.validate()?;
        Ok(weights)
    }

    pub fn validate(&self) -> Result<(), Error> {
        let parts = [self.ai, self.metadata, self.verification];
        if parts.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(Error::Config(format!(
                "Fusion weights must be non-negative: {:?}",
                self
            )));
        }
        let sum: f64 = parts.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(Error::Config(format!(
                "Fusion weights must sum to 1.0, got {}",
                sum
            )));
        }
        Ok(())
    }

    /// Combine the signals into an authenticity score in [0,1].
    ///
    /// Full precision; rounding happens when the report is built.
    pub fn fuse(&self, ai_score: f64, metadata_score: f64, verified: bool) -> f64 {
        let verified = if verified { 1.0 } else { 0.0 };
        self.ai * (1.0 - ai_score) + self.metadata * metadata_score + self.verification * verified
    }
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Fuse with the default 0.6 / 0.3 / 0.1 weights.
pub fn fuse(ai_score: f64, metadata_score: f64, verified: bool) -> f64 {
    FusionWeights::DEFAULT.fuse(ai_score, metadata_score, verified)
}

/// Source of the metadata integrity score for a file.
pub trait MetadataScorer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Score in [0,1]; higher means the file's metadata looks more trustworthy.
    fn score(&self, path: &Path) -> f64;
}

/// Returns the same score for every file.
///
/// Metadata analysis is not implemented yet; this keeps the fusion formula's
/// shape intact in the meantime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticMetadataScore(pub f64);

impl Default for StaticMetadataScore {
    fn default() -> Self {
        Self(STATIC_METADATA_SCORE)
    }
}

impl MetadataScorer for StaticMetadataScore {
    fn name(&self) -> &'static str {
        "static"
    }

    fn score(&self, _path: &Path) -> f64 {
        self.0.clamp(0.0, 1.0)
    }
}
