//! Core types for media scoring.

use std::fmt;
use std::path::Path;

use crate::NEUTRAL_SCORE;

/// The kind of media a file holds, decided by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }

    /// Map a file extension (without the dot, any case) to a media kind.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" | "png" => Some(MediaKind::Image),
            "mp4" | "avi" | "mov" | "mkv" => Some(MediaKind::Video),
            _ => None,
        }
    }

    /// Map a path to a media kind using its extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a score fell back to [`NEUTRAL_SCORE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FallbackReason {
    /// No model was loaded at startup.
    ModelUnavailable,
    /// The image could not be decoded.
    DecodeFailed,
    /// The classifier returned an error for at least one sample.
    InferenceFailed,
    /// The video yielded no frames (unreadable or empty).
    NoFrames,
}

impl FallbackReason {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackReason::ModelUnavailable => "model_unavailable",
            FallbackReason::DecodeFailed => "decode_failed",
            FallbackReason::InferenceFailed => "inference_failed",
            FallbackReason::NoFrames => "no_frames",
        }
    }
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a scoring step.
///
/// `Normal` carries a real probability in [0,1] and how many samples went
/// into it. `Fallback` always reads as [`NEUTRAL_SCORE`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scored {
    Normal { score: f64, samples: usize },
    Fallback(FallbackReason),
}

impl Scored {
    /// A normal score from a single sample.
    pub fn single(score: f64) -> Self {
        Scored::Normal { score, samples: 1 }
    }

    /// The score value, neutral for fallbacks.
    pub fn value(&self) -> f64 {
        match self {
            Scored::Normal { score, .. } => *score,
            Scored::Fallback(_) => NEUTRAL_SCORE,
        }
    }

    /// Number of samples that contributed (0 for fallbacks).
    pub fn samples(&self) -> usize {
        match self {
            Scored::Normal { samples, .. } => *samples,
            Scored::Fallback(_) => 0,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Scored::Fallback(_))
    }

    pub fn fallback_reason(&self) -> Option<FallbackReason> {
        match self {
            Scored::Normal { .. } => None,
            Scored::Fallback(reason) => Some(*reason),
        }
    }
}
