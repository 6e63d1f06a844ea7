//! Media scoring.
//!
//! [`MediaScorer`] dispatches a file by its extension, drives the frame
//! sampler and classifier adapter, and aggregates sample scores into one AI
//! score. Scoring trouble never becomes an error: it degrades to
//! [`Scored::Fallback`] so a report can always be produced.
//!
//! # Example
//!
//! ```no_run
//! use deepcheck::{ClassifierAdapter, MediaScorer, SamplingPolicy, VideoTools};
//!
//! let scorer = MediaScorer::new(
//!     ClassifierAdapter::unavailable(224),
//!     SamplingPolicy::stride().build(VideoTools::default()),
//! );
//!
//! // No model loaded: every supported file scores exactly 0.5
//! assert_eq!(scorer.score_media("photo.jpg").unwrap().value(), 0.5);
//! ```

mod types;

pub use types::{FallbackReason, MediaKind, Scored};

use std::path::Path;

use image::{ImageReader, RgbImage};
use tracing::{debug, info, warn};

use crate::classifier::{preprocess, ClassifierAdapter};
use crate::video::FrameSampler;
use crate::Error;

/// Scores images and videos with an injected classifier and sampler.
pub struct MediaScorer {
    classifier: ClassifierAdapter,
    sampler: Box<dyn FrameSampler>,
}

impl MediaScorer {
    pub fn new(classifier: ClassifierAdapter, sampler: Box<dyn FrameSampler>) -> Self {
        Self {
            classifier,
            sampler,
        }
    }

    pub fn classifier(&self) -> &ClassifierAdapter {
        &self.classifier
    }

    pub fn sampler(&self) -> &dyn FrameSampler {
        self.sampler.as_ref()
    }

    /// Score the file at `path`.
    ///
    /// Returns [`Error::UnsupportedMedia`] for extensions that are neither
    /// image nor video; every other failure is reported as a fallback.
    pub fn score_media(&self, path: impl AsRef<Path>) -> Result<Scored, Error> {
        let path = path.as_ref();
        let kind = MediaKind::from_path(path)
            .ok_or_else(|| Error::UnsupportedMedia(path.display().to_string()))?;

        let scored = self.score_kind(path, kind);
        match scored {
            Scored::Normal { score, samples } => {
                info!("Scored {} {:?}: {:.3} over {} samples", kind, path, score, samples)
            }
            Scored::Fallback(reason) => {
                warn!("Scoring {} {:?} fell back to neutral: {}", kind, path, reason)
            }
        }
        Ok(scored)
    }

    /// Score a file whose kind is already known.
    pub fn score_kind(&self, path: &Path, kind: MediaKind) -> Scored {
        if !self.classifier.is_available() {
            return Scored::Fallback(FallbackReason::ModelUnavailable);
        }

        match kind {
            MediaKind::Image => self.score_image(path),
            MediaKind::Video => self.score_video(path),
        }
    }

    fn score_image(&self, path: &Path) -> Scored {
        let image = match decode_rgb(path) {
            Ok(img) => img,
            Err(e) => {
                warn!("Cannot decode image {:?}: {}", path, e);
                return Scored::Fallback(FallbackReason::DecodeFailed);
            }
        };

        let input = preprocess::to_input_tensor(&image, self.classifier.input_size());
        self.classifier.score(input)
    }

    fn score_video(&self, path: &Path) -> Scored {
        let size = self.classifier.input_size();
        let mut sum = 0.0;
        let mut samples = 0usize;

        // One frame at a time: decode, classify, then pull the next
        for frame in self.sampler.sample(path) {
            let input = preprocess::to_input_tensor(&frame.image, size);
            match self.classifier.score(input) {
                Scored::Normal { score, .. } => {
                    debug!("Frame {}: {:.4}", frame.index, score);
                    sum += score;
                    samples += 1;
                }
                fallback @ Scored::Fallback(_) => return fallback,
            }
        }

        if samples == 0 {
            return Scored::Fallback(FallbackReason::NoFrames);
        }

        Scored::Normal {
            score: sum / samples as f64,
            samples,
        }
    }
}

/// Decode by content rather than extension; uploads are often misnamed.
fn decode_rgb(path: &Path) -> Result<RgbImage, Error> {
    let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    Ok(image.to_rgb8())
}
