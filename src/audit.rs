//! Single-upload audit pipeline.
//!
//! Scores the file, hashes it, asks the chain verifier about the hash, fuses
//! the signals and persists the resulting [`Report`].

use std::path::Path;

use tracing::{debug, info};

use crate::fusion::{FusionWeights, MetadataScorer, StaticMetadataScore};
use crate::hash::sha256_file;
use crate::report::{Report, ReportStore};
use crate::scoring::{MediaKind, MediaScorer, Scored};
use crate::verify::{ChainVerifier, NullVerifier};
use crate::Error;

/// Result of auditing one file.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditOutcome {
    pub report: Report,
    /// Storage key the report was written under.
    pub key: String,
    /// Unrounded AI score, including why it fell back if it did.
    pub scored: Scored,
}

/// Runs the full pipeline for one uploaded file.
pub struct Auditor {
    scorer: MediaScorer,
    metadata: Box<dyn MetadataScorer>,
    verifier: Box<dyn ChainVerifier>,
    weights: FusionWeights,
    store: ReportStore,
}

impl Auditor {
    /// Auditor with the static metadata score, the null verifier and default weights.
    pub fn new(scorer: MediaScorer, store: ReportStore) -> Self {
        Self {
            scorer,
            metadata: Box::new(StaticMetadataScore::default()),
            verifier: Box::new(NullVerifier),
            weights: FusionWeights::default(),
            store,
        }
    }

    pub fn with_metadata<M: MetadataScorer + 'static>(mut self, metadata: M) -> Self {
        self.metadata = Box::new(metadata);
        self
    }

    pub fn with_verifier<V: ChainVerifier + 'static>(mut self, verifier: V) -> Self {
        self.verifier = Box::new(verifier);
        self
    }

    pub fn with_weights(mut self, weights: FusionWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn scorer(&self) -> &MediaScorer {
        &self.scorer
    }

    pub fn store(&self) -> &ReportStore {
        &self.store
    }

    /// Audit the file at `path` and write its report.
    ///
    /// Unsupported media is rejected before any work is done. Scoring
    /// problems never fail the audit; hashing and storage errors do.
    pub fn audit(&self, path: impl AsRef<Path>) -> Result<AuditOutcome, Error> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| Error::UnsupportedMedia(path.display().to_string()))?;

        let kind = MediaKind::from_path(path)
            .ok_or_else(|| Error::UnsupportedMedia(path.display().to_string()))?;

        info!("Auditing {} {:?}", kind, path);

        let scored = self.scorer.score_media(path)?;
        let ai_score = scored.value();

        let hash = sha256_file(path)?;
        let verified = self.verifier.verify(&hash);
        let metadata_score = self.metadata.score(path);
        debug!(
            "Signals for {}: ai={:.4} metadata={:.3} verified={} ({} / {})",
            name,
            ai_score,
            metadata_score,
            verified,
            self.metadata.name(),
            self.verifier.name()
        );

        let authenticity = self.weights.fuse(ai_score, metadata_score, verified);
        let report = Report::new(&name, ai_score, verified, authenticity, hash);
        let key = self.store.write(&report)?;

        info!(
            "Audit of {} done: ai={:.3} authenticity={:.3} key={}",
            report.file, report.ai_score, report.authenticity_score, key
        );

        Ok(AuditOutcome {
            report,
            key,
            scored,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{Classifier, ClassifierAdapter};
    use crate::scoring::FallbackReason;
    use crate::video::{Frame, FrameSampler};
    use image::{Rgb, RgbImage};
    use ndarray::Array4;

    struct Fixed(f32);

    impl Classifier for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn input_size(&self) -> u32 {
            4
        }

        fn predict(&self, _input: Array4<f32>) -> Result<f32, Error> {
            Ok(self.0)
        }
    }

    struct NoFrames;

    impl FrameSampler for NoFrames {
        fn name(&self) -> &'static str {
            "none"
        }

        fn sample<'a>(&'a self, _path: &Path) -> Box<dyn Iterator<Item = Frame> + 'a> {
            Box::new(std::iter::empty())
        }
    }

    struct TwoFrames;

    impl FrameSampler for TwoFrames {
        fn name(&self) -> &'static str {
            "two"
        }

        fn sample<'a>(&'a self, _path: &Path) -> Box<dyn Iterator<Item = Frame> + 'a> {
            Box::new((0..2).map(|i| Frame {
                index: i,
                image: RgbImage::from_pixel(4, 4, Rgb([0, 0, 0])),
            }))
        }
    }

    struct AlwaysVerified;

    impl ChainVerifier for AlwaysVerified {
        fn name(&self) -> &'static str {
            "always"
        }

        fn verify(&self, _hash: &str) -> bool {
            true
        }
    }

    fn fixed(score: f32) -> ClassifierAdapter {
        ClassifierAdapter::new(Fixed(score))
    }

    fn auditor<S: FrameSampler + 'static>(
        adapter: ClassifierAdapter,
        sampler: S,
        dir: &Path,
    ) -> Auditor {
        let store = ReportStore::open(dir.join("reports")).unwrap();
        Auditor::new(MediaScorer::new(adapter, Box::new(sampler)), store)
    }

    fn write_png(dir: &Path, name: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        RgbImage::from_pixel(8, 8, Rgb([120, 30, 30])).save(&path).unwrap();
        path
    }

    #[test]
    fn test_audit_image_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "my photo.png");
        let auditor = auditor(fixed(0.0), NoFrames, dir.path());

        let outcome = auditor.audit(&path).unwrap();
        assert_eq!(outcome.report.file, "my_photo.png");
        assert_eq!(outcome.report.ai_score, 0.0);
        assert!(!outcome.report.blockchain_verified);
        assert_eq!(outcome.report.authenticity_score, 0.84);
        assert_eq!(outcome.report.hash, sha256_file(&path).unwrap());

        let stored: Vec<_> = auditor.store().read_all().unwrap().collect();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].key, outcome.key);
        assert_eq!(stored[0].report, outcome.report);
    }

    #[test]
    fn test_audit_with_verifier() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "fake.png");
        let auditor = auditor(fixed(1.0), NoFrames, dir.path())
            .with_verifier(AlwaysVerified);

        let outcome = auditor.audit(&path).unwrap();
        assert!(outcome.report.blockchain_verified);
        assert_eq!(outcome.report.authenticity_score, 0.34);
    }

    #[test]
    fn test_audit_custom_weights_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "a.png");
        let auditor = auditor(fixed(0.5), NoFrames, dir.path())
            .with_weights(FusionWeights::new(0.5, 0.5, 0.0).unwrap())
            .with_metadata(StaticMetadataScore(1.0));

        let outcome = auditor.audit(&path).unwrap();
        assert_eq!(outcome.report.authenticity_score, 0.75);
    }

    #[test]
    fn test_audit_without_model_is_neutral() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "a.png");
        let auditor = auditor(ClassifierAdapter::unavailable(224), NoFrames, dir.path());

        let outcome = auditor.audit(&path).unwrap();
        assert_eq!(outcome.report.ai_score, 0.5);
        assert_eq!(
            outcome.scored.fallback_reason(),
            Some(FallbackReason::ModelUnavailable)
        );
        // 0.6 * 0.5 + 0.3 * 0.8
        assert_eq!(outcome.report.authenticity_score, 0.54);
    }

    #[test]
    fn test_audit_video_mean() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, b"not really a video").unwrap();
        let auditor = auditor(fixed(0.25), TwoFrames, dir.path());

        let outcome = auditor.audit(&path).unwrap();
        assert_eq!(outcome.scored.samples(), 2);
        assert_eq!(outcome.report.ai_score, 0.25);
    }

    #[test]
    fn test_audit_empty_video_is_neutral() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.mov");
        std::fs::write(&path, b"").unwrap();
        let auditor = auditor(fixed(0.9), NoFrames, dir.path());

        let outcome = auditor.audit(&path).unwrap();
        assert_eq!(outcome.report.ai_score, 0.5);
        assert_eq!(outcome.scored.fallback_reason(), Some(FallbackReason::NoFrames));
    }

    #[test]
    fn test_audit_rejects_unsupported_before_work() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();
        let auditor = auditor(fixed(0.1), NoFrames, dir.path());

        assert!(matches!(auditor.audit(&path), Err(Error::UnsupportedMedia(_))));
        assert_eq!(auditor.store().read_all().unwrap().count(), 0);
    }

    #[test]
    fn test_audit_missing_file_fails_on_hash() {
        let dir = tempfile::tempdir().unwrap();
        let auditor = auditor(ClassifierAdapter::unavailable(224), NoFrames, dir.path());

        let result = auditor.audit(dir.path().join("gone.jpg"));
        assert!(matches!(result, Err(Error::Io(_))));
        assert_eq!(auditor.store().read_all().unwrap().count(), 0);
    }
}
