//! Video frame sampling.
//!
//! A [`FrameSampler`] turns a video file into a finite sequence of RGB
//! frames. Each call to [`FrameSampler::sample`] starts from scratch, so the
//! same video always yields the same frames. Two policies are available:
//!
//! - [`StrideSampler`]: decode sequentially, keep every Nth frame
//! - [`CountSampler`]: seek to a fixed number of evenly spaced frames
//!
//! Decoding is delegated to the `ffprobe`/`ffmpeg` executables. A video that
//! cannot be opened yields an empty sequence rather than an error.

mod count;
mod probe;
mod stride;

pub use count::CountSampler;
pub use probe::{probe, VideoInfo};
pub use stride::StrideSampler;

use std::fmt;
use std::path::{Path, PathBuf};

use image::RgbImage;

/// Default stride for [`SamplingPolicy::FixedStride`].
pub const DEFAULT_EVERY_N: u32 = 10;
/// Default sample count for [`SamplingPolicy::FixedCount`].
pub const DEFAULT_NUM_FRAMES: u32 = 8;

/// One decoded RGB frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Zero-based frame index within the source video.
    pub index: u64,
    pub image: RgbImage,
}

/// A source of sampled video frames.
pub trait FrameSampler: Send + Sync {
    /// The name of this sampler (for logging).
    fn name(&self) -> &'static str;

    /// Sample frames from the video at `path`.
    ///
    /// The returned sequence is lazy: frames are decoded as it is consumed.
    /// An unreadable video yields nothing. A read failure partway through
    /// ends the sequence early with whatever was produced so far.
    fn sample<'a>(&'a self, path: &Path) -> Box<dyn Iterator<Item = Frame> + 'a>;
}

/// Paths of the external decoding tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoTools {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Default for VideoTools {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

/// Which frames of a video get classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingPolicy {
    /// Every `every_n`-th decoded frame until end of stream.
    FixedStride { every_n: u32 },
    /// `num_frames` indices evenly spaced across the whole video.
    FixedCount { num_frames: u32 },
}

impl SamplingPolicy {
    pub fn stride() -> Self {
        SamplingPolicy::FixedStride {
            every_n: DEFAULT_EVERY_N,
        }
    }

    pub fn count() -> Self {
        SamplingPolicy::FixedCount {
            num_frames: DEFAULT_NUM_FRAMES,
        }
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SamplingPolicy::FixedStride { .. } => "stride",
            SamplingPolicy::FixedCount { .. } => "count",
        }
    }

    /// Parse a policy name, using default parameters.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "stride" | "fixed-stride" | "fixed_stride" => Some(Self::stride()),
            "count" | "fixed-count" | "fixed_count" => Some(Self::count()),
            _ => None,
        }
    }

    /// Build the sampler implementing this policy.
    pub fn build(self, tools: VideoTools) -> Box<dyn FrameSampler> {
        match self {
            SamplingPolicy::FixedStride { every_n } => Box::new(StrideSampler::new(tools, every_n)),
            SamplingPolicy::FixedCount { num_frames } => {
                Box::new(CountSampler::new(tools, num_frames))
            }
        }
    }
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        Self::count()
    }
}

impl fmt::Display for SamplingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SamplingPolicy::FixedStride { every_n } => write!(f, "stride(every {})", every_n),
            SamplingPolicy::FixedCount { num_frames } => write!(f, "count({})", num_frames),
        }
    }
}

/// `count` indices spread evenly over `[0, total - 1]`, rounded to nearest.
///
/// Indices may repeat when `total < count`.
pub fn evenly_spaced_indices(total: u64, count: u32) -> Vec<u64> {
    match count {
        0 => Vec::new(),
        1 => vec![0],
        _ => {
            let last = total.saturating_sub(1) as f64;
            let steps = f64::from(count - 1);
            (0..count)
                .map(|i| (last * f64::from(i) / steps).round() as u64)
                .collect()
        }
    }
}
