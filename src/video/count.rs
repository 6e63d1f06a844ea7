//! Fixed-count sampling: a bounded number of evenly spaced frames.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::vec;

use image::RgbImage;
use tracing::{debug, warn};

use super::{evenly_spaced_indices, probe, Frame, FrameSampler, VideoInfo, VideoTools};
use crate::Error;

/// Seeks to `num_frames` indices spread across the whole video.
///
/// Cost is bounded regardless of video length.
pub struct CountSampler {
    tools: VideoTools,
    num_frames: u32,
}

impl CountSampler {
    pub fn new(tools: VideoTools, num_frames: u32) -> Self {
        Self { tools, num_frames }
    }

    pub fn num_frames(&self) -> u32 {
        self.num_frames
    }

    /// Indices this sampler would read for a video reporting `frame_count`.
    ///
    /// A missing, zero or negative count falls back to `num_frames`.
    pub fn plan(&self, frame_count: Option<i64>) -> Vec<u64> {
        let total = frame_count
            .filter(|n| *n > 0)
            .map(|n| n as u64)
            .unwrap_or(u64::from(self.num_frames));
        evenly_spaced_indices(total, self.num_frames)
    }
}

impl FrameSampler for CountSampler {
    fn name(&self) -> &'static str {
        "fixed_count"
    }

    fn sample<'a>(&'a self, path: &Path) -> Box<dyn Iterator<Item = Frame> + 'a> {
        let info = match probe(&self.tools, path) {
            Ok(info) => info,
            Err(e) => {
                warn!("Cannot open video {:?}: {}", path, e);
                return Box::new(std::iter::empty());
            }
        };

        let indices = self.plan(info.frame_count);
        debug!(
            "Sampling {:?} at {:?} (reported {:?} frames)",
            path, indices, info.frame_count
        );

        Box::new(CountFrames {
            tools: &self.tools,
            path: path.to_path_buf(),
            info,
            indices: indices.into_iter(),
            done: false,
        })
    }
}

struct CountFrames<'a> {
    tools: &'a VideoTools,
    path: PathBuf,
    info: VideoInfo,
    indices: vec::IntoIter<u64>,
    done: bool,
}

impl Iterator for CountFrames<'_> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        if self.done {
            return None;
        }
        let index = self.indices.next()?;

        match read_frame_at(self.tools, &self.path, &self.info, index) {
            Ok(image) => Some(Frame { index, image }),
            Err(e) => {
                warn!("Stopping early at frame {} of {:?}: {}", index, self.path, e);
                self.done = true;
                None
            }
        }
    }
}

/// Decode exactly one frame at `index`.
fn read_frame_at(
    tools: &VideoTools,
    path: &Path,
    info: &VideoInfo,
    index: u64,
) -> Result<RgbImage, Error> {
    let mut cmd = Command::new(&tools.ffmpeg);
    cmd.args(["-v", "error", "-nostdin"]);

    match info.fps {
        Some(fps) => {
            // Input-side seek: jumps to the nearest keyframe, then decodes forward
            let ts = index as f64 / fps;
            cmd.args(["-ss", &format!("{:.6}", ts), "-i"]).arg(path);
        }
        None => {
            cmd.arg("-i").arg(path).args([
                "-vf",
                &format!("select=eq(n\\,{})", index),
                "-vsync",
                "0",
            ]);
        }
    }

    let output = cmd
        .args([
            "-frames:v", "1", "-an", "-f", "rawvideo", "-pix_fmt", "rgb24", "pipe:1",
        ])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Probe(stderr.trim().to_string()));
    }

    let expected = info.frame_bytes();
    if output.stdout.len() < expected {
        return Err(Error::Probe(format!(
            "Short frame read: got {} of {} bytes",
            output.stdout.len(),
            expected
        )));
    }

    let mut bytes = output.stdout;
    bytes.truncate(expected);
    let (width, height) = info.frame_size();
    RgbImage::from_raw(width, height, bytes)
        .ok_or_else(|| Error::Probe("Frame buffer does not match dimensions".to_string()))
}
