//! Fixed-stride sampling: every Nth frame of a sequential decode.

use std::io::Read;
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};

use image::RgbImage;
use tracing::{debug, warn};

use super::{probe, Frame, FrameSampler, VideoInfo, VideoTools};
use crate::Error;

/// Keeps frames `0, N, 2N, ...` until the stream ends.
///
/// Cost grows with video length; the frame count need not be known.
pub struct StrideSampler {
    tools: VideoTools,
    every_n: u32,
}

impl StrideSampler {
    pub fn new(tools: VideoTools, every_n: u32) -> Self {
        Self {
            tools,
            every_n: every_n.max(1),
        }
    }

    pub fn every_n(&self) -> u32 {
        self.every_n
    }
}

impl FrameSampler for StrideSampler {
    fn name(&self) -> &'static str {
        "fixed_stride"
    }

    fn sample<'a>(&'a self, path: &Path) -> Box<dyn Iterator<Item = Frame> + 'a> {
        match StrideFrames::open(&self.tools, path, self.every_n) {
            Ok(frames) => Box::new(frames),
            Err(e) => {
                warn!("Cannot open video {:?}: {}", path, e);
                Box::new(std::iter::empty())
            }
        }
    }
}

/// Streams selected frames out of a running ffmpeg process.
struct StrideFrames {
    child: Child,
    stdout: ChildStdout,
    info: VideoInfo,
    every_n: u64,
    emitted: u64,
    done: bool,
}

impl StrideFrames {
    fn open(tools: &VideoTools, path: &Path, every_n: u32) -> Result<Self, Error> {
        let info = probe(tools, path)?;

        let mut child = Command::new(&tools.ffmpeg)
            .args(["-v", "error", "-nostdin", "-i"])
            .arg(path)
            .args([
                "-vf",
                &format!("select=not(mod(n\\,{}))", every_n),
                "-vsync",
                "0",
                "-an",
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgb24",
                "pipe:1",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let stdout = match child.stdout.take() {
            Some(stdout) => stdout,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(Error::Probe("ffmpeg stdout unavailable".to_string()));
            }
        };

        let (width, height) = info.frame_size();
        debug!(
            "Decoding {:?} ({}x{}, rotated {}), keeping every {} frames",
            path, width, height, info.rotation, every_n
        );

        Ok(Self {
            child,
            stdout,
            info,
            every_n: u64::from(every_n),
            emitted: 0,
            done: false,
        })
    }
}

impl Iterator for StrideFrames {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        if self.done {
            return None;
        }

        let (width, height) = self.info.frame_size();
        let mut buf = vec![0u8; self.info.frame_bytes()];
        let image = match self.stdout.read_exact(&mut buf) {
            Ok(()) => RgbImage::from_raw(width, height, buf),
            Err(_) => None,
        };

        let Some(image) = image else {
            self.done = true;
            let _ = self.child.wait();
            return None;
        };

        let index = self.emitted * self.every_n;
        self.emitted += 1;
        Some(Frame { index, image })
    }
}

impl Drop for StrideFrames {
    fn drop(&mut self) {
        if !self.done {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}
