//! Video stream metadata via ffprobe.

use std::path::Path;
use std::process::{Command, Stdio};

use serde::Deserialize;

use super::VideoTools;
use crate::Error;

/// What we need to know about a video before decoding it.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    /// Total frames as reported, or estimated from duration and frame rate.
    /// May be zero or negative for corrupt containers.
    pub frame_count: Option<i64>,
    /// Frames per second, when known.
    pub fps: Option<f64>,
    /// Display rotation in degrees, normalized to `[0, 360)`.
    pub rotation: i32,
}

impl VideoInfo {
    /// Width and height of decoded frames.
    ///
    /// ffmpeg applies the display rotation while decoding, so a quarter turn
    /// swaps the stored dimensions.
    pub fn frame_size(&self) -> (u32, u32) {
        match self.rotation {
            90 | 270 => (self.height, self.width),
            _ => (self.width, self.height),
        }
    }

    /// Size in bytes of one `rgb24` frame.
    pub fn frame_bytes(&self) -> usize {
        let (width, height) = self.frame_size();
        width as usize * height as usize * 3
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    width: Option<u32>,
    height: Option<u32>,
    nb_frames: Option<String>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
    duration: Option<String>,
    #[serde(default)]
    side_data_list: Vec<FfprobeSideData>,
    tags: Option<FfprobeTags>,
}

/// Newer ffprobe reports rotation in the display matrix side data.
#[derive(Debug, Deserialize)]
struct FfprobeSideData {
    rotation: Option<serde_json::Value>,
}

/// Older ffprobe reports it as a `rotate` tag.
#[derive(Debug, Deserialize)]
struct FfprobeTags {
    rotate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Probe the first video stream of `path`.
pub fn probe(tools: &VideoTools, path: &Path) -> Result<VideoInfo, Error> {
    let output = Command::new(&tools.ffprobe)
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,nb_frames,avg_frame_rate,r_frame_rate,duration\
             :stream_tags=rotate:stream_side_data=rotation:format=duration",
            "-of",
            "json",
        ])
        .arg(path)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Probe(stderr.trim().to_string()));
    }

    parse_probe_output(&String::from_utf8_lossy(&output.stdout))
}

fn parse_probe_output(json: &str) -> Result<VideoInfo, Error> {
    let probe: FfprobeOutput = serde_json::from_str(json)?;

    let stream = probe
        .streams
        .first()
        .ok_or_else(|| Error::Probe("No video stream found".to_string()))?;

    let (width, height) = match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err(Error::Probe("Video stream has no dimensions".to_string())),
    };

    let fps = stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_rate)
        .or_else(|| stream.r_frame_rate.as_deref().and_then(parse_rate));

    let duration = stream
        .duration
        .as_deref()
        .or_else(|| probe.format.as_ref().and_then(|f| f.duration.as_deref()))
        .and_then(|d| d.parse::<f64>().ok());

    // Containers like mkv carry no frame count; estimate it the way players do
    let frame_count = stream
        .nb_frames
        .as_deref()
        .and_then(|n| n.parse::<i64>().ok())
        .or_else(|| match (duration, fps) {
            (Some(d), Some(f)) => Some((d * f).round() as i64),
            _ => None,
        });

    let rotation = stream
        .side_data_list
        .iter()
        .find_map(|side| match &side.rotation {
            Some(serde_json::Value::Number(n)) => n.as_f64(),
            Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        })
        .or_else(|| {
            stream
                .tags
                .as_ref()
                .and_then(|t| t.rotate.as_deref())
                .and_then(|r| r.trim().parse().ok())
        })
        .map(normalize_rotation)
        .unwrap_or(0);

    Ok(VideoInfo {
        width,
        height,
        frame_count,
        fps,
        rotation,
    })
}

fn normalize_rotation(degrees: f64) -> i32 {
    (degrees.round() as i32).rem_euclid(360)
}

/// Parse an ffprobe rational such as `30000/1001`.
fn parse_rate(rate: &str) -> Option<f64> {
    let (num, den) = rate.split_once('/')?;
    let num: f64 = num.trim().parse().ok()?;
    let den: f64 = den.trim().parse().ok()?;
    if den == 0.0 || num <= 0.0 {
        return None;
    }
    Some(num / den)
}
