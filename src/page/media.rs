use std::path::{Path, PathBuf};

use crate::foundation::error::{ReviewError, ReviewResult};
use crate::page::headless::AssetResolver;
use crate::page::viewer::VideoViewer;
use crate::render::composite::premultiply_in_place;
use crate::render::frame::FrameRGBA;

#[derive(Clone, Debug)]
pub struct VideoSourceInfo {
    pub source_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub fps_num: u32,
    pub fps_den: u32,
    pub duration_sec: f64,
}

impl VideoSourceInfo {
    pub fn source_fps(&self) -> f64 {
        if self.fps_den == 0 {
            0.0
        } else {
            f64::from(self.fps_num) / f64::from(self.fps_den)
        }
    }

    /// Clamp a seek target into the playable range.
    pub fn clamp_time(&self, seconds: f64) -> f64 {
        let t = if seconds.is_finite() { seconds } else { 0.0 };
        if self.duration_sec > 0.0 {
            t.clamp(0.0, self.duration_sec)
        } else {
            t.max(0.0)
        }
    }
}

#[cfg(feature = "media-ffmpeg")]
pub fn probe_video(source_path: &Path) -> ReviewResult<VideoSourceInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        r_frame_rate: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let out = std::process::Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| ReviewError::asset(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(ReviewError::asset(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| ReviewError::asset(format!("ffprobe json parse failed: {e}")))?;
    let stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| ReviewError::asset("no video stream found"))?;
    let width = stream
        .width
        .ok_or_else(|| ReviewError::asset("missing video width from ffprobe"))?;
    let height = stream
        .height
        .ok_or_else(|| ReviewError::asset("missing video height from ffprobe"))?;
    let (fps_num, fps_den) = parse_ff_ratio(stream.r_frame_rate.as_deref().unwrap_or("0/1"))
        .ok_or_else(|| ReviewError::asset("invalid video r_frame_rate"))?;
    let duration_sec = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_ref())
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);

    Ok(VideoSourceInfo {
        source_path: source_path.to_path_buf(),
        width,
        height,
        fps_num,
        fps_den,
        duration_sec,
    })
}

#[cfg(not(feature = "media-ffmpeg"))]
pub fn probe_video(_source_path: &Path) -> ReviewResult<VideoSourceInfo> {
    Err(ReviewError::asset(
        "video assets require the 'media-ffmpeg' feature",
    ))
}

/// Decode the frame shown at `time_sec` as straight RGBA8.
#[cfg(feature = "media-ffmpeg")]
pub fn decode_video_frame_rgba8(source: &VideoSourceInfo, time_sec: f64) -> ReviewResult<Vec<u8>> {
    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-ss", &format!("{time_sec:.9}")])
        .arg("-i")
        .arg(&source.source_path)
        .args([
            "-frames:v",
            "1",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "pipe:1",
        ])
        .output()
        .map_err(|e| ReviewError::asset(format!("failed to run ffmpeg for video decode: {e}")))?;

    if !out.status.success() {
        return Err(ReviewError::asset(format!(
            "ffmpeg video decode failed for '{}': {}",
            source.source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let expected_len = source.width as usize * source.height as usize * 4;
    if expected_len == 0 {
        return Err(ReviewError::asset(
            "decoded video frame size is zero (invalid source dimensions)",
        ));
    }
    if out.stdout.len() < expected_len {
        return Err(ReviewError::asset(format!(
            "ffmpeg returned no video frame for '{}' at {time_sec:.3}s",
            source.source_path.display()
        )));
    }
    Ok(out.stdout[..expected_len].to_vec())
}

#[cfg(not(feature = "media-ffmpeg"))]
pub fn decode_video_frame_rgba8(
    _source: &VideoSourceInfo,
    _time_sec: f64,
) -> ReviewResult<Vec<u8>> {
    Err(ReviewError::asset(
        "video assets require the 'media-ffmpeg' feature",
    ))
}

/// Parse an ffprobe ratio such as `"30000/1001"`.
pub fn parse_ff_ratio(s: &str) -> Option<(u32, u32)> {
    let mut parts = s.split('/');
    let a = parts.next()?.trim().parse::<u32>().ok()?;
    let b = parts.next()?.trim().parse::<u32>().ok()?;
    if b == 0 {
        return None;
    }
    Some((a, b))
}

/// Video viewer backed by `ffprobe`/`ffmpeg` subprocesses. Seeks are synchronous; the frame at the
/// current position is decoded lazily and cached until the next seek.
#[derive(Debug)]
pub struct FfmpegVideoViewer {
    resolver: AssetResolver,
    source: Option<VideoSourceInfo>,
    time: f64,
    cached: Option<FrameRGBA>,
}

impl FfmpegVideoViewer {
    pub fn new(resolver: AssetResolver) -> Self {
        Self {
            resolver,
            source: None,
            time: 0.0,
            cached: None,
        }
    }

    pub fn source(&self) -> Option<&VideoSourceInfo> {
        self.source.as_ref()
    }
}

impl VideoViewer for FfmpegVideoViewer {
    fn load(&mut self, src: &str) -> ReviewResult<()> {
        self.source = None;
        self.cached = None;
        self.time = 0.0;

        let path = self.resolver.resolve(src)?;
        if !path.is_file() {
            return Err(ReviewError::asset(format!(
                "video not found: '{}'",
                path.display()
            )));
        }
        let info = probe_video(&path)?;
        tracing::debug!(
            path = %path.display(),
            info.width,
            info.height,
            fps = info.source_fps(),
            duration = info.duration_sec,
            "video loaded"
        );
        self.source = Some(info);
        Ok(())
    }

    fn seek(&mut self, seconds: f64) -> ReviewResult<()> {
        let source = self
            .source
            .as_ref()
            .ok_or_else(|| ReviewError::protocol("no video loaded"))?;
        let t = source.clamp_time(seconds);
        if t != self.time {
            self.cached = None;
        }
        self.time = t;
        Ok(())
    }

    fn current_time(&self) -> f64 {
        self.time
    }

    fn frame_rate(&self) -> Option<f64> {
        self.source
            .as_ref()
            .map(VideoSourceInfo::source_fps)
            .filter(|r| *r > 0.0)
    }

    fn current_frame(&mut self) -> ReviewResult<Option<FrameRGBA>> {
        let Some(source) = &self.source else {
            return Ok(None);
        };
        if self.cached.is_none() {
            let mut data = decode_video_frame_rgba8(source, self.time)?;
            premultiply_in_place(&mut data);
            self.cached = Some(FrameRGBA {
                width: source.width,
                height: source.height,
                data,
                premultiplied: true,
            });
        }
        Ok(self.cached.clone())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/page/media.rs"]
mod tests;
