use std::{
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, Stdio},
};

use crate::{
    encode::sink::FrameSink,
    foundation::error::{ReviewError, ReviewResult},
    render::frame::FrameRGBA,
};

/// Size the encoder aims to keep a digest under.
pub const TARGET_SIZE_BYTES: u64 = 7 * 1024 * 1024;
pub const MIN_BITRATE: f64 = 500_000.0;
pub const MAX_BITRATE: f64 = 8_000_000.0;

/// Bits per second that fit `TARGET_SIZE_BYTES` into `duration_sec`, clamped to
/// `[MIN_BITRATE, MAX_BITRATE]`.
pub fn target_bitrate(duration_sec: f64) -> f64 {
    let max = (TARGET_SIZE_BYTES as f64 * 8.0) / duration_sec;
    if max.is_nan() {
        return MAX_BITRATE;
    }
    max.clamp(MIN_BITRATE, MAX_BITRATE)
}

/// ffmpeg rate string in whole kilobits, e.g. `"4194k"`.
pub fn bitrate_arg(bits_per_sec: f64) -> String {
    format!("{}k", (bits_per_sec / 1000.0).floor() as u64)
}

#[derive(Clone, Debug)]
pub struct EncodeConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub out_path: PathBuf,
    pub overwrite: bool,
    /// Rate cap in bits per second.
    pub max_bitrate: Option<f64>,
}

impl EncodeConfig {
    pub fn validate(&self) -> ReviewResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ReviewError::validation(
                "encode width/height must be non-zero",
            ));
        }
        if self.fps == 0 {
            return Err(ReviewError::validation("encode fps must be non-zero"));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            return Err(ReviewError::validation(
                "encode width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        Ok(())
    }

    /// Cap the bitrate for a video of `frame_count` frames.
    pub fn with_planned_frames(mut self, frame_count: u64) -> Self {
        let duration = frame_count as f64 / f64::from(self.fps.max(1));
        self.max_bitrate = Some(target_bitrate(duration));
        self
    }
}

pub fn default_mp4_config(
    out_path: impl Into<PathBuf>,
    width: u32,
    height: u32,
    fps: u32,
) -> EncodeConfig {
    EncodeConfig {
        width,
        height,
        fps,
        out_path: out_path.into(),
        overwrite: true,
        max_bitrate: None,
    }
}

pub fn is_ffmpeg_on_path() -> bool {
    std::process::Command::new("ffmpeg")
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn ensure_parent_dir(path: &Path) -> ReviewResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Streams frames into an `ffmpeg` child producing H.264 MP4.
pub struct FfmpegEncoder {
    cfg: EncodeConfig,
    bg_rgba: [u8; 4],
    child: Child,
    stdin: Option<ChildStdin>,
    scratch: Vec<u8>,
    frames: u64,
}

impl FfmpegEncoder {
    pub fn new(cfg: EncodeConfig, bg_rgba: [u8; 4]) -> ReviewResult<Self> {
        cfg.validate()?;
        ensure_parent_dir(&cfg.out_path)?;

        if !cfg.overwrite && cfg.out_path.exists() {
            return Err(ReviewError::validation(format!(
                "output file '{}' already exists",
                cfg.out_path.display()
            )));
        }

        if !is_ffmpeg_on_path() {
            return Err(ReviewError::render(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.arg(if cfg.overwrite { "-y" } else { "-n" });
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &cfg.fps.to_string(),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            "libx264",
            "-crf",
            "20",
        ]);
        if let Some(rate) = cfg.max_bitrate {
            cmd.args([
                "-maxrate",
                &bitrate_arg(rate),
                "-bufsize",
                &bitrate_arg(rate * 2.0),
            ]);
        }
        cmd.args(["-pix_fmt", "yuv420p", "-movflags", "+faststart"])
            .arg(&cfg.out_path);

        tracing::debug!(
            out = %cfg.out_path.display(),
            fps = cfg.fps,
            max_bitrate = ?cfg.max_bitrate.map(bitrate_arg),
            "spawning ffmpeg encoder"
        );
        let mut child = cmd.spawn().map_err(|e| {
            ReviewError::render(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ReviewError::render("failed to open ffmpeg stdin"))?;

        Ok(Self {
            scratch: vec![0u8; cfg.width as usize * cfg.height as usize * 4],
            cfg,
            bg_rgba,
            child,
            stdin: Some(stdin),
            frames: 0,
        })
    }

    pub fn encode_frame(&mut self, frame: &FrameRGBA) -> ReviewResult<()> {
        if frame.width != self.cfg.width || frame.height != self.cfg.height {
            return Err(ReviewError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, self.cfg.width, self.cfg.height
            )));
        }

        flatten_to_opaque_rgba8(
            &mut self.scratch,
            &frame.data,
            frame.premultiplied,
            self.bg_rgba,
        )?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(ReviewError::render("ffmpeg encoder is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(&self.scratch).map_err(|e| {
            ReviewError::render(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        self.frames += 1;
        Ok(())
    }

    /// Close the input and wait for ffmpeg. Returns the size of the written file in bytes.
    pub fn finish(mut self) -> ReviewResult<u64> {
        drop(self.stdin.take());

        let output = self.child.wait_with_output().map_err(|e| {
            ReviewError::render(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;

        if !output.status.success() {
            remove_partial(&self.cfg.out_path);
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ReviewError::render(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let size = std::fs::metadata(&self.cfg.out_path)
            .map(|m| m.len())
            .unwrap_or(0);
        tracing::info!(
            out = %self.cfg.out_path.display(),
            frames = self.frames,
            size_mib = size as f64 / (1024.0 * 1024.0),
            "video encoded"
        );
        Ok(size)
    }

    /// Stop ffmpeg without finalizing and delete whatever it wrote so far.
    pub fn abort(mut self) {
        drop(self.stdin.take());
        if let Err(e) = self.child.kill() {
            tracing::debug!(error = %e, "ffmpeg already exited");
        }
        if let Err(e) = self.child.wait() {
            tracing::warn!(error = %e, "failed to reap ffmpeg");
        }
        remove_partial(&self.cfg.out_path);
        tracing::info!(
            out = %self.cfg.out_path.display(),
            frames = self.frames,
            "video encoding aborted"
        );
    }
}

fn remove_partial(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "removed partial output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove partial output");
        }
    }
}

impl FrameSink for FfmpegEncoder {
    fn push_frame(&mut self, frame: &FrameRGBA) -> ReviewResult<()> {
        self.encode_frame(frame)
    }

    fn frames_written(&self) -> u64 {
        self.frames
    }
}

/// Composite `src` over an opaque background color.
pub fn flatten_to_opaque_rgba8(
    dst: &mut [u8],
    src: &[u8],
    src_is_premul: bool,
    bg_rgba: [u8; 4],
) -> ReviewResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(ReviewError::validation(
            "flatten_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    let [bg_r, bg_g, bg_b, _] = bg_rgba.map(u16::from);

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }

        let inv = 255 - a;
        let channel = |c: u8, bg: u16| {
            let c = if src_is_premul {
                u16::from(c)
            } else {
                mul_div255(u16::from(c), a)
            };
            (c + mul_div255(bg, inv)).min(255) as u8
        };

        d[0] = channel(s[0], bg_r);
        d[1] = channel(s[1], bg_g);
        d[2] = channel(s[2], bg_b);
        d[3] = 255;
    }

    Ok(())
}

fn mul_div255(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
