use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::foundation::error::{ReviewError, ReviewResult};
use crate::render::frame::FrameRGBA;

/// Consumer of rendered frames, in presentation order.
pub trait FrameSink {
    fn push_frame(&mut self, frame: &FrameRGBA) -> ReviewResult<()>;

    fn frames_written(&self) -> u64;
}

/// Keeps every frame in memory.
#[derive(Debug, Default)]
pub struct InMemorySink {
    pub frames: Vec<FrameRGBA>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameSink for InMemorySink {
    fn push_frame(&mut self, frame: &FrameRGBA) -> ReviewResult<()> {
        self.frames.push(frame.clone());
        Ok(())
    }

    fn frames_written(&self) -> u64 {
        self.frames.len() as u64
    }
}

/// Writes `frame_00000.png`, `frame_00001.png`, ... into a directory.
#[derive(Debug)]
pub struct PngSequenceSink {
    dir: PathBuf,
    next: u64,
}

impl PngSequenceSink {
    pub fn create(dir: impl Into<PathBuf>) -> ReviewResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create frame directory '{}'", dir.display()))?;
        Ok(Self { dir, next: 0 })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn frame_path(&self, index: u64) -> PathBuf {
        self.dir.join(format!("frame_{index:05}.png"))
    }
}

impl FrameSink for PngSequenceSink {
    fn push_frame(&mut self, frame: &FrameRGBA) -> ReviewResult<()> {
        let path = self.frame_path(self.next);
        frame
            .save_png(&path)
            .map_err(|e| ReviewError::render(format!("frame {}: {e}", self.next)))?;
        self.next += 1;
        Ok(())
    }

    fn frames_written(&self) -> u64 {
        self.next
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
