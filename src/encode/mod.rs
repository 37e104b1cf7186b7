//! Destinations for rendered digest frames.

pub mod ffmpeg;
pub mod sink;

pub use ffmpeg::{EncodeConfig, FfmpegEncoder, default_mp4_config, target_bitrate};
pub use sink::{FrameSink, InMemorySink, PngSequenceSink};
